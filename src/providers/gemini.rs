//! Google Gemini `generateContent`.
//!
//! Sampling is pinned low (temperature 0.1, top-p 0.8, top-k 40): the task is
//! reformatting, not creative writing.

use super::http::{join_url, JsonTransport};
use super::{ProviderAdapter, ProviderKind};
use crate::config::{ApiKey, ProviderConfig};
use crate::error::ForgeError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const TEMPERATURE: f64 = 0.1;
const TOP_P: f64 = 0.8;
const TOP_K: u32 = 40;

/// Adapter for `POST /v1beta/models/{model}:generateContent`.
#[derive(Debug)]
pub struct GeminiAdapter {
    credential: Option<ApiKey>,
    model: String,
    max_output_tokens: u32,
    base_url: String,
    transport: Option<JsonTransport>,
}

impl GeminiAdapter {
    pub fn new(settings: &ProviderConfig) -> Result<Self, ForgeError> {
        let transport = match settings.credential {
            Some(_) => Some(JsonTransport::new(settings.request_timeout_secs)?),
            None => None,
        };
        Ok(Self {
            credential: settings.credential.clone(),
            model: settings.model.clone(),
            max_output_tokens: settings.max_output_tokens,
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            transport,
        })
    }

    fn generate_url(&self) -> String {
        let model = self.model.trim_start_matches("models/");
        join_url(
            &self.base_url,
            &format!("v1beta/models/{model}:generateContent"),
        )
    }
}

fn build_request(prompt: &str, max_tokens: u32) -> Value {
    json!({
        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "temperature": TEMPERATURE,
            "topP": TOP_P,
            "topK": TOP_K,
            "maxOutputTokens": max_tokens,
        },
    })
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

/// Concatenated text parts of the first candidate.
fn parse_response(json: Value) -> Result<String, String> {
    let response: GenerateContentResponse = serde_json::from_value(json)
        .map_err(|e| format!("unexpected response shape: {e}"))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err("Gemini returned no content".to_string());
    }
    Ok(text)
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    fn is_available(&self) -> bool {
        self.credential.is_some()
    }

    async fn convert(&self, prompt: &str, max_tokens: u32) -> Result<String, ForgeError> {
        let (Some(key), Some(transport)) = (&self.credential, &self.transport) else {
            return Err(ForgeError::unconfigured(self.kind()));
        };

        let headers = [("x-goog-api-key", key.expose())];
        let body = build_request(prompt, max_tokens);
        debug!(model = %self.model, prompt_chars = prompt.len(), "calling Gemini generateContent API");

        let json = transport
            .post_json(&self.generate_url(), &headers, &body)
            .await
            .map_err(|cause| ForgeError::request(self.kind(), &self.model, cause))?;

        parse_response(json).map_err(|cause| ForgeError::request(self.kind(), &self.model, cause))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let body = build_request("hi", 4000);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 4000);
        assert_eq!(body["generationConfig"]["topK"], 40);
    }

    #[test]
    fn url_includes_model() {
        let settings = ProviderConfig::with_credential(ProviderKind::Gemini, "k")
            .model("models/gemini-1.5-flash")
            .base_url("http://127.0.0.1:8080");
        let adapter = GeminiAdapter::new(&settings).unwrap();
        assert_eq!(
            adapter.generate_url(),
            "http://127.0.0.1:8080/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn parse_joins_parts_of_first_candidate() {
        let json = json!({
            "candidates": [
                { "content": { "role": "model", "parts": [{ "text": "# A" }, { "text": "\nbody" }] }, "finishReason": "STOP" },
                { "content": { "role": "model", "parts": [{ "text": "other" }] } }
            ]
        });
        assert_eq!(parse_response(json).unwrap(), "# A\nbody");
    }

    #[test]
    fn parse_rejects_blocked_prompt() {
        let json = json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        });
        let err = parse_response(json).unwrap_err();
        assert!(err.contains("no content"));
    }
}
