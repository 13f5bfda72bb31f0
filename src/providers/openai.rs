//! OpenAI Chat Completions.

use super::http::{join_url, JsonTransport};
use super::{ProviderAdapter, ProviderKind};
use crate::config::{ApiKey, ProviderConfig};
use crate::error::ForgeError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Adapter for `POST /v1/chat/completions`.
#[derive(Debug)]
pub struct OpenAiAdapter {
    credential: Option<ApiKey>,
    model: String,
    max_output_tokens: u32,
    base_url: String,
    transport: Option<JsonTransport>,
}

impl OpenAiAdapter {
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
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            transport,
        })
    }

    fn completions_url(&self) -> String {
        join_url(&self.base_url, "v1/chat/completions")
    }
}

fn build_request(model: &str, prompt: &str, max_tokens: u32) -> Value {
    json!({
        "model": model,
        "messages": [{ "role": "user", "content": prompt }],
        "max_tokens": max_tokens,
    })
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// `choices[0].message.content`.
fn parse_response(json: Value) -> Result<String, String> {
    let completion: ChatCompletion = serde_json::from_value(json)
        .map_err(|e| format!("unexpected response shape: {e}"))?;

    let text = completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err("response contained no generated text".to_string());
    }
    Ok(text)
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
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

        let auth = format!("Bearer {}", key.expose());
        let headers = [("Authorization", auth.as_str())];
        let body = build_request(&self.model, prompt, max_tokens);
        debug!(model = %self.model, prompt_chars = prompt.len(), "calling OpenAI Chat Completions API");

        let json = transport
            .post_json(&self.completions_url(), &headers, &body)
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
        let body = build_request("gpt-4", "hi", 256);
        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["max_tokens"], 256);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hi");
    }

    #[test]
    fn parse_first_choice() {
        let json = json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "gpt-4",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "## Heading" }, "finish_reason": "stop" },
                { "index": 1, "message": { "role": "assistant", "content": "second" }, "finish_reason": "stop" }
            ]
        });
        assert_eq!(parse_response(json).unwrap(), "## Heading");
    }

    #[test]
    fn parse_rejects_null_content() {
        let json = json!({
            "choices": [{ "message": { "role": "assistant", "content": null } }]
        });
        assert!(parse_response(json).is_err());
    }

    #[test]
    fn parse_rejects_no_choices() {
        let err = parse_response(json!({ "choices": [] })).unwrap_err();
        assert!(err.contains("no generated text"));
    }
}
