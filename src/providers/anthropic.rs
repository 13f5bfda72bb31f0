//! Claude, via the Anthropic Messages API.

use super::http::{join_url, JsonTransport};
use super::{ProviderAdapter, ProviderKind};
use crate::config::{ApiKey, ProviderConfig};
use crate::error::ForgeError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Adapter for `POST /v1/messages`.
#[derive(Debug)]
pub struct AnthropicAdapter {
    credential: Option<ApiKey>,
    model: String,
    max_output_tokens: u32,
    base_url: String,
    transport: Option<JsonTransport>,
}

impl AnthropicAdapter {
    /// Build from settings. No client is created without a credential.
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
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_BASE_URL.to_string()),
            transport,
        })
    }

    fn messages_url(&self) -> String {
        join_url(&self.base_url, "v1/messages")
    }
}

fn build_request(model: &str, prompt: &str, max_tokens: u32) -> Value {
    json!({
        "model": model,
        "max_tokens": max_tokens,
        "messages": [{ "role": "user", "content": prompt }],
    })
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

/// Text of the first `text` content block.
fn parse_response(json: Value) -> Result<String, String> {
    let response: MessagesResponse = serde_json::from_value(json)
        .map_err(|e| format!("unexpected response shape: {e}"))?;

    let text = response
        .content
        .into_iter()
        .find(|block| block.block_type == "text")
        .and_then(|block| block.text)
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err("response contained no generated text".to_string());
    }
    Ok(text)
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Claude
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

        let headers = [
            ("x-api-key", key.expose()),
            ("anthropic-version", ANTHROPIC_VERSION),
        ];
        let body = build_request(&self.model, prompt, max_tokens);
        debug!(model = %self.model, prompt_chars = prompt.len(), "calling Anthropic Messages API");

        let json = transport
            .post_json(&self.messages_url(), &headers, &body)
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
        let body = build_request("claude-3-sonnet-20240229", "hi", 4000);
        assert_eq!(body["model"], "claude-3-sonnet-20240229");
        assert_eq!(body["max_tokens"], 4000);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hi");
    }

    #[test]
    fn parse_picks_first_text_block() {
        let json = json!({
            "id": "msg_1",
            "type": "message",
            "content": [
                { "type": "thinking", "thinking": "…" },
                { "type": "text", "text": "# Title" },
                { "type": "text", "text": "ignored" }
            ],
            "stop_reason": "end_turn"
        });
        assert_eq!(parse_response(json).unwrap(), "# Title");
    }

    #[test]
    fn parse_rejects_empty_content() {
        let err = parse_response(json!({ "content": [] })).unwrap_err();
        assert!(err.contains("no generated text"));
    }

    #[test]
    fn parse_rejects_wrong_shape() {
        let err = parse_response(json!({ "choices": [] })).unwrap_err();
        assert!(err.contains("unexpected response shape"));
    }

    #[test]
    fn base_url_override_is_used() {
        let settings = ProviderConfig::with_credential(ProviderKind::Claude, "k")
            .base_url("http://localhost:4010/");
        let adapter = AnthropicAdapter::new(&settings).unwrap();
        assert_eq!(adapter.messages_url(), "http://localhost:4010/v1/messages");
        assert!(adapter.is_available());
    }
}
