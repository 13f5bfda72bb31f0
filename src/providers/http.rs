//! JSON-over-HTTP transport shared by every adapter.
//!
//! One `reqwest::Client` per adapter, built once with the configured timeout
//! and reused for every call (connection pooling is per client). Failures
//! come back as plain cause strings; the adapter wraps them with its
//! provider name and model.

use crate::error::ForgeError;
use serde_json::Value;
use std::time::Duration;

/// Longest slice of an error body echoed into a cause string.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// A POST-JSON / receive-JSON client with a fixed whole-request timeout.
#[derive(Debug, Clone)]
pub struct JsonTransport {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl JsonTransport {
    pub fn new(timeout_secs: u64) -> Result<Self, ForgeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ForgeError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            timeout_secs,
        })
    }

    /// Issue one POST with a JSON body and decode the JSON response.
    ///
    /// Non-2xx statuses are errors carrying the status and a prefix of the
    /// response body.
    pub async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &Value,
    ) -> Result<Value, String> {
        let mut request = self.client.post(url);
        for (key, value) in headers {
            request = request.header(*key, *value);
        }

        let response = request.json(body).send().await.map_err(|e| {
            if e.is_timeout() {
                format!("request timed out after {}s", self.timeout_secs)
            } else {
                format!("request failed: {e}")
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_cause(status, response.text().await));
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                format!("request timed out after {}s", self.timeout_secs)
            } else {
                format!("malformed response body: {e}")
            }
        })
    }
}

/// Cause string for a non-2xx response, including the body when it could be read.
fn status_cause<E: std::fmt::Display>(
    status: reqwest::StatusCode,
    body: Result<String, E>,
) -> String {
    match body {
        Ok(body) => format!("HTTP {status}: {}", truncate(&body)),
        Err(e) => format!("HTTP {status}: <unreadable body: {e}>"),
    }
}

fn truncate(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}

/// Join a base URL and a path without doubling slashes.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_bodies() {
        assert_eq!(truncate("  {\"error\":\"bad\"}\n"), "{\"error\":\"bad\"}");
    }

    #[test]
    fn truncate_cuts_on_char_boundary() {
        let long = "é".repeat(MAX_ERROR_BODY_CHARS + 10);
        let cut = truncate(&long);
        assert!(cut.ends_with('…'));
        assert_eq!(cut.chars().count(), MAX_ERROR_BODY_CHARS + 1);
    }

    #[test]
    fn status_cause_includes_body_prefix() {
        let cause = status_cause::<String>(
            reqwest::StatusCode::BAD_GATEWAY,
            Ok("upstream down".to_string()),
        );
        assert_eq!(cause, "HTTP 502 Bad Gateway: upstream down");
    }

    #[test]
    fn status_cause_reports_unreadable_body() {
        let cause = status_cause(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            Err::<String, _>("connection reset by peer"),
        );
        assert_eq!(
            cause,
            "HTTP 500 Internal Server Error: <unreadable body: connection reset by peer>"
        );
    }

    #[test]
    fn join_url_normalises_slashes() {
        assert_eq!(
            join_url("https://api.openai.com/", "/v1/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(join_url("http://localhost:1234", "v1/messages"), "http://localhost:1234/v1/messages");
    }
}
