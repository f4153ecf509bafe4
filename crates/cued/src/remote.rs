//! Remote completion fallback.
//!
//! One round trip to an OpenAI-style chat-completions endpoint when the
//! local match is not good enough. No retries: any transport, HTTP or
//! response-shape failure surfaces as a [`RemoteError`] and the caller
//! substitutes the not-found sentinel.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

// Fixed sampling configuration. Deliberately not tunable per call.
const TEMPERATURE: f64 = 0.2;
const TOP_P: f64 = 1.0;
const MAX_TOKENS: u32 = 256;

/// Remote endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Bearer credential. Absent means unauthenticated (self-hosted
    /// compatible endpoints).
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://api.openai.com".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Remote call failures. All of them mean "no remote answer"; callers never
/// branch on the variant, it exists for the log line.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    #[error("invalid response shape: {0}")]
    InvalidJson(String),

    #[error("remote returned no completion")]
    EmptyResponse,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// A single-shot completion backend.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Resolve `query` to one completion string.
    async fn complete(&self, query: &str) -> Result<String, RemoteError>;
}

/// Real client over HTTP.
pub struct HttpRemoteClient {
    config: RemoteConfig,
    http: reqwest::Client,
}

impl HttpRemoteClient {
    pub fn new(config: RemoteConfig) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RemoteError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, http })
    }
}

#[async_trait]
impl RemoteClient for HttpRemoteClient {
    async fn complete(&self, query: &str) -> Result<String, RemoteError> {
        let url = format!("{}/v1/chat/completions", self.config.endpoint);

        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: query,
            }],
            temperature: TEMPERATURE,
            top_p: TOP_P,
            max_tokens: MAX_TOKENS,
            stream: false,
        };

        let mut request = self.http.post(&url).json(&body);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                RemoteError::Timeout(self.config.timeout_secs)
            } else {
                RemoteError::Http(format!("request failed: {e}"))
            }
        })?;

        if !response.status().is_success() {
            return Err(RemoteError::Http(format!(
                "HTTP {} from completion endpoint",
                response.status()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::InvalidJson(e.to_string()))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(RemoteError::EmptyResponse)?;

        Ok(text)
    }
}

/// Canned-response client for tests.
pub struct FakeRemoteClient {
    responses: std::sync::Mutex<Vec<Result<String, RemoteError>>>,
    call_count: std::sync::Mutex<usize>,
}

impl FakeRemoteClient {
    /// Responses are handed out in order; the last one repeats.
    pub fn new(responses: Vec<Result<String, RemoteError>>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses),
            call_count: std::sync::Mutex::new(0),
        }
    }

    pub fn always(answer: &str) -> Self {
        Self::new(vec![Ok(answer.to_string())])
    }

    pub fn always_error(error: RemoteError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl RemoteClient for FakeRemoteClient {
    async fn complete(&self, _query: &str) -> Result<String, RemoteError> {
        *self.call_count.lock().unwrap() += 1;

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(RemoteError::EmptyResponse);
        }
        if responses.len() == 1 {
            responses[0].clone()
        } else {
            responses.remove(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_config_defaults() {
        let config = RemoteConfig::default();
        assert_eq!(config.endpoint, "https://api.openai.com");
        assert!(config.api_key.is_none());
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn chat_request_wire_shape() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![ChatMessage {
                role: "user",
                content: "what is 2+2",
            }],
            temperature: TEMPERATURE,
            top_p: TOP_P,
            max_tokens: MAX_TOKENS,
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["stream"], false);
        assert_eq!(json["max_tokens"], 256);
    }

    #[test]
    fn chat_response_extracts_first_choice() {
        let raw = r#"{"choices":[{"message":{"content":"4"}},{"message":{"content":"five"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "4");
    }

    #[test]
    fn chat_response_rejects_missing_content() {
        let raw = r#"{"choices":[{"message":{}}]}"#;
        assert!(serde_json::from_str::<ChatResponse>(raw).is_err());
    }

    #[tokio::test]
    async fn fake_client_counts_calls_and_repeats_last() {
        let client = FakeRemoteClient::always("canned");
        assert_eq!(client.complete("q").await.unwrap(), "canned");
        assert_eq!(client.complete("q").await.unwrap(), "canned");
        assert_eq!(client.call_count(), 2);

        let failing = FakeRemoteClient::always_error(RemoteError::EmptyResponse);
        assert!(failing.complete("q").await.is_err());
    }
}
