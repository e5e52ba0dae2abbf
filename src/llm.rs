use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::CompletionSettings;
use crate::error::CallError;
use crate::events::Message;

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Sends a full transcript to a chat-completion service and returns the reply text.
///
/// Implementors own transport and wire-format details; the conversation loop
/// only sees `Ok(reply)` or a [`CallError`].
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, transcript: &[Message]) -> Result<String, CallError>;
}

/// Request body for `POST /chat/completions`
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Message in the request payload
#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl<'a> ChatRequest<'a> {
    pub fn new(settings: &'a CompletionSettings, transcript: &'a [Message]) -> Self {
        Self {
            model: &settings.model,
            messages: transcript
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        }
    }
}

/// Client for OpenAI-compatible chat-completion endpoints
#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    settings: CompletionSettings,
    api_key: String,
    url: String,
}

impl OpenAiClient {
    pub fn new(settings: CompletionSettings, api_key: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), settings, api_key)
    }

    /// Use a preconfigured HTTP client (proxies, TLS roots)
    pub fn with_http_client(
        client: reqwest::Client,
        settings: CompletionSettings,
        api_key: impl Into<String>,
    ) -> Self {
        let url = format!(
            "{}{}",
            settings.base_url.trim_end_matches('/'),
            CHAT_COMPLETIONS_PATH
        );

        Self {
            client,
            settings,
            api_key: api_key.into(),
            url,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, transcript: &[Message]) -> Result<String, CallError> {
        let payload = ChatRequest::new(&self.settings, transcript);
        debug!(
            url = %self.url,
            model = %self.settings.model,
            messages = payload.messages.len(),
            "sending chat completion"
        );

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;

        if !status.is_success() {
            warn!(%status, "completion service returned an error");
            return Err(classify_failure(status, &body));
        }

        parse_reply(&body)
    }
}

/// Extract the first choice's message text from a success body.
///
/// A `null` content field is treated as an empty reply.
pub fn parse_reply(body: &str) -> Result<String, CallError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| CallError::MalformedResponse(e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| CallError::MalformedResponse("response contained no choices".to_string()))
}

/// Map a non-success status and body onto the call error taxonomy
pub fn classify_failure(status: StatusCode, body: &str) -> CallError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CallError::Authentication(message),
        StatusCode::TOO_MANY_REQUESTS => CallError::Quota(message),
        _ => CallError::Status {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Role;

    #[test]
    fn request_carries_full_history_and_parameters() {
        let settings = CompletionSettings::default();
        let transcript = vec![
            Message::new(Role::System, "primer"),
            Message::new(Role::User, "I feel anxious today"),
        ];

        let value = serde_json::to_value(ChatRequest::new(&settings, &transcript)).unwrap();
        assert_eq!(value["model"], "gpt-3.5-turbo");
        assert_eq!(value["max_tokens"], 200);
        assert!((value["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(
            value["messages"],
            serde_json::json!([
                {"role": "system", "content": "primer"},
                {"role": "user", "content": "I feel anxious today"},
            ])
        );
    }

    #[test]
    fn parse_reply_returns_first_choice_verbatim() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  I'm here for you.\n"}}]}"#;
        assert_eq!(parse_reply(body).unwrap(), "  I'm here for you.\n");
    }

    #[test]
    fn parse_reply_rejects_malformed_bodies() {
        assert!(matches!(
            parse_reply("not json"),
            Err(CallError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_reply(r#"{"choices":[]}"#),
            Err(CallError::MalformedResponse(_))
        ));
    }

    #[test]
    fn null_content_is_an_empty_reply() {
        let body = r#"{"choices":[{"message":{"content":null}}]}"#;
        assert_eq!(parse_reply(body).unwrap(), "");
    }

    #[test]
    fn failures_are_classified_by_status() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(
            classify_failure(StatusCode::UNAUTHORIZED, body),
            CallError::Authentication("Incorrect API key provided".to_string())
        );
        assert!(matches!(
            classify_failure(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            CallError::Quota(msg) if msg == "slow down"
        ));
        assert_eq!(
            classify_failure(StatusCode::BAD_GATEWAY, ""),
            CallError::Status {
                status: 502,
                message: String::new()
            }
        );
    }

    #[test]
    fn url_joins_base_and_path() {
        let settings = CompletionSettings {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..CompletionSettings::default()
        };
        let client = OpenAiClient::new(settings, "sk-test");
        assert_eq!(client.url(), "http://localhost:8080/v1/chat/completions");
    }
}
