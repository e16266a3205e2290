use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ChatError;
use crate::state::{ChatMessage, ConnectionStatus};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

/// HTTP client for the chat backend (`/api/health` and `/api/chat`)
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    request_timeout: Duration,
    health_timeout: Duration,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, request_timeout: Duration, health_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self.health_timeout = health_timeout;
        self
    }

    /// Same client and timeouts, pointed at a different backend
    pub fn with_base_url(&self, base_url: &str) -> Self {
        Self {
            client: self.client.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: self.request_timeout,
            health_timeout: self.health_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check `/api/health`. Any success status means connected; the body is ignored.
    pub async fn check_health(&self) -> ConnectionStatus {
        let url = format!("{}/api/health", self.base_url);

        match self.client.get(&url).timeout(self.health_timeout).send().await {
            Ok(response) if response.status().is_success() => ConnectionStatus::Connected,
            Ok(response) => {
                warn!(%url, status = %response.status(), "health check returned failure status");
                ConnectionStatus::Error
            }
            Err(e) => {
                warn!(%url, error = %e, "health check failed");
                ConnectionStatus::Error
            }
        }
    }

    /// Send the full conversation to `/api/chat` and return the assistant reply.
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let url = format!("{}/api/chat", self.base_url);
        debug!(%url, turns = messages.len(), "sending chat request");

        let response = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .json(&ChatRequest { messages })
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        // A body that is not JSON at all counts as a transport failure,
        // whatever the status code said.
        let body: Value =
            serde_json::from_str(&text).map_err(|e| ChatError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ChatError::Server {
                status: status.as_u16(),
                message: server_error_message(&body)?,
            });
        }

        extract_reply(body)
    }
}

/// The `error` field of a failed response. Falsy values (missing, null,
/// false, zero, empty) read as "Unknown error"; a bare `null` body has no
/// fields to read and counts as a transport failure.
fn server_error_message(body: &Value) -> Result<String, ChatError> {
    if body.is_null() {
        return Err(ChatError::Transport("error response body was null".to_string()));
    }

    let message = match body.get("error") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) if n.as_f64().map_or(false, |v| v != 0.0) => n.to_string(),
        Some(Value::Bool(true)) => "true".to_string(),
        Some(other @ (Value::Array(_) | Value::Object(_))) => other.to_string(),
        _ => "Unknown error".to_string(),
    };
    Ok(message)
}

fn extract_reply(body: Value) -> Result<String, ChatError> {
    let completion: CompletionResponse =
        serde_json::from_value(body).map_err(|e| ChatError::MalformedResponse(e.to_string()))?;

    completion
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| ChatError::MalformedResponse("response contained no choices".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    // Nothing listens on port 1, so connections are refused immediately.
    const UNREACHABLE: &str = "http://127.0.0.1:1";

    #[test]
    fn trailing_slash_is_stripped() {
        let client = BackendClient::new("http://localhost:5000/");
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(client.with_base_url("http://other//").base_url(), "http://other");
    }

    #[test]
    fn error_message_fallbacks() {
        let message = |body: Value| server_error_message(&body).unwrap();
        assert_eq!(message(json!({"error": "boom"})), "boom");
        assert_eq!(message(json!({})), "Unknown error");
        assert_eq!(message(json!({"error": null})), "Unknown error");
        assert_eq!(message(json!({"error": ""})), "Unknown error");
        assert_eq!(message(json!({"error": false})), "Unknown error");
        assert_eq!(message(json!({"error": 0})), "Unknown error");
        assert_eq!(message(json!({"error": 42})), "42");
        assert_eq!(message(json!("plain string")), "Unknown error");
        assert_eq!(message(json!([1, 2])), "Unknown error");
    }

    #[test]
    fn null_error_body_is_transport_failure() {
        let err = server_error_message(&Value::Null).unwrap_err();
        assert!(matches!(err, ChatError::Transport(_)));
    }

    #[tokio::test]
    async fn chat_null_error_body_is_transport_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(500)
            .with_body("null")
            .create_async()
            .await;

        let client = BackendClient::new(&server.url());
        let err = client.chat(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(err.transcript_text().starts_with("❌ Network error: "));
    }

    #[tokio::test]
    async fn health_check_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/health")
            .with_status(200)
            .with_body(r#"{"status": "healthy", "message": "Backend is running!"}"#)
            .create_async()
            .await;

        let client = BackendClient::new(&server.url());
        assert_eq!(client.check_health().await, ConnectionStatus::Connected);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn health_check_failure_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/health")
            .with_status(503)
            .create_async()
            .await;

        let client = BackendClient::new(&server.url());
        assert_eq!(client.check_health().await, ConnectionStatus::Error);
    }

    #[tokio::test]
    async fn health_check_unreachable() {
        let client = BackendClient::new(UNREACHABLE);
        assert_eq!(client.check_health().await, ConnectionStatus::Error);
    }

    #[tokio::test]
    async fn chat_sends_full_history_and_extracts_reply() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "messages": [
                    {"role": "user", "content": "hi"},
                    {"role": "assistant", "content": "hello"},
                    {"role": "user", "content": "how are you?"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": "fine"}}]}"#)
            .create_async()
            .await;

        let history = vec![
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
            ChatMessage::user("how are you?"),
        ];
        let client = BackendClient::new(&server.url());
        let reply = client.chat(&history).await.unwrap();

        assert_eq!(reply, "fine");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn chat_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(500)
            .with_body(r#"{"error": "boom"}"#)
            .create_async()
            .await;

        let client = BackendClient::new(&server.url());
        let err = client.chat(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert_eq!(err, ChatError::Server { status: 500, message: "boom".into() });
        assert_eq!(err.transcript_text(), "❌ Error 500: boom");
    }

    #[tokio::test]
    async fn chat_server_error_without_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(400)
            .with_body(r#"{"details": "nope"}"#)
            .create_async()
            .await;

        let client = BackendClient::new(&server.url());
        let err = client.chat(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert_eq!(err.transcript_text(), "❌ Error 400: Unknown error");
    }

    #[tokio::test]
    async fn chat_error_body_not_json_is_transport_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(502)
            .with_body("<html>Bad Gateway</html>")
            .create_async()
            .await;

        let client = BackendClient::new(&server.url());
        let err = client.chat(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, ChatError::Transport(_)));
    }

    #[tokio::test]
    async fn chat_missing_choices_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let client = BackendClient::new(&server.url());
        let err = client.chat(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, ChatError::MalformedResponse(_)));
        assert!(err.transcript_text().starts_with("❌ Malformed response: "));
    }

    #[tokio::test]
    async fn chat_unreachable_is_transport_failure() {
        let client = BackendClient::new(UNREACHABLE);
        let err = client.chat(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, ChatError::Transport(_)));
        assert!(err.transcript_text().starts_with("❌ Network error: "));
    }
}
