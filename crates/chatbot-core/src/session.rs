//! Conversation controller
//!
//! `ChatSession` owns the message list, the backend URL and its connection
//! status, and the in-flight marker. It never performs I/O: callers start a
//! health check or chat request with the ticket a transition hands back, run
//! it wherever they like, and feed the result into the matching `finish_*`
//! method. Results carrying an outdated ticket are dropped.

use thiserror::Error;
use tracing::{debug, info};

use crate::error::ChatError;
use crate::state::{ChatMessage, ConnectionStatus};

/// Why a submission did not start a request
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejected {
    #[error("Nothing to send")]
    Empty,
    #[error("A request is already in flight")]
    Busy,
    #[error("Backend is not connected. Please check your backend URL in settings.")]
    NotConnected,
}

/// A health check the caller should run against `url`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthTicket {
    pub generation: u64,
    pub url: String,
}

/// A chat request the caller should send: the full history, newest user turn last
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub id: u64,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    backend_url: String,
    status: ConnectionStatus,
    is_loading: bool,
    health_generation: u64,
    request_id: u64,
}

impl ChatSession {
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            backend_url: backend_url.into(),
            status: ConnectionStatus::Checking,
            is_loading: false,
            health_generation: 0,
            request_id: 0,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Change the backend URL. The old status no longer applies, so a new check starts.
    pub fn set_backend_url(&mut self, url: impl Into<String>) -> HealthTicket {
        self.backend_url = url.into();
        self.begin_health_check()
    }

    pub fn begin_health_check(&mut self) -> HealthTicket {
        self.health_generation += 1;
        self.status = ConnectionStatus::Checking;
        debug!(generation = self.health_generation, url = %self.backend_url, "health check started");

        HealthTicket {
            generation: self.health_generation,
            url: self.backend_url.clone(),
        }
    }

    /// Apply a health result. Returns false if a newer check has superseded it.
    pub fn finish_health_check(&mut self, generation: u64, status: ConnectionStatus) -> bool {
        if generation != self.health_generation {
            debug!(generation, current = self.health_generation, "discarding stale health result");
            return false;
        }

        if self.status != status {
            info!(url = %self.backend_url, status = status.display_name(), "backend status changed");
        }
        self.status = status;
        true
    }

    /// Append the user's turn and hand back the request to send.
    ///
    /// The draft is sent as typed; only the emptiness test trims it.
    pub fn submit(&mut self, draft: &str) -> Result<PendingRequest, SubmitRejected> {
        if draft.trim().is_empty() {
            return Err(SubmitRejected::Empty);
        }
        if self.is_loading {
            return Err(SubmitRejected::Busy);
        }
        if !self.status.is_connected() {
            return Err(SubmitRejected::NotConnected);
        }

        self.messages.push(ChatMessage::user(draft));
        self.is_loading = true;
        self.request_id += 1;

        Ok(PendingRequest {
            id: self.request_id,
            messages: self.messages.clone(),
        })
    }

    /// Record the outcome of request `id`. Returns false if it was cancelled meanwhile.
    pub fn finish_request(&mut self, id: u64, outcome: Result<String, ChatError>) -> bool {
        if !self.is_loading || id != self.request_id {
            debug!(id, current = self.request_id, "discarding outcome of abandoned request");
            return false;
        }

        let message = match outcome {
            Ok(reply) => ChatMessage::assistant(reply),
            Err(err) => {
                info!(error = %err, "chat request failed");
                ChatMessage::error(err.transcript_text())
            }
        };
        self.messages.push(message);
        self.is_loading = false;
        true
    }

    /// Abandon the in-flight request, if any. Its outcome will be ignored.
    pub fn cancel(&mut self) -> bool {
        if !self.is_loading {
            return false;
        }

        info!(id = self.request_id, "chat request cancelled");
        self.messages.push(ChatMessage::error(ChatError::Cancelled.transcript_text()));
        self.is_loading = false;
        self.request_id += 1;
        true
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendClient;
    use crate::state::ChatRole;

    fn connected_session() -> ChatSession {
        let mut session = ChatSession::new("http://localhost:5000");
        let ticket = session.begin_health_check();
        session.finish_health_check(ticket.generation, ConnectionStatus::Connected);
        session
    }

    #[test]
    fn new_session_is_checking_and_empty() {
        let session = ChatSession::new("http://localhost:5000");
        assert_eq!(session.status(), ConnectionStatus::Checking);
        assert!(session.messages().is_empty());
        assert!(!session.is_loading());
    }

    #[test]
    fn submit_appends_user_turn_optimistically() {
        let mut session = connected_session();
        let pending = session.submit("hello\nworld").unwrap();

        assert_eq!(session.messages(), &[ChatMessage::user("hello\nworld")]);
        assert!(session.is_loading());
        assert_eq!(pending.messages, session.messages());
    }

    #[test]
    fn blank_submit_is_noop() {
        let mut session = connected_session();
        for draft in ["", "   ", "\n\t "] {
            assert_eq!(session.submit(draft), Err(SubmitRejected::Empty));
        }
        assert!(session.messages().is_empty());
        assert!(!session.is_loading());
    }

    #[test]
    fn submit_blocked_unless_connected() {
        let mut session = ChatSession::new("http://localhost:5000");
        assert_eq!(session.submit("hi"), Err(SubmitRejected::NotConnected));

        let ticket = session.begin_health_check();
        session.finish_health_check(ticket.generation, ConnectionStatus::Error);
        assert_eq!(session.submit("hi"), Err(SubmitRejected::NotConnected));
        assert!(session.messages().is_empty());
    }

    #[test]
    fn submit_rejected_while_loading() {
        let mut session = connected_session();
        session.submit("first").unwrap();
        assert_eq!(session.submit("second"), Err(SubmitRejected::Busy));
        assert_eq!(session.messages().len(), 1);
    }

    #[test]
    fn request_carries_prior_history() {
        let mut session = connected_session();
        let first = session.submit("one").unwrap();
        session.finish_request(first.id, Ok("two".into()));

        let second = session.submit("three").unwrap();
        let contents: Vec<&str> = second.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["one", "two", "three"]);
    }

    #[test]
    fn failure_appends_error_turn_and_clears_loading() {
        let mut session = connected_session();
        let pending = session.submit("hi").unwrap();
        session.finish_request(pending.id, Err(ChatError::Transport("Failed to fetch".into())));

        let last = session.messages().last().unwrap();
        assert_eq!(last.role, ChatRole::Assistant);
        assert!(last.is_error);
        assert_eq!(last.content, "❌ Network error: Failed to fetch");
        assert!(!session.is_loading());
    }

    #[test]
    fn cancel_ignores_late_outcome() {
        let mut session = connected_session();
        let pending = session.submit("hi").unwrap();

        assert!(session.cancel());
        assert!(!session.is_loading());
        assert_eq!(session.messages().last().unwrap().content, "❌ Request cancelled");

        assert!(!session.finish_request(pending.id, Ok("too late".into())));
        assert_eq!(session.messages().len(), 2);
        assert!(!session.cancel());
    }

    #[test]
    fn url_change_resets_status_and_drops_stale_results() {
        let mut session = connected_session();
        let old = session.begin_health_check();
        let new = session.set_backend_url("http://example.test:5000");

        assert_eq!(session.status(), ConnectionStatus::Checking);
        assert_eq!(new.url, "http://example.test:5000");

        assert!(!session.finish_health_check(old.generation, ConnectionStatus::Connected));
        assert_eq!(session.status(), ConnectionStatus::Checking);

        assert!(session.finish_health_check(new.generation, ConnectionStatus::Error));
        assert_eq!(session.status(), ConnectionStatus::Error);
    }

    #[test]
    fn clear_empties_transcript() {
        let mut session = connected_session();
        let pending = session.submit("hi").unwrap();
        session.finish_request(pending.id, Ok("hello".into()));

        session.clear();
        assert!(session.messages().is_empty());

        session.clear();
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn round_trip_against_backend() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/health")
            .with_status(200)
            .create_async()
            .await;
        server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_body(r#"{"choices": [{"message": {"content": "Hi there!"}}]}"#)
            .create_async()
            .await;

        let client = BackendClient::new(&server.url());
        let mut session = ChatSession::new(server.url());

        let ticket = session.begin_health_check();
        let status = client.with_base_url(&ticket.url).check_health().await;
        session.finish_health_check(ticket.generation, status);
        assert_eq!(session.status(), ConnectionStatus::Connected);

        let pending = session.submit("Hello").unwrap();
        let outcome = client.chat(&pending.messages).await;
        session.finish_request(pending.id, outcome);

        assert_eq!(
            session.messages(),
            &[ChatMessage::user("Hello"), ChatMessage::assistant("Hi there!")]
        );
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn url_change_resolves_from_new_health_endpoint() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/health")
            .with_status(500)
            .create_async()
            .await;

        let client = BackendClient::new("http://localhost:5000");
        let mut session = connected_session();

        let ticket = session.set_backend_url(server.url());
        assert_eq!(session.status(), ConnectionStatus::Checking);

        let status = client.with_base_url(&ticket.url).check_health().await;
        session.finish_health_check(ticket.generation, status);
        assert_eq!(session.status(), ConnectionStatus::Error);
    }
}
