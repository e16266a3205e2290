use thiserror::Error;

/// Why a chat request produced no assistant reply.
///
/// `Display` is the transcript text for the failure, minus the leading
/// marker the front end adds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// The backend answered with a non-success status.
    #[error("Error {status}: {message}")]
    Server { status: u16, message: String },

    /// The request never produced a readable response.
    #[error("Network error: {0}")]
    Transport(String),

    /// A success response whose body lacks `choices[0].message.content`.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The user abandoned the in-flight request.
    #[error("Request cancelled")]
    Cancelled,
}

impl ChatError {
    /// Text shown in the transcript bubble for this failure
    pub fn transcript_text(&self) -> String {
        format!("❌ {self}")
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChatError::Transport("request timed out".to_string())
        } else {
            ChatError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_text_formats() {
        let server = ChatError::Server { status: 500, message: "boom".into() };
        assert_eq!(server.transcript_text(), "❌ Error 500: boom");

        let transport = ChatError::Transport("Failed to fetch".into());
        assert_eq!(transport.transcript_text(), "❌ Network error: Failed to fetch");

        assert_eq!(ChatError::Cancelled.transcript_text(), "❌ Request cancelled");
    }
}
