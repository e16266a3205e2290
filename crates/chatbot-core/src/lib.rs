pub mod backend;
pub mod config;
pub mod error;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use backend::BackendClient;
pub use config::Config;
pub use error::ChatError;
pub use session::{ChatSession, HealthTicket, PendingRequest, SubmitRejected};
pub use state::{ChatMessage, ChatRole, ConnectionStatus};
