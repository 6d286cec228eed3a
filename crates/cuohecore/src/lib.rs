//! cuohecore - message routing for the resource-matchmaking help-desk bot
//!
//! Everything here is independent of Telegram: the bot crate converts updates
//! into [`router::Incoming`] and sends back the [`router::Outcome`] replies.
//!
//! # Module Structure
//!
//! - `config`, `error`, `logging`: environment configuration, error types, logger setup
//! - `text`, `classify`, `intent`, `publish`: normalization and the keyword chain
//! - `qa`: YAML knowledge base and unmatched-text counter
//! - `history`, `llm`: per-user chat history and the completion client
//! - `sheets`, `chatlog`: append-only worksheet logs and the daily CSV chat log
//! - `router`: the message handler tying it together

pub mod chatlog;
pub mod classify;
pub mod config;
pub mod error;
pub mod history;
pub mod intent;
pub mod llm;
pub mod logging;
pub mod publish;
pub mod qa;
pub mod router;
pub mod sheets;
pub mod text;

// Re-exports for convenience
pub use error::{AppError, AppResult};
pub use logging::{init_logger, log_startup_configuration};
pub use router::{Incoming, MessageRouter, Outcome};
