//! cuohe - Telegram front end for the resource-matchmaking help desk
//!
//! Message routing lives in `cuohecore`; this crate adds the CLI,
//! the teloxide dispatcher and the axum HTTP surface.

pub mod cli;
pub mod server;
pub mod telegram;

pub use server::{http_routes, AppState};
