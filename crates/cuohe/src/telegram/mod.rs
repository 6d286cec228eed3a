//! Telegram adapter: bot construction, dispatcher schema and admin notices

pub mod bot;
pub mod handlers;
pub mod notifications;

pub use bot::{
    create_bot, is_message_addressed_to_bot, setup_bot_commands, strip_bot_mention, truncate_message, Command,
    MAX_MESSAGE_LENGTH,
};
pub use handlers::{schema, HandlerDeps, HandlerError};
pub use notifications::{notify_admin_startup, notify_admin_text};
pub use teloxide::prelude::Bot;
