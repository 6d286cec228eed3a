//! Bot initialization and message addressing utilities
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation
//! - Message addressing logic (private chats, mentions, replies)

use cuohecore::config;
use teloxide::prelude::*;
use teloxide::types::{ChatKind, Message, MessageEntityKind, UserId};
use teloxide::utils::command::BotCommands;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "我可以帮您：")]
pub enum Command {
    #[command(description = "欢迎信息与入群链接")]
    Start,
    #[command(description = "使用说明")]
    Help,
}

/// Creates a Bot instance from BOT_TOKEN with a request timeout
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Token missing or HTTP client could not be built
pub fn create_bot() -> anyhow::Result<Bot> {
    if config::BOT_TOKEN.is_empty() {
        return Err(anyhow::anyhow!("BOT_TOKEN environment variable not set"));
    }

    let client = teloxide::net::default_reqwest_settings()
        .timeout(config::network::timeout())
        .build()?;
    Ok(Bot::with_client(config::BOT_TOKEN.as_str(), client))
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}

/// Checks if a message is addressed to the bot
///
/// # Returns
/// * `true` if message is addressed to bot (private chat, bot mention, reply to bot message)
/// * `false` if message is not addressed to bot
pub fn is_message_addressed_to_bot(msg: &Message, bot_username: Option<&str>, bot_id: UserId) -> bool {
    // In private chats, all messages are addressed to the bot
    if matches!(msg.chat.kind, ChatKind::Private(_)) {
        return true;
    }

    if let Some(reply_to) = msg.reply_to_message() {
        if reply_to.from.as_ref().is_some_and(|from| from.id == bot_id) {
            return true;
        }
    }

    let Some(username) = bot_username else {
        return false;
    };

    msg.parse_entities()
        .unwrap_or_default()
        .iter()
        .filter(|entity| matches!(entity.kind(), MessageEntityKind::Mention))
        .any(|entity| {
            let mention = entity.text();
            mention.strip_prefix('@').unwrap_or(mention).eq_ignore_ascii_case(username)
        })
}

/// Maximum message length for Telegram (with margin)
pub const MAX_MESSAGE_LENGTH: usize = 4000;

/// Cuts text that Telegram would reject as too long.
pub fn truncate_message(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_LENGTH {
        return text.to_string();
    }
    let mut trimmed = text.chars().take(MAX_MESSAGE_LENGTH - 20).collect::<String>();
    trimmed.push_str("\n... (truncated)");
    trimmed
}

/// Removes `@botname` mentions (case-insensitive) so group messages match the keyword
/// chain like private ones. Everything else, newlines and spacing included, is kept.
pub fn strip_bot_mention(text: &str, bot_username: Option<&str>) -> String {
    let Some(username) = bot_username.filter(|u| !u.is_empty()) else {
        return text.to_string();
    };

    let mut stripped = String::with_capacity(text.len());
    let mut rest = text;
    let mut found = false;

    while let Some(at) = rest.find('@') {
        let after = &rest[at + 1..];
        let is_mention = after
            .get(..username.len())
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(username))
            && !after[username.len()..].starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_');

        if is_mention {
            found = true;
            stripped.push_str(&rest[..at]);
            let tail = &after[username.len()..];
            rest = tail.strip_prefix(' ').unwrap_or(tail);
        } else {
            stripped.push_str(&rest[..=at]);
            rest = after;
        }
    }
    stripped.push_str(rest);

    if found {
        stripped.trim().to_string()
    } else {
        stripped
    }
}
