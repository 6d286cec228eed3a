use teloxide::prelude::*;

use super::bot::truncate_message;

/// Sends a plain-text notice to the administrator.
///
/// Does nothing when no admin is configured. Failures are logged and swallowed:
/// the user's request has already been handled.
pub async fn notify_admin_text(bot: &Bot, admin_chat: Option<ChatId>, text: &str) {
    let Some(chat_id) = admin_chat else {
        log::debug!("ADMIN_ID not set, dropping admin notice");
        return;
    };

    if let Err(e) = bot.send_message(chat_id, truncate_message(text)).await {
        log::error!("Failed to send admin notice to {}: {}", chat_id, e);
    }
}

/// Lets the administrator know the bot (re)started.
pub async fn notify_admin_startup(bot: &Bot, admin_chat: Option<ChatId>, bot_username: Option<&str>, mode: &str) {
    let name = bot_username.map(|u| format!("@{}", u)).unwrap_or_else(|| "bot".to_string());
    notify_admin_text(bot, admin_chat, &format!("🤖 {} 已启动（{}）", name, mode)).await;
}
