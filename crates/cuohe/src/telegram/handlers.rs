//! Dispatcher schema and handler chain builders
//!
//! The same schema is used for webhook and long-polling modes.

use std::sync::Arc;

use cuohecore::classify::{invite_hook, GroupLinks, Persona};
use cuohecore::router::GENERIC_FAILURE;
use cuohecore::{Incoming, MessageRouter};
use teloxide::dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{Message, ReplyParameters};

use super::bot::{is_message_addressed_to_bot, strip_bot_mention, truncate_message, Command};
use super::notifications::notify_admin_text;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub router: Arc<MessageRouter>,
    pub links: GroupLinks,
    pub admin_chat: Option<ChatId>,
    pub bot_username: Option<String>,
    pub bot_id: UserId,
}

impl HandlerDeps {
    pub fn new(
        router: Arc<MessageRouter>,
        links: GroupLinks,
        admin_chat: Option<ChatId>,
        bot_username: Option<String>,
        bot_id: UserId,
    ) -> Self {
        Self {
            router,
            links,
            admin_chat,
            bot_username,
            bot_id,
        }
    }
}

/// Creates the main dispatcher schema for the Telegram bot.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_messages = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(message_handler(deps_messages))
}

/// Text shown for /start and /help.
pub fn welcome_text(links: &GroupLinks) -> String {
    format!(
        "👋 欢迎使用资源撮合客服助手！\n\
         • 发送「我要资源」查看最新资源\n\
         • 发送「我要发布」了解发布格式\n\
         • 发送「举报 + 内容」反馈违规信息\n\
         • 其它问题直接提问即可\n\n{}",
        invite_hook(Persona::Ordinary, links)
    )
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move { handle_command(&bot, &msg, cmd, &deps).await }
        },
    ))
}

async fn handle_command(bot: &Bot, msg: &Message, cmd: Command, deps: &HandlerDeps) -> Result<(), HandlerError> {
    log::info!("Received command: {:?} from chat {}", cmd, msg.chat.id);
    match cmd {
        Command::Start | Command::Help => {
            reply_to(bot, msg, &welcome_text(&deps.links)).await?;
        }
    }
    Ok(())
}

fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let bot_username = deps.bot_username.clone();
    let bot_id = deps.bot_id;

    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some() && msg.from.is_some())
        .filter(move |msg: Message| is_message_addressed_to_bot(&msg, bot_username.as_deref(), bot_id))
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move { handle_text_message(&bot, &msg, &deps).await }
        })
}

/// Converts a Telegram message for the router.
pub fn incoming_from_message(msg: &Message, bot_username: Option<&str>) -> Option<Incoming> {
    let text = msg.text()?;
    let user = msg.from.as_ref()?;
    Some(Incoming {
        user_id: user.id.0,
        username: user.username.clone(),
        text: strip_bot_mention(text, bot_username),
    })
}

/// Routes one text message and sends the replies. Router errors and unsendable replies
/// become the generic reply.
pub async fn handle_text_message(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let Some(incoming) = incoming_from_message(msg, deps.bot_username.as_deref()) else {
        return Ok(());
    };

    let outcome = match deps.router.handle(&incoming).await {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("Failed to handle message from {}: {}", incoming.display_name(), e);
            reply_to(bot, msg, GENERIC_FAILURE).await?;
            return Ok(());
        }
    };

    log::info!(
        "Routed message from {} as {} ({} replies)",
        incoming.display_name(),
        outcome.intent,
        outcome.replies.len()
    );

    for text in &outcome.replies {
        if let Err(e) = reply_to(bot, msg, &truncate_message(text)).await {
            log::error!("Failed to send reply to {}: {}", incoming.display_name(), e);
            reply_to(bot, msg, GENERIC_FAILURE).await?;
            break;
        }
    }

    if let Some(notice) = &outcome.admin_notice {
        notify_admin_text(bot, deps.admin_chat, notice).await;
    }

    Ok(())
}

async fn reply_to(bot: &Bot, msg: &Message, text: &str) -> ResponseResult<Message> {
    bot.send_message(msg.chat.id, text)
        .reply_parameters(ReplyParameters::new(msg.id).allow_sending_without_reply())
        .await
}
