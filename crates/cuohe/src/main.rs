use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use tokio::time::sleep;

use cuohe::cli::{Cli, Commands};
use cuohe::server::{self, AppState, AI_API_ERROR_PREFIX};
use cuohe::telegram::{create_bot, notify_admin_startup, schema, setup_bot_commands, Bot, HandlerDeps};
use cuohecore::classify::GroupLinks;
use cuohecore::llm::{ask_once, OpenAiClient};
use cuohecore::logging::configuration_report;
use cuohecore::{config, init_logger, log_startup_configuration, MessageRouter};

/// Main entry point for the bot
///
/// Parses CLI arguments and dispatches to the chosen subcommand.
/// Without a subcommand the bot runs in its default mode.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Log panics inside the dispatcher instead of losing them on stderr
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // .env must be loaded before any config static is read
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Run { polling }) => run_bot(polling).await,
        Some(Commands::Ask { prompt }) => run_ask(&prompt).await,
        Some(Commands::CheckConfig) => {
            run_check_config();
            Ok(())
        }
        None => run_bot(false).await,
    }
}

async fn run_ask(prompt: &str) -> Result<()> {
    let client = OpenAiClient::from_config()?;
    println!("{}", ask_once(&client, prompt, AI_API_ERROR_PREFIX).await);
    Ok(())
}

fn run_check_config() {
    for status in configuration_report() {
        let mark = if status.enabled { "✅" } else { "⚠️ " };
        println!("{} {}: {}", mark, status.name, status.detail);
    }
}

async fn run_bot(force_polling: bool) -> Result<()> {
    log::info!("Starting bot...");
    log_startup_configuration();

    let bot = create_bot()?;

    // Bot API can be briefly unreachable right after a deploy
    let bot_info = {
        let startup_max_retries = 12;
        let mut startup_retry = 0;
        loop {
            match bot.get_me().await {
                Ok(info) => break info,
                Err(e) => {
                    startup_retry += 1;
                    if startup_retry >= startup_max_retries {
                        return Err(anyhow::anyhow!(
                            "Failed to connect to Bot API after {} retries: {}",
                            startup_retry,
                            e
                        ));
                    }
                    log::warn!(
                        "Bot API not ready (attempt {}/{}): {}. Retrying in 5 seconds...",
                        startup_retry,
                        startup_max_retries,
                        e
                    );
                    sleep(Duration::from_secs(5)).await;
                }
            }
        }
    };
    let bot_username = bot_info.username.clone();
    let bot_id = bot_info.id;
    log::info!("Bot username: {:?}, Bot ID: {}", bot_username, bot_id);

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let router = Arc::new(MessageRouter::from_config()?);
    let state = AppState {
        completer: router.completer(),
    };
    let admin_chat = config::ADMIN_ID.map(ChatId);
    let deps = HandlerDeps::new(
        Arc::clone(&router),
        GroupLinks::from_config(),
        admin_chat,
        bot_username.clone(),
        bot_id,
    );

    let webhook_url = if force_polling { None } else { config::webhook::url() };
    let mode = if webhook_url.is_some() { "webhook" } else { "polling" };
    notify_admin_startup(&bot, admin_chat, bot_username.as_deref(), mode).await;

    run_dispatcher(bot, deps, state, webhook_url).await
}

async fn run_dispatcher(bot: Bot, deps: HandlerDeps, state: AppState, webhook_url: Option<String>) -> Result<()> {
    let handler = schema(deps);
    match webhook_url {
        Some(url) => server::run_webhook(bot, handler, state, &url).await,
        None => {
            // A stale webhook would block getUpdates
            if let Err(e) = bot.delete_webhook().await {
                log::warn!("Failed to delete webhook before polling: {}", e);
            }
            server::run_polling(bot, handler, state).await
        }
    }
}
