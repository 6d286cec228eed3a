//! HTTP surface: Telegram webhook, `/ai_reply` and health checks
//!
//! In webhook mode the teloxide update router and our routes share one listener.
//! In polling mode only our routes are served.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use cuohecore::config;
use cuohecore::llm::{ask_once, ChatCompleter};
use serde::{Deserialize, Serialize};
use teloxide::dispatching::{Dispatcher, UpdateHandler};
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks;
use tokio::net::TcpListener;

use crate::telegram::HandlerError;

pub const ROOT_TEXT: &str = "tg-resource-bot is running";
pub const EMPTY_PROMPT_REPLY: &str = "对不起，未收到问题内容";
pub const AI_API_ERROR_PREFIX: &str = "AI接口异常: ";
pub const AI_SERVER_ERROR_PREFIX: &str = "AI服务器异常: ";

/// Shared state for the HTTP routes
#[derive(Clone)]
pub struct AppState {
    pub completer: Arc<dyn ChatCompleter>,
}

#[derive(Debug, Deserialize)]
struct AiReplyRequest {
    #[serde(default)]
    prompt: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiReplyResponse {
    pub reply: String,
}

/// Routes served next to the webhook: `/`, `/health` and `/ai_reply`.
pub fn http_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/ai_reply", post(ai_reply_handler))
        .with_state(Arc::new(state))
}

async fn root_handler() -> &'static str {
    ROOT_TEXT
}

async fn health_handler() -> &'static str {
    "ok"
}

/// Single-turn completion without history. Always answers 200 with `{"reply": ...}`.
async fn ai_reply_handler(State(state): State<Arc<AppState>>, body: Bytes) -> impl IntoResponse {
    let reply = match serde_json::from_slice::<AiReplyRequest>(&body) {
        Ok(request) => {
            let prompt = prompt_text(request.prompt);
            if prompt.is_empty() {
                EMPTY_PROMPT_REPLY.to_string()
            } else {
                ask_once(state.completer.as_ref(), &prompt, AI_API_ERROR_PREFIX).await
            }
        }
        Err(e) => {
            log::warn!("/ai_reply got an unreadable body: {}", e);
            format!("{}{}", AI_SERVER_ERROR_PREFIX, e)
        }
    };

    (StatusCode::OK, Json(AiReplyResponse { reply }))
}

/// Prompt as text. JSON-falsy values (`null`, `false`, `0`, `""`, `[]`, `{}`) count as no prompt.
fn prompt_text(prompt: Option<serde_json::Value>) -> String {
    use serde_json::Value;

    match prompt {
        None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => String::new(),
        Some(Value::Array(items)) if items.is_empty() => String::new(),
        Some(Value::Object(fields)) if fields.is_empty() => String::new(),
        Some(Value::String(text)) => text,
        Some(other) => other.to_string(),
    }
}

fn listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], *config::webhook::PORT))
}

/// Registers the webhook and serves updates plus the HTTP routes on one port.
pub async fn run_webhook(bot: Bot, handler: UpdateHandler<HandlerError>, state: AppState, url: &str) -> Result<()> {
    let addr = listen_addr();
    let url = url::Url::parse(url)?;

    let options = webhooks::Options::new(addr, url.clone()).secret_token(config::webhook::SECRET.clone());
    let (listener, stop_flag, webhook_router) = webhooks::axum_to_router(bot.clone(), options).await?;
    let app = webhook_router.merge(http_routes(state));

    let tcp = TcpListener::bind(addr).await?;
    log::info!("Webhook set to {}, listening on http://{}", url, addr);
    log::info!("  /ai_reply - single-turn AI reply");
    log::info!("  /health   - Health check");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(tcp, app).with_graceful_shutdown(stop_flag).await {
            log::error!("HTTP server error: {}", e);
        }
    });

    Dispatcher::builder(bot.clone(), handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(listener, LoggingErrorHandler::with_custom_text("Error from the webhook listener"))
        .await;

    if let Err(e) = bot.delete_webhook().await {
        log::warn!("Failed to delete webhook on shutdown: {}", e);
    }
    Ok(())
}

/// Long polling for updates; the HTTP routes still run on their own task.
pub async fn run_polling(bot: Bot, handler: UpdateHandler<HandlerError>, state: AppState) -> Result<()> {
    let addr = listen_addr();
    let tcp = TcpListener::bind(addr).await?;
    log::info!("Polling mode, HTTP routes on http://{}", addr);

    let app = http_routes(state);
    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(tcp, app).await {
            log::error!("HTTP server error: {}", e);
        }
    });

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    server.abort();
    Ok(())
}
