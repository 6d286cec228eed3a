//! Logging initialization and configuration checking
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - Startup report of which integrations are configured

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::config;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to create the file or a logger was already set
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// One line of the startup report: integration name and whether it is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStatus {
    pub name: &'static str,
    pub enabled: bool,
    pub detail: String,
}

/// Collects the configuration report without logging it. Secrets are never included.
pub fn configuration_report() -> Vec<ConfigStatus> {
    vec![
        ConfigStatus {
            name: "BOT_TOKEN",
            enabled: !config::BOT_TOKEN.is_empty(),
            detail: "Telegram bot token".to_string(),
        },
        ConfigStatus {
            name: "OPENAI_API_KEY",
            enabled: !config::llm::API_KEY.is_empty(),
            detail: format!("model {} at {}", *config::llm::MODEL, *config::llm::BASE_URL),
        },
        ConfigStatus {
            name: "GSHEET_KEY_BASE64",
            enabled: config::sheets::KEY_BASE64.is_some(),
            detail: match config::sheets::KEY_BASE64.as_ref() {
                Some(_) => format!("Google spreadsheet '{}'", *config::sheets::NAME),
                None => format!("local CSV worksheets in {}", *config::sheets::LOCAL_DIR),
            },
        },
        ConfigStatus {
            name: "WEBHOOK_URL",
            enabled: config::webhook::BASE_URL.is_some(),
            detail: match config::webhook::url() {
                Some(url) => format!("webhook {}", url),
                None => "long polling".to_string(),
            },
        },
        ConfigStatus {
            name: "ADMIN_ID",
            enabled: config::ADMIN_ID.is_some(),
            detail: "admin notices for reports and submissions".to_string(),
        },
        ConfigStatus {
            name: "QA_FILE",
            enabled: std::path::Path::new(config::QA_FILE.as_str()).exists(),
            detail: config::QA_FILE.clone(),
        },
    ]
}

/// Logs the configuration report at application startup
pub fn log_startup_configuration() {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("Configuration Check");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for status in configuration_report() {
        if status.enabled {
            log::info!("✅ {}: {}", status.name, status.detail);
        } else {
            log::warn!("⚠️  {}: not set ({})", status.name, status.detail);
        }
    }

    if config::BOT_TOKEN.is_empty() {
        log::error!("❌ BOT_TOKEN is not set - the bot cannot start");
    }
    if config::llm::API_KEY.is_empty() {
        log::warn!("Completion fallback will answer with API errors until OPENAI_API_KEY is set");
    }
}
