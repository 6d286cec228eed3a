use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Reads an environment variable, treating blank values as unset.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    non_empty_var("BOT_TOKEN")
        .or_else(|| non_empty_var("TELOXIDE_TOKEN"))
        .unwrap_or_default()
});

/// Telegram user id that receives admin notices (new reports, new resources)
/// Read from ADMIN_ID environment variable; unset or unparsable disables notices
pub static ADMIN_ID: Lazy<Option<i64>> =
    Lazy::new(|| non_empty_var("ADMIN_ID").and_then(|raw| raw.parse::<i64>().ok()));

/// Main group invite link
/// Default: https://t.me/+abc
pub static GROUP_LINK: Lazy<String> =
    Lazy::new(|| non_empty_var("GROUP_LINK").unwrap_or_else(|| "https://t.me/+abc".to_string()));

/// VIP group invite link, falls back to GROUP_LINK
pub static VIP_GROUP_LINK: Lazy<String> =
    Lazy::new(|| non_empty_var("VIP_GROUP_LINK").unwrap_or_else(|| GROUP_LINK.clone()));

/// Channel handle mentioned in the resource-request reply
pub static RESOURCE_CHANNEL: Lazy<String> =
    Lazy::new(|| non_empty_var("RESOURCE_CHANNEL").unwrap_or_else(|| "@YourChannel".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| non_empty_var("LOG_FILE_PATH").unwrap_or_else(|| "app.log".to_string()));

/// Directory of the daily chat CSV logs
/// Default: logs
pub static LOG_DIR: Lazy<String> = Lazy::new(|| non_empty_var("LOG_DIR").unwrap_or_else(|| "logs".to_string()));

/// Keyword knowledge base (YAML)
/// Default: qas_multi_lang.yaml
pub static QA_FILE: Lazy<String> =
    Lazy::new(|| non_empty_var("QA_FILE").unwrap_or_else(|| "qas_multi_lang.yaml".to_string()));

/// Counter file for messages the knowledge base could not answer
/// Default: unmatched_keywords.json
pub static UNMATCHED_FILE: Lazy<String> =
    Lazy::new(|| non_empty_var("UNMATCHED_FILE").unwrap_or_else(|| "unmatched_keywords.json".to_string()));

/// Spreadsheet configuration
pub mod sheets {
    use super::{non_empty_var, Lazy};

    /// Spreadsheet name, resolved to an id through the Drive API
    /// Default: resources-data
    pub static NAME: Lazy<String> =
        Lazy::new(|| non_empty_var("GSHEET_NAME").unwrap_or_else(|| "resources-data".to_string()));

    /// Spreadsheet id; when set, the name lookup is skipped
    pub static ID: Lazy<Option<String>> = Lazy::new(|| non_empty_var("GSHEET_ID"));

    /// Base64-encoded service account JSON
    /// When unset, worksheets are written as local CSV files instead
    pub static KEY_BASE64: Lazy<Option<String>> = Lazy::new(|| non_empty_var("GSHEET_KEY_BASE64"));

    /// Directory for local CSV worksheets
    /// Default: sheets
    pub static LOCAL_DIR: Lazy<String> =
        Lazy::new(|| non_empty_var("SHEETS_DIR").unwrap_or_else(|| "sheets".to_string()));

    pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
    pub const DRIVE_API_BASE: &str = "https://www.googleapis.com";
    pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

    /// OAuth scopes requested for the service account
    pub const SCOPES: &str =
        "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive.readonly";

    /// Access tokens are refreshed this many seconds before they expire
    pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;
}

/// Completion API configuration
pub mod llm {
    use super::{non_empty_var, Lazy};

    /// API key for the completion service
    pub static API_KEY: Lazy<String> = Lazy::new(|| non_empty_var("OPENAI_API_KEY").unwrap_or_default());

    /// Base URL of an OpenAI-compatible API
    pub static BASE_URL: Lazy<String> =
        Lazy::new(|| non_empty_var("OPENAI_BASE_URL").unwrap_or_else(|| "https://api.openai.com/v1".to_string()));

    /// Model name
    pub static MODEL: Lazy<String> =
        Lazy::new(|| non_empty_var("OPENAI_MODEL").unwrap_or_else(|| "gpt-3.5-turbo".to_string()));

    /// Sampling temperature, fixed
    pub const TEMPERATURE: f32 = 0.7;
}

/// Chat history configuration
pub mod history {
    /// Number of role/content entries kept per user
    pub const MAX_ENTRIES: usize = 10;
}

/// Webhook and HTTP server configuration
pub mod webhook {
    use super::{non_empty_var, Lazy};

    /// Path Telegram posts updates to
    pub const PATH: &str = "/webhook";

    /// Public base URL; WEBHOOK_URL + PATH is registered with Telegram
    pub static BASE_URL: Lazy<Option<String>> =
        Lazy::new(|| non_empty_var("WEBHOOK_URL").map(|url| url.trim_end_matches('/').to_string()));

    /// Shared secret checked against X-Telegram-Bot-Api-Secret-Token
    pub static SECRET: Lazy<String> =
        Lazy::new(|| non_empty_var("WEBHOOK_SECRET").unwrap_or_else(|| "secret-token".to_string()));

    /// HTTP listen port
    /// Default: 8080
    pub static PORT: Lazy<u16> = Lazy::new(|| {
        non_empty_var("PORT")
            .and_then(|raw| raw.parse::<u16>().ok())
            .unwrap_or(8080)
    });

    /// Full webhook URL, if webhook mode is configured
    pub fn url() -> Option<String> {
        BASE_URL.as_ref().map(|base| format!("{}{}", base, PATH))
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for outbound HTTP requests (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}
