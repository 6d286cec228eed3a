//! Append-only worksheet logs.
//!
//! Three worksheets receive rows: `resources`, `reports` and `interactions`.
//! They live in a Google spreadsheet when a service account is configured and in
//! local CSV files otherwise.

pub mod google;
pub mod local;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use strum::{AsRefStr, Display};

use crate::classify::Tag;
use crate::config;
use crate::error::AppResult;
use crate::intent::Intent;
use crate::publish::ResourceSubmission;

pub use google::{GoogleSheets, ServiceAccountKey, ServiceAccountTokens, StaticToken, TokenSource};
pub use local::LocalSheets;
pub use memory::MemorySheets;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Worksheet {
    Resources,
    Reports,
    Interactions,
}

/// Status written on every new report row.
pub const REPORT_PENDING: &str = "待审核";

/// Sheet timestamp format, local time.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn timestamp_now() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

#[async_trait]
pub trait SheetStore: Send + Sync {
    async fn append_row(&self, sheet: Worksheet, cells: Vec<String>) -> AppResult<()>;
}

/// (username, raw text, intent label, timestamp)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionRow {
    pub username: String,
    pub text: String,
    pub intent: Intent,
    pub timestamp: String,
}

impl InteractionRow {
    pub fn into_cells(self) -> Vec<String> {
        vec![self.username, self.text, self.intent.to_string(), self.timestamp]
    }
}

/// (username, raw text, tag, timestamp, review status)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub username: String,
    pub text: String,
    pub tag: Tag,
    pub timestamp: String,
    pub status: String,
}

impl ReportRow {
    pub fn into_cells(self) -> Vec<String> {
        vec![self.username, self.text, self.tag.to_string(), self.timestamp, self.status]
    }
}

/// (region, type, content, contact, tag, timestamp)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRow {
    pub submission: ResourceSubmission,
    pub tag: Tag,
    pub timestamp: String,
}

impl ResourceRow {
    pub fn into_cells(self) -> Vec<String> {
        let ResourceSubmission {
            region,
            resource_type,
            content,
            contact,
        } = self.submission;
        vec![region, resource_type, content, contact, self.tag.to_string(), self.timestamp]
    }
}

/// Google spreadsheet when GSHEET_KEY_BASE64 is set, local CSV worksheets otherwise.
pub fn store_from_config() -> AppResult<Arc<dyn SheetStore>> {
    match config::sheets::KEY_BASE64.as_deref() {
        Some(encoded) => {
            let sheets = GoogleSheets::from_service_account(encoded)?;
            log::info!("Worksheets: Google spreadsheet '{}'", *config::sheets::NAME);
            Ok(Arc::new(sheets))
        }
        None => {
            log::info!("Worksheets: local CSV files in {}", *config::sheets::LOCAL_DIR);
            Ok(Arc::new(LocalSheets::new(config::sheets::LOCAL_DIR.as_str())))
        }
    }
}
