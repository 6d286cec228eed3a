//! Worksheets as local CSV files, one `<worksheet>.csv` per tab.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{SheetStore, Worksheet};
use crate::error::AppResult;

/// Formats one CSV record, every field quoted, newline-terminated.
pub fn csv_record<S: AsRef<str>>(cells: &[S]) -> String {
    let fields: Vec<String> = cells
        .iter()
        .map(|cell| format!("\"{}\"", cell.as_ref().replace('"', "\"\"")))
        .collect();
    format!("{}\n", fields.join(","))
}

/// Appends one record to a CSV file, creating the parent directory as needed.
pub async fn append_csv_record<S: AsRef<str>>(path: &Path, cells: &[S]) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs_err::tokio::create_dir_all(parent).await?;
        }
    }

    let mut file = fs_err::tokio::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(csv_record(cells).as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

#[derive(Debug)]
pub struct LocalSheets {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl LocalSheets {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path_for(&self, sheet: Worksheet) -> PathBuf {
        self.dir.join(format!("{}.csv", sheet))
    }
}

#[async_trait]
impl SheetStore for LocalSheets {
    async fn append_row(&self, sheet: Worksheet, cells: Vec<String>) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        append_csv_record(&self.path_for(sheet), &cells).await
    }
}
