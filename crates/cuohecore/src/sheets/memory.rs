use std::sync::Mutex;

use async_trait::async_trait;

use super::{SheetStore, Worksheet};
use crate::error::AppResult;

/// In-memory worksheets for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySheets {
    rows: Mutex<Vec<(Worksheet, Vec<String>)>>,
}

impl MemorySheets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows appended to `sheet`, in insertion order.
    pub fn rows(&self, sheet: Worksheet) -> Vec<Vec<String>> {
        let rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        rows.iter()
            .filter(|(s, _)| *s == sheet)
            .map(|(_, cells)| cells.clone())
            .collect()
    }

    pub fn total(&self) -> usize {
        self.rows.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl SheetStore for MemorySheets {
    async fn append_row(&self, sheet: Worksheet, cells: Vec<String>) -> AppResult<()> {
        self.rows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((sheet, cells));
        Ok(())
    }
}
