//! Daily CSV log of completion-fallback conversations: `<dir>/log_YYYY-MM-DD.csv`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tokio::sync::Mutex;

use crate::classify::Persona;
use crate::error::AppResult;
use crate::sheets::local::append_csv_record;

#[derive(Debug)]
pub struct ChatLog {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl ChatLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, at: DateTime<Local>) -> PathBuf {
        self.dir.join(format!("log_{}.csv", at.format("%Y-%m-%d")))
    }

    /// Appends (time, uid, text, reply, persona) to today's file.
    pub async fn record(&self, user_id: u64, text: &str, reply: &str, persona: Persona) -> AppResult<()> {
        self.record_at(Local::now(), user_id, text, reply, persona).await
    }

    pub async fn record_at(
        &self,
        at: DateTime<Local>,
        user_id: u64,
        text: &str,
        reply: &str,
        persona: Persona,
    ) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let cells = [
            at.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
            user_id.to_string(),
            text.to_string(),
            reply.to_string(),
            persona.to_string(),
        ];
        append_csv_record(&self.path_for(at), &cells).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_record_goes_to_dated_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = ChatLog::new(dir.path().join("logs"));
        let at = Local.with_ymd_and_hms(2026, 3, 9, 14, 5, 6).unwrap();

        log.record_at(at, 42, "你好", "您好，有什么可以帮您？", Persona::Ordinary)
            .await
            .unwrap();

        let path = dir.path().join("logs").join("log_2026-03-09.csv");
        assert_eq!(log.path_for(at), path);
        let body = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            body,
            "\"2026-03-09 14:05:06.000000\",\"42\",\"你好\",\"您好，有什么可以帮您？\",\"普通用户\"\n"
        );
    }
}
