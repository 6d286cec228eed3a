//! Keyword knowledge base loaded from YAML, plus the counter of messages it could not answer.
//!
//! File layout:
//!
//! ```yaml
//! - category: 担保
//!   subcategories:
//!     - keywords: [担保, 押金]
//!       reply: 我们提供担保交易……
//!     - keywords: [中介费]
//!       reply:
//!         - 中介费按成交额计算。
//!         - 中介费请咨询管理员。
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::AppResult;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ReplyText {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct QaEntry {
    #[serde(default)]
    pub keywords: Vec<String>,
    pub reply: ReplyText,
}

impl QaEntry {
    /// Picks the reply; list replies are sampled uniformly.
    pub fn pick_reply<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<String> {
        match &self.reply {
            ReplyText::One(text) => Some(text.clone()),
            ReplyText::Many(options) => options.choose(rng).cloned(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QaCategory {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategories: Vec<QaEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    categories: Vec<QaCategory>,
}

impl KnowledgeBase {
    pub fn from_yaml(source: &str) -> AppResult<Self> {
        let categories: Vec<QaCategory> = serde_yaml::from_str(source)?;
        Ok(Self { categories })
    }

    /// Loads the file; a missing file yields an empty knowledge base.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::warn!("Knowledge base {} not found, keyword replies disabled", path.display());
            return Ok(Self::default());
        }
        let source = fs_err::read_to_string(path)?;
        let kb = Self::from_yaml(&source)?;
        log::info!("Loaded knowledge base {} ({} entries)", path.display(), kb.len());
        Ok(kb)
    }

    pub fn len(&self) -> usize {
        self.categories.iter().map(|c| c.subcategories.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First entry, in file order, with a keyword contained in the lower-cased text.
    pub fn lookup(&self, text: &str) -> Option<&QaEntry> {
        let text = text.to_lowercase();
        self.categories
            .iter()
            .flat_map(|c| c.subcategories.iter())
            .find(|entry| entry.keywords.iter().any(|k| text.contains(&k.to_lowercase())))
    }
}

/// Counts messages with no knowledge-base answer, keyed by lower-cased text.
///
/// The file is rewritten on every miss; the lock keeps concurrent misses from
/// dropping each other's increments.
#[derive(Debug)]
pub struct UnmatchedLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl UnmatchedLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn record(&self, text: &str) -> AppResult<u64> {
        let _guard = self.lock.lock().await;

        let mut counts = self.read_counts().await;
        let count = counts.entry(text.to_lowercase()).or_insert(0);
        *count += 1;
        let updated = *count;

        let body = serde_json::to_string_pretty(&counts)?;
        fs_err::tokio::write(&self.path, body).await?;
        Ok(updated)
    }

    /// Current counts. Unreadable or corrupt files count as empty.
    pub async fn read_counts(&self) -> BTreeMap<String, u64> {
        match fs_err::tokio::read_to_string(&self.path).await {
            Ok(body) => serde_json::from_str(&body).unwrap_or_default(),
            Err(_) => BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SAMPLE: &str = r#"
- category: 担保
  subcategories:
    - keywords: [担保, 押金]
      reply: 平台提供担保交易。
    - keywords: [Fee]
      reply:
        - 费用一
        - 费用二
- category: 其它
  subcategories:
    - keywords: [押金退还]
      reply: 不会被匹配到
"#;

    #[test]
    fn test_lookup_first_entry_in_file_order() {
        let kb = KnowledgeBase::from_yaml(SAMPLE).unwrap();
        assert_eq!(kb.len(), 3);

        let entry = kb.lookup("押金退还怎么办").unwrap();
        assert_eq!(entry.pick_reply(&mut StdRng::seed_from_u64(1)).unwrap(), "平台提供担保交易。");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let kb = KnowledgeBase::from_yaml(SAMPLE).unwrap();
        let entry = kb.lookup("what is the FEE").unwrap();
        let reply = entry.pick_reply(&mut StdRng::seed_from_u64(7)).unwrap();
        assert!(reply == "费用一" || reply == "费用二");
    }

    #[test]
    fn test_lookup_miss() {
        let kb = KnowledgeBase::from_yaml(SAMPLE).unwrap();
        assert!(kb.lookup("天气").is_none());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let kb = KnowledgeBase::load(dir.path().join("nope.yaml")).unwrap();
        assert!(kb.is_empty());
    }

    #[test]
    fn test_malformed_file_is_error() {
        assert!(KnowledgeBase::from_yaml("- subcategories: 5").is_err());
    }

    #[tokio::test]
    async fn test_unmatched_counts_accumulate() {
        let dir = tempfile::tempdir().unwrap();
        let log = UnmatchedLog::new(dir.path().join("unmatched.json"));

        assert_eq!(log.record("Hello").await.unwrap(), 1);
        assert_eq!(log.record("hello").await.unwrap(), 2);
        assert_eq!(log.record("天气").await.unwrap(), 1);

        let counts = log.read_counts().await;
        assert_eq!(counts.get("hello"), Some(&2));
        assert_eq!(counts.get("天气"), Some(&1));

        // UTF-8 kept as-is, not \u-escaped
        let body = std::fs::read_to_string(log.path()).unwrap();
        assert!(body.contains("天气"));
    }

    #[tokio::test]
    async fn test_unmatched_recovers_from_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unmatched.json");
        std::fs::write(&path, "not json").unwrap();

        let log = UnmatchedLog::new(&path);
        assert_eq!(log.record("x").await.unwrap(), 1);
    }
}
