//! Common test utilities
//!
//! Shared by the router integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cuohecore::classify::GroupLinks;
use cuohecore::history::ChatMessage;
use cuohecore::llm::ChatCompleter;
use cuohecore::router::RouterSettings;
use cuohecore::sheets::{MemorySheets, SheetStore, Worksheet};
use cuohecore::{AppError, AppResult, MessageRouter};

/// Completer that answers "reply N" and remembers every conversation it was sent.
#[derive(Default)]
pub struct ScriptedCompleter {
    pub calls: Mutex<Vec<Vec<ChatMessage>>>,
    pub fail_with: Option<String>,
}

impl ScriptedCompleter {
    pub fn failing(message: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_with: Some(message.to_string()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatCompleter for ScriptedCompleter {
    async fn complete(&self, messages: &[ChatMessage]) -> AppResult<String> {
        let call_number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(messages.to_vec());
            calls.len()
        };
        // Give other tasks a chance to run mid-request, like a real network call
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        match &self.fail_with {
            Some(message) => Err(AppError::Completion(message.clone())),
            None => Ok(format!("reply {}", call_number)),
        }
    }
}

/// Sheet store where every append fails.
pub struct FailingSheets;

#[async_trait]
impl SheetStore for FailingSheets {
    async fn append_row(&self, _sheet: Worksheet, _cells: Vec<String>) -> AppResult<()> {
        Err(AppError::Sheets("quota exceeded".to_string()))
    }
}

pub fn settings() -> RouterSettings {
    RouterSettings {
        channel: "@TestChannel".to_string(),
        links: GroupLinks {
            main: "https://t.me/+main".to_string(),
            vip: "https://t.me/+vip".to_string(),
        },
    }
}

pub struct Harness {
    pub router: MessageRouter,
    pub sheets: Arc<MemorySheets>,
    pub completer: Arc<ScriptedCompleter>,
}

pub fn harness() -> Harness {
    harness_with(ScriptedCompleter::default())
}

pub fn harness_with(completer: ScriptedCompleter) -> Harness {
    let sheets = Arc::new(MemorySheets::new());
    let completer = Arc::new(completer);
    let router = MessageRouter::new(settings(), sheets.clone(), completer.clone());
    Harness {
        router,
        sheets,
        completer,
    }
}
