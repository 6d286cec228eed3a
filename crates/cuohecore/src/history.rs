//! Per-user rolling chat history for the completion fallback.
//!
//! Each user owns one `Conversation` behind its own async lock. A fallback turn
//! holds that lock from pushing the question until the answer is stored, so two
//! messages from the same user are answered one after the other and neither
//! update is lost. Different users never wait on each other.

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered history capped at `limit` entries; the oldest are dropped first.
#[derive(Debug, Clone)]
pub struct Conversation {
    entries: VecDeque<ChatMessage>,
    limit: usize,
}

impl Conversation {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit + 1),
            limit,
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.entries.push_back(message);
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Conversations of all users, for the process lifetime.
#[derive(Debug)]
pub struct ChatHistory {
    users: DashMap<u64, Arc<Mutex<Conversation>>>,
    limit: usize,
}

impl Default for ChatHistory {
    fn default() -> Self {
        Self::new(crate::config::history::MAX_ENTRIES)
    }
}

impl ChatHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            users: DashMap::new(),
            limit,
        }
    }

    /// Exclusive access to one user's conversation, held until the guard drops.
    pub async fn lock(&self, user_id: u64) -> OwnedMutexGuard<Conversation> {
        // Clone the Arc out so no map shard stays locked across the await.
        let slot = self
            .users
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(Conversation::new(self.limit))))
            .clone();
        slot.lock_owned().await
    }

    pub async fn snapshot(&self, user_id: u64) -> Vec<ChatMessage> {
        let slot = self.users.get(&user_id).map(|entry| Arc::clone(entry.value()));
        match slot {
            Some(slot) => slot.lock().await.messages(),
            None => Vec::new(),
        }
    }
}
