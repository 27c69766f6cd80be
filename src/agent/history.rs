use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Smallest capacity that still holds one user/assistant exchange.
const MIN_CAPACITY: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub role: Role,
    pub content: String,
}

/// Insertion-ordered log with a fixed capacity; the oldest entries are
/// evicted first once full.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    entries: VecDeque<ConversationEntry>,
    capacity: usize,
}

impl ConversationHistory {
    /// Capacity is rounded up to an even number so evicting whole
    /// exchanges never leaves an assistant entry without its user entry.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_CAPACITY).div_ceil(2) * 2;
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(ConversationEntry {
            role,
            content: content.into(),
        });
    }

    /// Append one completed exchange.
    pub fn push_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.push(Role::User, user);
        self.push(Role::Assistant, assistant);
    }

    pub fn entries(&self) -> Vec<ConversationEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
