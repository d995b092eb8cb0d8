//! Bounded conversation history

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use perception::SafetyStatus;
use serde::{Deserialize, Serialize};

/// Exchanges kept per agent
pub const HISTORY_CAPACITY: usize = 5;

/// One query and its answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub timestamp: DateTime<Utc>,
    pub query: String,
    pub response: String,
    pub safety_status: Option<SafetyStatus>,
    pub num_objects: usize,
    pub used_vlm: bool,
    pub used_remote: bool,
}

/// Sliding window over the most recent exchanges
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    entries: VecDeque<Exchange>,
    capacity: usize,
}

impl ConversationHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, exchange: Exchange) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(exchange);
    }

    /// Oldest first
    pub fn entries(&self) -> Vec<Exchange> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(query: &str) -> Exchange {
        Exchange {
            timestamp: Utc::now(),
            query: query.to_string(),
            response: "ok".to_string(),
            safety_status: Some(SafetyStatus::Clear),
            num_objects: 0,
            used_vlm: false,
            used_remote: false,
        }
    }

    #[test]
    fn test_keeps_last_five() {
        let mut history = ConversationHistory::default();
        for i in 0..8 {
            history.push(exchange(&format!("q{}", i)));
        }

        let queries: Vec<String> = history.entries().into_iter().map(|e| e.query).collect();
        assert_eq!(queries, vec!["q3", "q4", "q5", "q6", "q7"]);
    }

    #[test]
    fn test_clear() {
        let mut history = ConversationHistory::default();
        history.push(exchange("hello"));
        assert_eq!(history.entries().len(), 1);
        history.clear();
        assert!(history.entries().is_empty());
    }
}
