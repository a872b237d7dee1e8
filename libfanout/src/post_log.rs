//! Bounded history of recent dispatch attempts
//!
//! Every dispatch, success or failure, appends exactly one entry. The log
//! keeps only the most recent [`POST_LOG_CAPACITY`] entries; the oldest is
//! evicted first. Append and trim happen under one lock so concurrent
//! dispatches cannot lose updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::FailureKind;
use crate::types::{DispatchResult, Platform};

/// Maximum number of retained attempts.
pub const POST_LOG_CAPACITY: usize = 50;

/// One recorded dispatch attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostLogEntry {
    pub id: String,
    pub post_id: String,
    pub platform: Platform,
    pub success: bool,
    pub remote_id: Option<String>,
    pub message: String,
    pub error: Option<FailureKind>,
    pub attempted_at: DateTime<Utc>,
}

impl PostLogEntry {
    pub fn from_result(post_id: &str, result: &DispatchResult) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            post_id: post_id.to_string(),
            platform: result.platform,
            success: result.success,
            remote_id: result.remote_id.clone(),
            message: result.message.clone(),
            error: result.error,
            attempted_at: Utc::now(),
        }
    }
}

/// Append-only ring buffer of dispatch attempts.
#[derive(Debug)]
pub struct PostLog {
    capacity: usize,
    entries: Mutex<VecDeque<PostLogEntry>>,
}

impl Default for PostLog {
    fn default() -> Self {
        Self::new(POST_LOG_CAPACITY)
    }
}

impl PostLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Append one entry, evicting the oldest beyond capacity.
    pub fn append(&self, entry: PostLogEntry) {
        let mut entries = self.entries.lock().expect("post log lock poisoned");
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// All retained entries, newest last.
    pub fn entries(&self) -> Vec<PostLogEntry> {
        self.entries
            .lock()
            .expect("post log lock poisoned")
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("post log lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
