//! Schedule entries and delayed triggers
//!
//! A content save carries one [`ScheduleEntry`]: per platform, an optional
//! publication datetime and an enabled flag. Disabling a platform clears its
//! pending time — enabling and scheduling are coupled. The latest save wins:
//! re-registering a post cancels the pending triggers of the previous entry
//! before arming new ones.
//!
//! Triggers are single delayed callbacks (one tokio task each), the
//! standalone analog of the host CMS's one-shot timer facility. Delivery is
//! at-most-once per registration; a duplicate fire is tolerated by the
//! coordinator and simply produces a fresh outbound post.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::dispatch::DispatchCoordinator;
use crate::types::Platform;

/// Per-post, per-platform schedule. The one entry per post; a later save
/// overwrites it wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub post_id: String,
    /// Requested publication time per platform
    #[serde(default)]
    pub times: BTreeMap<Platform, Option<DateTime<Utc>>>,
    /// Platforms the editor enabled for this post
    #[serde(default)]
    pub enabled: BTreeMap<Platform, bool>,
}

impl ScheduleEntry {
    pub fn new(post_id: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            times: BTreeMap::new(),
            enabled: BTreeMap::new(),
        }
    }

    pub fn with_time(mut self, platform: Platform, at: DateTime<Utc>) -> Self {
        self.times.insert(platform, Some(at));
        self
    }

    pub fn with_enabled(mut self, platform: Platform, enabled: bool) -> Self {
        self.enabled.insert(platform, enabled);
        self
    }

    fn is_enabled(&self, platform: Platform) -> bool {
        self.enabled.get(&platform).copied().unwrap_or(false)
    }

    /// Enforce the coupling invariant: a disabled platform keeps no
    /// datetime.
    pub fn normalized(mut self) -> Self {
        for platform in Platform::ALL {
            if !self.is_enabled(platform) {
                if let Some(slot) = self.times.get_mut(&platform) {
                    *slot = None;
                }
            }
        }
        self
    }

    /// Platforms that actually get a trigger: enabled and scheduled.
    pub fn active(&self) -> Vec<(Platform, DateTime<Utc>)> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.is_enabled(*p))
            .filter_map(|p| self.times.get(&p).copied().flatten().map(|at| (p, at)))
            .collect()
    }
}

struct Registered {
    entry: ScheduleEntry,
    handles: Vec<JoinHandle<()>>,
}

/// Arms one delayed dispatch per active platform of a schedule entry.
pub struct TriggerRegistry {
    coordinator: Arc<DispatchCoordinator>,
    registered: Mutex<HashMap<String, Registered>>,
}

impl TriggerRegistry {
    pub fn new(coordinator: Arc<DispatchCoordinator>) -> Self {
        Self {
            coordinator,
            registered: Mutex::new(HashMap::new()),
        }
    }

    /// Register the entry: normalize it, cancel any pending triggers from a
    /// prior save of the same post, then arm one trigger per active
    /// platform. Returns the normalized entry and the number of triggers
    /// armed.
    pub fn register(&self, entry: ScheduleEntry) -> (ScheduleEntry, usize) {
        let entry = entry.normalized();
        let post_id = entry.post_id.clone();

        let mut handles = Vec::new();
        for (platform, at) in entry.active() {
            debug!(post_id = %post_id, platform = %platform, at = %at, "arming trigger");
            handles.push(self.arm(post_id.clone(), platform, at));
        }
        let armed = handles.len();

        let mut registered = self.registered.lock().expect("trigger registry lock poisoned");
        if let Some(previous) = registered.insert(
            post_id.clone(),
            Registered {
                entry: entry.clone(),
                handles,
            },
        ) {
            for handle in previous.handles {
                handle.abort();
            }
            info!(post_id = %post_id, "replaced pending triggers with latest save");
        }

        (entry, armed)
    }

    /// Cancel all pending triggers of a post and forget its entry.
    pub fn cancel(&self, post_id: &str) {
        let mut registered = self.registered.lock().expect("trigger registry lock poisoned");
        if let Some(previous) = registered.remove(post_id) {
            for handle in previous.handles {
                handle.abort();
            }
            info!(post_id = %post_id, "cancelled pending triggers");
        }
    }

    /// The stored (normalized) entry of a post, if any.
    pub fn entry(&self, post_id: &str) -> Option<ScheduleEntry> {
        self.registered
            .lock()
            .expect("trigger registry lock poisoned")
            .get(post_id)
            .map(|r| r.entry.clone())
    }

    fn arm(&self, post_id: String, platform: Platform, at: DateTime<Utc>) -> JoinHandle<()> {
        let coordinator = Arc::clone(&self.coordinator);
        tokio::spawn(async move {
            let delay = (at - Utc::now()).to_std().unwrap_or_default();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let result = coordinator.dispatch(&post_id, platform).await;
            if result.success {
                info!(post_id = %post_id, platform = %platform, "scheduled dispatch fired");
            }
        })
    }
}
