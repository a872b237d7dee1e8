//! Fanout - schedule-and-dispatch fan-out to social platforms
//!
//! This library holds the core of the fan-out service: platform adapters,
//! the dispatch coordinator, credential and content stores, schedule
//! normalization, and the delayed-trigger registry.

pub mod config;
pub mod content;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod platforms;
pub mod post_log;
pub mod schedule;
pub mod settings;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use credentials::{CredentialBag, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use dispatch::{AdapterSet, DispatchCoordinator};
pub use error::{DispatchError, FanoutError, Result};
pub use post_log::{PostLog, PostLogEntry, POST_LOG_CAPACITY};
pub use schedule::{ScheduleEntry, TriggerRegistry};
pub use types::{DispatchResult, Platform, PostContent, ValidationResult};
