//! Settings surface
//!
//! The HTTP settings endpoints exchange one flat bag of per-platform
//! credential fields plus two nested structures (`enabled_platforms`,
//! `twitter_settings`). Updates are filtered against the field allow-list
//! server-side; unknown keys never reach the store. Nested values get
//! boolean coercion and numeric clamping rather than strict rejection, the
//! way the original settings screen tolerated loosely-typed form input.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::credentials::{CredentialBag, CredentialStore};
use crate::error::{FanoutError, Result};
use crate::types::Platform;

/// Bounds for the twitter thread-length setting.
pub const THREAD_LENGTH_MIN: i64 = 100;
pub const THREAD_LENGTH_MAX: i64 = 280;

const ENABLED_PLATFORMS_KEY: &str = "enabled_platforms";
const ENABLE_THREADS_KEY: &str = "twitter_enable_threads";
const THREAD_LENGTH_KEY: &str = "twitter_thread_length";

/// Flat settings key ↔ credential field, per platform.
fn field_map(platform: Platform) -> &'static [(&'static str, &'static str)] {
    match platform {
        Platform::Facebook => &[
            ("facebook_api_key", "api_key"),
            ("facebook_page_id", "page_id"),
        ],
        Platform::Twitter => &[
            ("twitter_api_key", "api_key"),
            ("twitter_api_secret", "api_secret"),
            ("twitter_bearer_token", "bearer_token"),
        ],
        Platform::Linkedin => &[
            ("linkedin_client_id", "client_id"),
            ("linkedin_client_secret", "client_secret"),
            ("linkedin_access_token", "access_token"),
        ],
        Platform::Instagram => &[("instagram_api_key", "api_key")],
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwitterSettings {
    pub enable_threads: bool,
    pub thread_length: i64,
}

impl Default for TwitterSettings {
    fn default() -> Self {
        Self {
            enable_threads: false,
            thread_length: THREAD_LENGTH_MAX,
        }
    }
}

/// The settings document the HTTP surface serves: stored values merged with
/// defaults for everything unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsView {
    pub facebook_api_key: String,
    pub facebook_page_id: String,
    pub twitter_api_key: String,
    pub twitter_api_secret: String,
    pub twitter_bearer_token: String,
    pub linkedin_client_id: String,
    pub linkedin_client_secret: String,
    pub linkedin_access_token: String,
    pub instagram_api_key: String,
    pub enabled_platforms: BTreeMap<Platform, bool>,
    pub twitter_settings: TwitterSettings,
}

/// Tolerant boolean reading: accepts booleans, 0/1 numbers, and the usual
/// truthy/falsy strings.
pub fn coerce_bool(value: &serde_json::Value) -> Option<bool> {
    match value {
        serde_json::Value::Bool(b) => Some(*b),
        serde_json::Value::Number(n) => n.as_i64().map(|n| n != 0),
        serde_json::Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn coerce_int(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Null => Some(String::new()),
        _ => None,
    }
}

pub fn clamp_thread_length(value: i64) -> i64 {
    value.clamp(THREAD_LENGTH_MIN, THREAD_LENGTH_MAX)
}

/// Read the current settings, merging stored values with defaults.
pub fn get_settings(store: &dyn CredentialStore) -> Result<SettingsView> {
    let field = |bag: &CredentialBag, name: &str| -> String {
        bag.get(name).cloned().unwrap_or_default()
    };

    let facebook = store.get(Platform::Facebook)?;
    let twitter = store.get(Platform::Twitter)?;
    let linkedin = store.get(Platform::Linkedin)?;
    let instagram = store.get(Platform::Instagram)?;

    // Platforms default to enabled, as the original settings screen did
    let mut enabled_platforms: BTreeMap<Platform, bool> =
        Platform::ALL.into_iter().map(|p| (p, true)).collect();
    if let Some(stored) = store.get_global(ENABLED_PLATFORMS_KEY)? {
        if let Ok(parsed) = serde_json::from_str::<BTreeMap<Platform, bool>>(&stored) {
            enabled_platforms.extend(parsed);
        }
    }

    let mut twitter_settings = TwitterSettings::default();
    if let Some(stored) = store.get_global(ENABLE_THREADS_KEY)? {
        twitter_settings.enable_threads = stored == "true";
    }
    if let Some(stored) = store.get_global(THREAD_LENGTH_KEY)? {
        if let Ok(parsed) = stored.parse::<i64>() {
            twitter_settings.thread_length = clamp_thread_length(parsed);
        }
    }

    Ok(SettingsView {
        facebook_api_key: field(&facebook, "api_key"),
        facebook_page_id: field(&facebook, "page_id"),
        twitter_api_key: field(&twitter, "api_key"),
        twitter_api_secret: field(&twitter, "api_secret"),
        twitter_bearer_token: field(&twitter, "bearer_token"),
        linkedin_client_id: field(&linkedin, "client_id"),
        linkedin_client_secret: field(&linkedin, "client_secret"),
        linkedin_access_token: field(&linkedin, "access_token"),
        instagram_api_key: field(&instagram, "api_key"),
        enabled_platforms,
        twitter_settings,
    })
}

/// Apply a settings update. Only allow-listed flat fields and the two known
/// nested structures are honored; everything else in the payload is
/// silently dropped. Returns the resulting settings document.
pub fn update_settings(
    store: &dyn CredentialStore,
    payload: &serde_json::Value,
) -> Result<SettingsView> {
    let object = payload
        .as_object()
        .ok_or_else(|| FanoutError::InvalidInput("settings payload must be an object".into()))?;

    for platform in Platform::ALL {
        let mut updates = CredentialBag::new();
        for (flat_key, field) in field_map(platform) {
            if let Some(value) = object.get(*flat_key) {
                if let Some(string) = coerce_string(value) {
                    updates.insert((*field).to_string(), string);
                }
            }
        }
        if !updates.is_empty() {
            store.merge(platform, updates)?;
        }
    }

    if let Some(enabled) = object.get(ENABLED_PLATFORMS_KEY).and_then(|v| v.as_object()) {
        let mut merged: BTreeMap<Platform, bool> =
            Platform::ALL.into_iter().map(|p| (p, true)).collect();
        if let Some(stored) = store.get_global(ENABLED_PLATFORMS_KEY)? {
            if let Ok(parsed) = serde_json::from_str::<BTreeMap<Platform, bool>>(&stored) {
                merged.extend(parsed);
            }
        }
        for platform in Platform::ALL {
            if let Some(value) = enabled.get(platform.as_str()) {
                if let Some(flag) = coerce_bool(value) {
                    merged.insert(platform, flag);
                }
            }
        }
        store.set_global(
            ENABLED_PLATFORMS_KEY,
            Some(serde_json::to_string(&merged).expect("map serializes")),
        )?;
    }

    if let Some(twitter) = object.get("twitter_settings").and_then(|v| v.as_object()) {
        if let Some(flag) = twitter.get("enable_threads").and_then(coerce_bool) {
            store.set_global(ENABLE_THREADS_KEY, Some(flag.to_string()))?;
        }
        if let Some(length) = twitter.get("thread_length").and_then(coerce_int) {
            store.set_global(
                THREAD_LENGTH_KEY,
                Some(clamp_thread_length(length).to_string()),
            )?;
        }
    }

    get_settings(store)
}
