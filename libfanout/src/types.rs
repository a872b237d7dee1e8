//! Core types shared across the fan-out pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{DispatchError, FailureKind};

/// The four supported target platforms.
///
/// Dispatch is keyed on this enum; unknown platform strings are rejected at
/// the edge when parsing, so the interior of the pipeline never sees one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Facebook,
    Twitter,
    Linkedin,
    Instagram,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Facebook,
        Platform::Twitter,
        Platform::Linkedin,
        Platform::Instagram,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Facebook => "facebook",
            Platform::Twitter => "twitter",
            Platform::Linkedin => "linkedin",
            Platform::Instagram => "instagram",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = DispatchError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "facebook" => Ok(Platform::Facebook),
            "twitter" | "x" => Ok(Platform::Twitter),
            "linkedin" => Ok(Platform::Linkedin),
            "instagram" => Ok(Platform::Instagram),
            other => Err(DispatchError::InvalidPlatform(other.to_string())),
        }
    }
}

/// A content item as provided by the content-save collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostContent {
    /// Caller-assigned content id
    pub id: String,
    /// Title, used as the first line of the normalized message
    pub title: String,
    /// Full body; only a word-bounded excerpt is dispatched
    pub body: String,
    /// Public URL of the content
    pub url: String,
}

/// Outcome of one dispatch attempt.
///
/// This is the normalized boundary type: adapter and transport failures are
/// folded into `success == false` plus a message, never raised to the
/// delayed-trigger collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResult {
    pub platform: Platform,
    pub success: bool,
    /// Remote post id, when the platform returned one
    pub remote_id: Option<String>,
    /// Human-readable outcome description
    pub message: String,
    /// Failure discriminant, present only on failure
    pub error: Option<FailureKind>,
    /// Decoded remote response body, kept opaque for diagnostics
    pub raw_response: Option<serde_json::Value>,
}

impl DispatchResult {
    pub fn ok(
        platform: Platform,
        remote_id: Option<String>,
        raw_response: Option<serde_json::Value>,
    ) -> Self {
        let message = match &remote_id {
            Some(id) => format!("posted to {platform} as {id}"),
            None => format!("posted to {platform}"),
        };
        Self {
            platform,
            success: true,
            remote_id,
            message,
            error: None,
            raw_response,
        }
    }

    pub fn failure(platform: Platform, error: &DispatchError) -> Self {
        Self {
            platform,
            success: false,
            remote_id: None,
            message: error.to_string(),
            error: Some(error.kind()),
            raw_response: None,
        }
    }
}

/// Access token obtained from the LinkedIn token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl OAuthToken {
    /// Build a token from the endpoint's `expires_in` seconds field.
    pub fn from_expires_in(access_token: String, expires_in: i64, now: DateTime<Utc>) -> Self {
        Self {
            access_token,
            expires_at: now + chrono::Duration::seconds(expires_in),
        }
    }

    /// A token must not be used past its expiry.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Outcome of a credential validation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub message: String,
    pub error: Option<FailureKind>,
}

impl ValidationResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            valid: true,
            message: message.into(),
            error: None,
        }
    }

    pub fn failure(error: &DispatchError) -> Self {
        Self {
            valid: false,
            message: error.to_string(),
            error: Some(error.kind()),
        }
    }
}
