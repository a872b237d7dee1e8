//! Error types for Fanout

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Platform;

pub type Result<T> = std::result::Result<T, FanoutError>;

#[derive(Error, Debug)]
pub enum FanoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl FanoutError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            FanoutError::InvalidInput(_) => 3,
            FanoutError::Dispatch(DispatchError::MissingCredentials(_)) => 2,
            FanoutError::Dispatch(_) => 1,
            FanoutError::Config(_) => 1,
            FanoutError::Store(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse store file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize store: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Errors produced on the dispatch path.
///
/// Every variant maps to one [`FailureKind`] so a failed
/// [`DispatchResult`](crate::types::DispatchResult) can carry a stable,
/// serializable discriminant alongside the human-readable message.
#[derive(Error, Debug, Clone)]
pub enum DispatchError {
    #[error("Unknown platform: {0}")]
    InvalidPlatform(String),

    #[error("No credentials configured for {0}")]
    MissingCredentials(Platform),

    #[error("Facebook page id is not configured")]
    MissingPageId,

    #[error("OAuth state parameter does not match the issued nonce")]
    InvalidState,

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Platform API error (status {status}): {message}")]
    PlatformApiError { status: u16, message: String },

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Unknown post: {0}")]
    UnknownPost(String),
}

impl DispatchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            DispatchError::InvalidPlatform(_) => FailureKind::InvalidPlatform,
            DispatchError::MissingCredentials(_) => FailureKind::MissingCredentials,
            DispatchError::MissingPageId => FailureKind::MissingPageId,
            DispatchError::InvalidState => FailureKind::InvalidState,
            DispatchError::RateLimited(_) => FailureKind::RateLimited,
            DispatchError::PlatformApiError { .. } => FailureKind::PlatformApiError,
            DispatchError::TransportError(_) => FailureKind::TransportError,
            DispatchError::NotImplemented(_) => FailureKind::NotImplemented,
            DispatchError::UnknownPost(_) => FailureKind::UnknownPost,
        }
    }
}

/// Serializable discriminant of a dispatch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidPlatform,
    MissingCredentials,
    MissingPageId,
    InvalidState,
    RateLimited,
    PlatformApiError,
    TransportError,
    NotImplemented,
    UnknownPost,
}

/// Map a reqwest error to the dispatch taxonomy.
///
/// Timeouts and connection failures are transport failures, never platform
/// errors. A status captured by `error_for_status` keeps its code.
pub fn map_transport_error(error: reqwest::Error, context: &str) -> DispatchError {
    if error.is_timeout() {
        return DispatchError::TransportError(format!("{context} timed out: {error}"));
    }
    if error.is_connect() {
        return DispatchError::TransportError(format!("{context} connection failed: {error}"));
    }
    if let Some(status) = error.status() {
        return DispatchError::PlatformApiError {
            status: status.as_u16(),
            message: format!("{context} failed: {error}"),
        };
    }
    DispatchError::TransportError(format!("{context} failed: {error}"))
}
