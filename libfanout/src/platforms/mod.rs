//! Platform adapters
//!
//! Each adapter translates one normalized message into its platform's wire
//! payload and performs the HTTP call. Adapters receive credentials per call
//! and hold no mutable state of their own; all of them share one
//! [`reqwest::Client`].
//!
//! # Examples
//!
//! ```no_run
//! use libfanout::credentials::bag;
//! use libfanout::platforms::{facebook::FacebookAdapter, SocialPlatform};
//!
//! # async fn example() -> Result<(), libfanout::error::DispatchError> {
//! let adapter = FacebookAdapter::new(reqwest::Client::new());
//! let creds = bag(&[("api_key", "token"), ("page_id", "1234")]);
//! let remote = adapter
//!     .publish("Fresh post", "https://example.com/fresh-post", &creds)
//!     .await?;
//! println!("remote id: {:?}", remote.id);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::time::Duration;

use crate::credentials::CredentialBag;
use crate::error::DispatchError;
use crate::types::Platform;

pub mod facebook;
pub mod instagram;
pub mod linkedin;
pub mod mock;
pub mod twitter;

/// Timeout applied to posting calls.
pub const POST_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout applied to credential validation calls.
pub const VALIDATE_TIMEOUT: Duration = Duration::from_secs(15);

/// Successful remote creation, as much of it as the platform reported.
#[derive(Debug, Clone)]
pub struct RemotePost {
    /// Remote object id, when the platform returned one
    pub id: Option<String>,
    /// Decoded response body for diagnostics
    pub raw: Option<serde_json::Value>,
}

/// Uniform adapter contract.
///
/// `publish` performs exactly one platform interaction per call; it never
/// retries. Precondition failures (missing page id, expired token) must be
/// reported before any network traffic.
#[async_trait]
pub trait SocialPlatform: Send + Sync {
    /// The platform this adapter serves.
    fn platform(&self) -> Platform;

    /// Whether the bag carries enough configuration to attempt a publish.
    fn is_configured(&self, credentials: &CredentialBag) -> bool;

    /// Hard character limit of the platform, if it has one.
    fn character_limit(&self) -> Option<usize> {
        None
    }

    /// Publish one message with an attached link.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] on precondition failure, transport
    /// failure, or a remote rejection.
    async fn publish(
        &self,
        message: &str,
        link: &str,
        credentials: &CredentialBag,
    ) -> Result<RemotePost, DispatchError>;
}

/// Fetch a non-empty field from the bag.
pub(crate) fn required_field<'a>(
    credentials: &'a CredentialBag,
    field: &str,
    platform: Platform,
) -> Result<&'a str, DispatchError> {
    match credentials.get(field).map(String::as_str) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(DispatchError::MissingCredentials(platform)),
    }
}
