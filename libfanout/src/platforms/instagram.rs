//! Instagram adapter
//!
//! Declared but not yet built: publishing requires the container/publish
//! two-step of the Graph media API, which this service does not implement.
//! Every publish fails with `NotImplemented` and performs no network call.

use async_trait::async_trait;

use crate::credentials::CredentialBag;
use crate::error::DispatchError;
use crate::platforms::{required_field, RemotePost, SocialPlatform};
use crate::types::Platform;

pub struct InstagramAdapter;

impl InstagramAdapter {
    pub fn new(_client: reqwest::Client) -> Self {
        Self
    }
}

#[async_trait]
impl SocialPlatform for InstagramAdapter {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    fn is_configured(&self, credentials: &CredentialBag) -> bool {
        required_field(credentials, "api_key", Platform::Instagram).is_ok()
    }

    async fn publish(
        &self,
        _message: &str,
        _link: &str,
        _credentials: &CredentialBag,
    ) -> Result<RemotePost, DispatchError> {
        Err(DispatchError::NotImplemented(
            "Instagram publishing is not implemented".to_string(),
        ))
    }
}
