//! Mock adapter for testing
//!
//! A configurable test double that can simulate successes, remote failures,
//! and latency, while counting calls and capturing published payloads. It
//! exists so coordinator and trigger tests never need credentials or network
//! access.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::credentials::CredentialBag;
use crate::error::DispatchError;
use crate::platforms::{RemotePost, SocialPlatform};
use crate::types::Platform;

/// One captured publish call.
#[derive(Debug, Clone)]
pub struct CapturedPublish {
    pub message: String,
    pub link: String,
}

pub struct MockAdapter {
    platform: Platform,
    remote_id: Option<String>,
    raw: Option<serde_json::Value>,
    error: Option<DispatchError>,
    delay: Duration,
    configured: bool,
    publish_calls: Arc<AtomicUsize>,
    published: Arc<Mutex<Vec<CapturedPublish>>>,
}

impl MockAdapter {
    /// An adapter that succeeds, returning the given remote id.
    pub fn success(platform: Platform, remote_id: &str) -> Self {
        Self {
            platform,
            remote_id: Some(remote_id.to_string()),
            raw: Some(serde_json::json!({ "id": remote_id })),
            error: None,
            delay: Duration::ZERO,
            configured: true,
            publish_calls: Arc::new(AtomicUsize::new(0)),
            published: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// An adapter that fails every publish with the given error.
    pub fn failure(platform: Platform, error: DispatchError) -> Self {
        Self {
            error: Some(error),
            remote_id: None,
            raw: None,
            ..Self::success(platform, "")
        }
    }

    /// Simulated network latency before each publish resolves.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Force `is_configured` to the given value.
    pub fn configured(mut self, configured: bool) -> Self {
        self.configured = configured;
        self
    }

    /// Handle for asserting how many publishes were attempted.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.publish_calls)
    }

    /// Handle for asserting what was published.
    pub fn captured(&self) -> Arc<Mutex<Vec<CapturedPublish>>> {
        Arc::clone(&self.published)
    }
}

#[async_trait]
impl SocialPlatform for MockAdapter {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn is_configured(&self, _credentials: &CredentialBag) -> bool {
        self.configured
    }

    async fn publish(
        &self,
        message: &str,
        link: &str,
        _credentials: &CredentialBag,
    ) -> Result<RemotePost, DispatchError> {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        self.publish_calls.fetch_add(1, Ordering::SeqCst);
        self.published
            .lock()
            .expect("mock adapter lock poisoned")
            .push(CapturedPublish {
                message: message.to_string(),
                link: link.to_string(),
            });

        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(RemotePost {
                id: self.remote_id.clone(),
                raw: self.raw.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::bag;

    #[tokio::test]
    async fn test_success_mock_returns_configured_id() {
        let mock = MockAdapter::success(Platform::Facebook, "123");
        let calls = mock.call_counter();

        let remote = mock
            .publish("hello", "https://example.com", &bag(&[]))
            .await
            .unwrap();

        assert_eq!(remote.id.as_deref(), Some("123"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_mock_returns_error() {
        let mock = MockAdapter::failure(
            Platform::Twitter,
            DispatchError::PlatformApiError {
                status: 500,
                message: "remote down".to_string(),
            },
        );

        let result = mock.publish("hello", "https://example.com", &bag(&[])).await;
        assert!(matches!(
            result,
            Err(DispatchError::PlatformApiError { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_mock_captures_payloads() {
        let mock = MockAdapter::success(Platform::Linkedin, "urn:li:share:1");
        let captured = mock.captured();

        mock.publish("first", "https://example.com/1", &bag(&[]))
            .await
            .unwrap();
        mock.publish("second", "https://example.com/2", &bag(&[]))
            .await
            .unwrap();

        let calls = captured.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].message, "first");
        assert_eq!(calls[1].link, "https://example.com/2");
    }
}
