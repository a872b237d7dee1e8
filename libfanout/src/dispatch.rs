//! Dispatch coordination
//!
//! The coordinator is the callback target of the delayed-trigger
//! collaborator: given a post id and a platform it loads credentials,
//! builds the normalized message, invokes the matching adapter, and folds
//! every outcome into a [`DispatchResult`]. It never raises an error to the
//! trigger — that collaborator has no failure-handling contract — and it
//! appends exactly one [`PostLog`] entry per invocation, success or failure.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::content::ContentStore;
use crate::credentials::{is_empty_bag, CredentialStore};
use crate::error::DispatchError;
use crate::platforms::{
    facebook::FacebookAdapter, instagram::InstagramAdapter, linkedin::LinkedinAdapter,
    twitter::TwitterAdapter, SocialPlatform,
};
use crate::post_log::{PostLog, PostLogEntry};
use crate::types::{DispatchResult, Platform, PostContent};

/// Number of words kept in the message excerpt.
pub const EXCERPT_WORDS: usize = 30;

/// Word-bounded truncation of the body, with an ellipsis when anything was
/// cut. Splits on whitespace, never mid-word and never mid-character.
pub fn trim_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return words.join(" ");
    }
    let mut trimmed = words[..max_words].join(" ");
    trimmed.push('…');
    trimmed
}

/// The normalized message: title, blank line, word-bounded excerpt.
pub fn build_message(content: &PostContent) -> String {
    let excerpt = trim_words(&content.body, EXCERPT_WORDS);
    if excerpt.is_empty() {
        content.title.clone()
    } else {
        format!("{}\n\n{}", content.title, excerpt)
    }
}

/// The set of adapters the coordinator can dispatch to, one per platform.
pub struct AdapterSet {
    adapters: HashMap<Platform, Box<dyn SocialPlatform>>,
}

impl AdapterSet {
    /// The production set: all four platform adapters over one HTTP client.
    pub fn standard(client: &reqwest::Client) -> Self {
        Self::custom(vec![
            Box::new(FacebookAdapter::new(client.clone())),
            Box::new(TwitterAdapter::new(client.clone())),
            Box::new(LinkedinAdapter::new(client.clone())),
            Box::new(InstagramAdapter::new(client.clone())),
        ])
    }

    /// Build a set from explicit adapters. Used by tests to substitute
    /// mocks; the last adapter wins for a duplicated platform.
    pub fn custom(adapters: Vec<Box<dyn SocialPlatform>>) -> Self {
        Self {
            adapters: adapters
                .into_iter()
                .map(|adapter| (adapter.platform(), adapter))
                .collect(),
        }
    }

    pub fn get(&self, platform: Platform) -> Option<&dyn SocialPlatform> {
        self.adapters.get(&platform).map(Box::as_ref)
    }
}

/// Orchestrates single dispatch attempts.
pub struct DispatchCoordinator {
    content: Arc<dyn ContentStore>,
    credentials: Arc<dyn CredentialStore>,
    adapters: AdapterSet,
    log: Arc<PostLog>,
}

impl DispatchCoordinator {
    pub fn new(
        content: Arc<dyn ContentStore>,
        credentials: Arc<dyn CredentialStore>,
        adapters: AdapterSet,
        log: Arc<PostLog>,
    ) -> Self {
        Self {
            content,
            credentials,
            adapters,
            log,
        }
    }

    pub fn log(&self) -> &PostLog {
        &self.log
    }

    /// Dispatch one post to one platform.
    ///
    /// A single attempt, no retries: a duplicate trigger fire produces a
    /// fresh outbound post. Failures come back as `success == false`
    /// results; nothing escapes as an error.
    pub async fn dispatch(&self, post_id: &str, platform: Platform) -> DispatchResult {
        let result = self.attempt(post_id, platform).await;
        let result = match result {
            Ok(result) => result,
            Err(error) => {
                warn!(post_id = %post_id, platform = %platform, error = %error, "dispatch failed");
                DispatchResult::failure(platform, &error)
            }
        };

        if result.success {
            info!(
                post_id = %post_id,
                platform = %platform,
                remote_id = result.remote_id.as_deref().unwrap_or("-"),
                "dispatch succeeded"
            );
        }

        self.log.append(PostLogEntry::from_result(post_id, &result));
        result
    }

    async fn attempt(
        &self,
        post_id: &str,
        platform: Platform,
    ) -> Result<DispatchResult, DispatchError> {
        let content = self
            .content
            .get(post_id)
            .ok_or_else(|| DispatchError::UnknownPost(post_id.to_string()))?;

        // Credentials must be present before any network traffic
        let credentials = self
            .credentials
            .get(platform)
            .map_err(|e| DispatchError::TransportError(format!("credential store: {e}")))?;
        if is_empty_bag(&credentials) {
            return Err(DispatchError::MissingCredentials(platform));
        }

        let adapter = self
            .adapters
            .get(platform)
            .ok_or_else(|| DispatchError::InvalidPlatform(platform.to_string()))?;

        let message = build_message(&content);
        let remote = adapter.publish(&message, &content.url, &credentials).await?;

        Ok(DispatchResult::ok(platform, remote.id, remote.raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MemoryContentStore;
    use crate::credentials::{bag, MemoryCredentialStore};
    use crate::error::FailureKind;
    use crate::platforms::mock::MockAdapter;
    use std::sync::atomic::Ordering;

    fn content(id: &str, body: &str) -> PostContent {
        PostContent {
            id: id.to_string(),
            title: "A headline".to_string(),
            body: body.to_string(),
            url: format!("https://example.com/{id}"),
        }
    }

    fn coordinator_with(
        adapter: MockAdapter,
        credentials: MemoryCredentialStore,
    ) -> (DispatchCoordinator, Arc<MemoryContentStore>) {
        let content_store = Arc::new(MemoryContentStore::new());
        let coordinator = DispatchCoordinator::new(
            content_store.clone(),
            Arc::new(credentials),
            AdapterSet::custom(vec![Box::new(adapter)]),
            Arc::new(PostLog::default()),
        );
        (coordinator, content_store)
    }

    #[test]
    fn test_trim_words_short_text_untouched() {
        assert_eq!(trim_words("one two three", 30), "one two three");
    }

    #[test]
    fn test_trim_words_bounds_on_words_not_bytes() {
        let body = (0..40).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let trimmed = trim_words(&body, 30);

        assert!(trimmed.ends_with('…'));
        assert_eq!(trimmed.trim_end_matches('…').split_whitespace().count(), 30);
        // No partial word survives
        assert!(!trimmed.contains("w30"));
    }

    #[test]
    fn test_trim_words_collapses_whitespace() {
        assert_eq!(trim_words("a   b\n\nc", 30), "a b c");
    }

    #[test]
    fn test_build_message_title_excerpt_and_blank_line() {
        let message = build_message(&content("1", "short body"));
        assert_eq!(message, "A headline\n\nshort body");

        let empty_body = build_message(&content("1", "   "));
        assert_eq!(empty_body, "A headline");
    }

    #[tokio::test]
    async fn test_dispatch_success_records_remote_id() {
        let adapter = MockAdapter::success(Platform::Facebook, "123");
        let store = MemoryCredentialStore::new();
        store
            .set(Platform::Facebook, bag(&[("api_key", "k"), ("page_id", "p")]))
            .unwrap();
        let (coordinator, content_store) = coordinator_with(adapter, store);
        content_store.upsert(content("42", "body"));

        let result = coordinator.dispatch("42", Platform::Facebook).await;

        assert!(result.success);
        assert_eq!(result.remote_id.as_deref(), Some("123"));
        assert_eq!(coordinator.log().len(), 1);
        assert!(coordinator.log().entries()[0].success);
    }

    #[tokio::test]
    async fn test_dispatch_missing_credentials_makes_no_call() {
        let adapter = MockAdapter::success(Platform::Twitter, "1");
        let calls = adapter.call_counter();
        let (coordinator, content_store) = coordinator_with(adapter, MemoryCredentialStore::new());
        content_store.upsert(content("42", "body"));

        let result = coordinator.dispatch("42", Platform::Twitter).await;

        assert!(!result.success);
        assert_eq!(result.error, Some(FailureKind::MissingCredentials));
        assert_eq!(calls.load(Ordering::SeqCst), 0, "no HTTP call may happen");
    }

    #[tokio::test]
    async fn test_dispatch_blank_credentials_count_as_missing() {
        let adapter = MockAdapter::success(Platform::Twitter, "1");
        let calls = adapter.call_counter();
        let store = MemoryCredentialStore::new();
        store
            .set(Platform::Twitter, bag(&[("bearer_token", "   ")]))
            .unwrap();
        let (coordinator, content_store) = coordinator_with(adapter, store);
        content_store.upsert(content("42", "body"));

        let result = coordinator.dispatch("42", Platform::Twitter).await;

        assert_eq!(result.error, Some(FailureKind::MissingCredentials));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_post() {
        let adapter = MockAdapter::success(Platform::Facebook, "1");
        let calls = adapter.call_counter();
        let store = MemoryCredentialStore::new();
        store
            .set(Platform::Facebook, bag(&[("api_key", "k")]))
            .unwrap();
        let (coordinator, _content_store) = coordinator_with(adapter, store);

        let result = coordinator.dispatch("missing", Platform::Facebook).await;

        assert!(!result.success);
        assert_eq!(result.error, Some(FailureKind::UnknownPost));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        // Failures are logged too
        assert_eq!(coordinator.log().len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_adapter_failure_normalized() {
        let adapter = MockAdapter::failure(
            Platform::Linkedin,
            DispatchError::PlatformApiError {
                status: 401,
                message: "Invalid access token".to_string(),
            },
        );
        let store = MemoryCredentialStore::new();
        store
            .set(Platform::Linkedin, bag(&[("client_id", "c"), ("client_secret", "s")]))
            .unwrap();
        let (coordinator, content_store) = coordinator_with(adapter, store);
        content_store.upsert(content("42", "body"));

        let result = coordinator.dispatch("42", Platform::Linkedin).await;

        assert!(!result.success);
        assert_eq!(result.error, Some(FailureKind::PlatformApiError));
        assert!(result.message.contains("Invalid access token"));
    }

    #[tokio::test]
    async fn test_dispatch_passes_built_message_and_link() {
        let adapter = MockAdapter::success(Platform::Facebook, "1");
        let captured = adapter.captured();
        let store = MemoryCredentialStore::new();
        store
            .set(Platform::Facebook, bag(&[("api_key", "k"), ("page_id", "p")]))
            .unwrap();
        let (coordinator, content_store) = coordinator_with(adapter, store);

        let body = (0..40).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        content_store.upsert(content("42", &body));

        coordinator.dispatch("42", Platform::Facebook).await;

        let calls = captured.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].message.starts_with("A headline\n\n"));
        assert!(calls[0].message.ends_with('…'));
        assert_eq!(calls[0].link, "https://example.com/42");
    }

    #[tokio::test]
    async fn test_duplicate_dispatch_produces_two_posts() {
        let adapter = MockAdapter::success(Platform::Facebook, "1");
        let calls = adapter.call_counter();
        let store = MemoryCredentialStore::new();
        store
            .set(Platform::Facebook, bag(&[("api_key", "k"), ("page_id", "p")]))
            .unwrap();
        let (coordinator, content_store) = coordinator_with(adapter, store);
        content_store.upsert(content("42", "body"));

        coordinator.dispatch("42", Platform::Facebook).await;
        coordinator.dispatch("42", Platform::Facebook).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(coordinator.log().len(), 2);
    }
}
