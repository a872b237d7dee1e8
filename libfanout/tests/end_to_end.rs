//! End-to-end workflow tests for the fan-out pipeline
//!
//! These tests wire the coordinator, trigger registry, and stores together
//! with mock adapters and verify complete workflows: content-save through
//! trigger fire through logged result, without credentials or network.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use libfanout::content::{ContentStore, MemoryContentStore};
use libfanout::credentials::{bag, CredentialStore, MemoryCredentialStore};
use libfanout::dispatch::{AdapterSet, DispatchCoordinator};
use libfanout::error::{DispatchError, FailureKind};
use libfanout::platforms::mock::MockAdapter;
use libfanout::post_log::{PostLog, POST_LOG_CAPACITY};
use libfanout::schedule::{ScheduleEntry, TriggerRegistry};
use libfanout::types::{Platform, PostContent};

fn sample_content(id: &str) -> PostContent {
    PostContent {
        id: id.to_string(),
        title: "Launch day".to_string(),
        body: "We are live. Read the full announcement for details.".to_string(),
        url: format!("https://example.com/{id}"),
    }
}

struct Harness {
    coordinator: Arc<DispatchCoordinator>,
    content: Arc<MemoryContentStore>,
    credentials: Arc<MemoryCredentialStore>,
}

fn harness(adapters: Vec<Box<dyn libfanout::platforms::SocialPlatform>>) -> Harness {
    let content = Arc::new(MemoryContentStore::new());
    let credentials = Arc::new(MemoryCredentialStore::new());
    let coordinator = Arc::new(DispatchCoordinator::new(
        content.clone(),
        credentials.clone(),
        AdapterSet::custom(adapters),
        Arc::new(PostLog::default()),
    ));
    Harness {
        coordinator,
        content,
        credentials,
    }
}

#[tokio::test]
async fn test_scheduled_facebook_post_fires_once() -> anyhow::Result<()> {
    let adapter = MockAdapter::success(Platform::Facebook, "123");
    let calls = adapter.call_counter();
    let h = harness(vec![Box::new(adapter)]);

    h.content.upsert(sample_content("42"));
    h.credentials.set(
        Platform::Facebook,
        bag(&[("api_key", "token"), ("page_id", "99")]),
    )?;

    let registry = TriggerRegistry::new(h.coordinator.clone());
    let entry = ScheduleEntry::new("42")
        .with_time(Platform::Facebook, Utc::now() + chrono::Duration::milliseconds(50))
        .with_enabled(Platform::Facebook, true);

    let (_, armed) = registry.register(entry);
    assert_eq!(armed, 1, "exactly one trigger for one enabled platform");

    // Wait for the trigger to fire
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let entries = h.coordinator.log().entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].success);
    assert_eq!(entries[0].remote_id.as_deref(), Some("123"));
    assert_eq!(entries[0].platform, Platform::Facebook);
    Ok(())
}

#[tokio::test]
async fn test_disabled_platform_gets_no_trigger_and_no_datetime() {
    let adapter = MockAdapter::success(Platform::Facebook, "123");
    let calls = adapter.call_counter();
    let h = harness(vec![Box::new(adapter)]);
    h.content.upsert(sample_content("42"));

    let registry = TriggerRegistry::new(h.coordinator.clone());
    let entry = ScheduleEntry::new("42")
        .with_time(Platform::Facebook, Utc::now() + chrono::Duration::milliseconds(20))
        .with_enabled(Platform::Facebook, false);

    let (normalized, armed) = registry.register(entry);

    assert_eq!(armed, 0);
    // Disabling clears the stored datetime
    assert_eq!(normalized.times.get(&Platform::Facebook), Some(&None));
    assert_eq!(
        registry.entry("42").unwrap().times.get(&Platform::Facebook),
        Some(&None)
    );

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_latest_save_wins_cancels_pending_triggers() {
    let adapter = MockAdapter::success(Platform::Twitter, "1");
    let calls = adapter.call_counter();
    let h = harness(vec![Box::new(adapter)]);

    h.content.upsert(sample_content("42"));
    h.credentials
        .set(Platform::Twitter, bag(&[("bearer_token", "tok")]))
        .unwrap();

    let registry = TriggerRegistry::new(h.coordinator.clone());

    // First save schedules far out; second save (before the first fires)
    // replaces it with a near schedule.
    registry.register(
        ScheduleEntry::new("42")
            .with_time(Platform::Twitter, Utc::now() + chrono::Duration::hours(1))
            .with_enabled(Platform::Twitter, true),
    );
    registry.register(
        ScheduleEntry::new("42")
            .with_time(Platform::Twitter, Utc::now() + chrono::Duration::milliseconds(50))
            .with_enabled(Platform::Twitter, true),
    );

    tokio::time::sleep(Duration::from_millis(300)).await;

    // Only the second registration fired
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_multiple_platforms_one_trigger_each() {
    let facebook = MockAdapter::success(Platform::Facebook, "fb-1");
    let twitter = MockAdapter::success(Platform::Twitter, "tw-1");
    let fb_calls = facebook.call_counter();
    let tw_calls = twitter.call_counter();
    let h = harness(vec![Box::new(facebook), Box::new(twitter)]);

    h.content.upsert(sample_content("42"));
    h.credentials
        .set(Platform::Facebook, bag(&[("api_key", "k"), ("page_id", "p")]))
        .unwrap();
    h.credentials
        .set(Platform::Twitter, bag(&[("bearer_token", "tok")]))
        .unwrap();

    let registry = TriggerRegistry::new(h.coordinator.clone());
    let soon = Utc::now() + chrono::Duration::milliseconds(30);
    let (_, armed) = registry.register(
        ScheduleEntry::new("42")
            .with_time(Platform::Facebook, soon)
            .with_enabled(Platform::Facebook, true)
            .with_time(Platform::Twitter, soon)
            .with_enabled(Platform::Twitter, true)
            .with_time(Platform::Linkedin, soon)
            .with_enabled(Platform::Linkedin, false),
    );

    assert_eq!(armed, 2);
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(fb_calls.load(Ordering::SeqCst), 1);
    assert_eq!(tw_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.coordinator.log().len(), 2);
}

#[tokio::test]
async fn test_cancel_stops_pending_trigger() {
    let adapter = MockAdapter::success(Platform::Facebook, "123");
    let calls = adapter.call_counter();
    let h = harness(vec![Box::new(adapter)]);

    h.content.upsert(sample_content("42"));
    h.credentials
        .set(Platform::Facebook, bag(&[("api_key", "k"), ("page_id", "p")]))
        .unwrap();

    let registry = TriggerRegistry::new(h.coordinator.clone());
    registry.register(
        ScheduleEntry::new("42")
            .with_time(Platform::Facebook, Utc::now() + chrono::Duration::milliseconds(100))
            .with_enabled(Platform::Facebook, true),
    );
    registry.cancel("42");

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(registry.entry("42").is_none());
}

#[tokio::test]
async fn test_past_datetime_fires_immediately() {
    let adapter = MockAdapter::success(Platform::Facebook, "123");
    let calls = adapter.call_counter();
    let h = harness(vec![Box::new(adapter)]);

    h.content.upsert(sample_content("42"));
    h.credentials
        .set(Platform::Facebook, bag(&[("api_key", "k"), ("page_id", "p")]))
        .unwrap();

    let registry = TriggerRegistry::new(h.coordinator.clone());
    registry.register(
        ScheduleEntry::new("42")
            .with_time(Platform::Facebook, Utc::now() - chrono::Duration::minutes(5))
            .with_enabled(Platform::Facebook, true),
    );

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_trigger_failure_never_escapes_and_is_logged() {
    let adapter = MockAdapter::failure(
        Platform::Twitter,
        DispatchError::PlatformApiError {
            status: 500,
            message: "remote down".to_string(),
        },
    );
    let h = harness(vec![Box::new(adapter)]);

    h.content.upsert(sample_content("42"));
    h.credentials
        .set(Platform::Twitter, bag(&[("bearer_token", "tok")]))
        .unwrap();

    let registry = TriggerRegistry::new(h.coordinator.clone());
    registry.register(
        ScheduleEntry::new("42")
            .with_time(Platform::Twitter, Utc::now() + chrono::Duration::milliseconds(20))
            .with_enabled(Platform::Twitter, true),
    );

    tokio::time::sleep(Duration::from_millis(200)).await;

    let entries = h.coordinator.log().entries();
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].success);
    assert_eq!(entries[0].error, Some(FailureKind::PlatformApiError));
}

#[tokio::test]
async fn test_concurrent_dispatches_all_logged() {
    let facebook = MockAdapter::success(Platform::Facebook, "fb").with_delay(Duration::from_millis(30));
    let twitter = MockAdapter::success(Platform::Twitter, "tw").with_delay(Duration::from_millis(30));
    let h = harness(vec![Box::new(facebook), Box::new(twitter)]);

    h.credentials
        .set(Platform::Facebook, bag(&[("api_key", "k"), ("page_id", "p")]))
        .unwrap();
    h.credentials
        .set(Platform::Twitter, bag(&[("bearer_token", "tok")]))
        .unwrap();
    for i in 0..10 {
        h.content.upsert(sample_content(&i.to_string()));
    }

    let mut tasks = Vec::new();
    for i in 0..10 {
        let coordinator = h.coordinator.clone();
        let platform = if i % 2 == 0 {
            Platform::Facebook
        } else {
            Platform::Twitter
        };
        let post_id = i.to_string();
        tasks.push(tokio::spawn(async move {
            coordinator.dispatch(&post_id, platform).await
        }));
    }
    for task in tasks {
        assert!(task.await.unwrap().success);
    }

    assert_eq!(h.coordinator.log().len(), 10);
}

#[tokio::test]
async fn test_post_log_cap_holds_under_load() {
    let adapter = MockAdapter::success(Platform::Facebook, "1");
    let h = harness(vec![Box::new(adapter)]);

    h.credentials
        .set(Platform::Facebook, bag(&[("api_key", "k"), ("page_id", "p")]))
        .unwrap();
    h.content.upsert(sample_content("42"));

    for _ in 0..(POST_LOG_CAPACITY + 10) {
        h.coordinator.dispatch("42", Platform::Facebook).await;
    }

    assert_eq!(h.coordinator.log().len(), POST_LOG_CAPACITY);
}
