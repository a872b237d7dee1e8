//! Twitter/X adapter
//!
//! Tweet composition follows the platform's link-shortening convention: a
//! fixed 23-character allowance is reserved for the link regardless of its
//! real length, plus one separator character. The message body is truncated
//! by characters (never bytes) to fit what remains, with an ellipsis marker
//! appended when anything was cut.

use async_trait::async_trait;
use serde_json::json;

use crate::credentials::CredentialBag;
use crate::error::{map_transport_error, DispatchError};
use crate::platforms::{required_field, RemotePost, SocialPlatform, POST_TIMEOUT, VALIDATE_TIMEOUT};
use crate::types::{Platform, ValidationResult};

const API_BASE: &str = "https://api.twitter.com";

/// Total tweet length budget.
pub const TWEET_LIMIT: usize = 280;

/// Characters reserved for the shortened link, per the t.co wrapping rule.
pub const SHORT_LINK_LEN: usize = 23;

const ELLIPSIS: char = '…';

/// Compose the tweet text: message, separator, link. The message portion is
/// capped at `TWEET_LIMIT - SHORT_LINK_LEN - 1` characters.
pub fn compose_tweet(message: &str, link: &str) -> String {
    let budget = TWEET_LIMIT - SHORT_LINK_LEN - 1;
    let truncated = truncate_chars(message, budget);
    format!("{truncated} {link}")
}

/// Character-bounded truncation with an ellipsis marker. The result,
/// marker included, never exceeds `budget` characters.
fn truncate_chars(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(budget.saturating_sub(1)).collect();
    // Avoid ending on whitespace before the marker
    while truncated.ends_with(char::is_whitespace) {
        truncated.pop();
    }
    truncated.push(ELLIPSIS);
    truncated
}

pub struct TwitterAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl TwitterAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: API_BASE.to_string(),
        }
    }

    /// Point the adapter at a different API host. Test hook.
    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Lightweight read-only check that the bearer token is usable.
    ///
    /// HTTP 429 maps to a distinct rate-limited outcome with retry-later
    /// guidance; any other non-200 surfaces the first entry of the body's
    /// `errors` array when present.
    pub async fn validate_credentials(
        &self,
        _api_key: &str,
        _api_secret: &str,
        bearer_token: &str,
    ) -> ValidationResult {
        if bearer_token.trim().is_empty() {
            return ValidationResult::failure(&DispatchError::MissingCredentials(
                Platform::Twitter,
            ));
        }

        let url = format!("{}/2/users/me", self.base_url);
        let response = match self
            .client
            .get(&url)
            .timeout(VALIDATE_TIMEOUT)
            .bearer_auth(bearer_token)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return ValidationResult::failure(&map_transport_error(
                    e,
                    "Twitter credential check",
                ))
            }
        };

        let status = response.status().as_u16();
        let body: serde_json::Value = response.json().await.unwrap_or(json!({}));

        match status {
            200 => ValidationResult::ok("Twitter credentials are valid"),
            429 => ValidationResult::failure(&DispatchError::RateLimited(
                "Twitter rate limit reached while validating; try again later".to_string(),
            )),
            _ => ValidationResult::failure(&DispatchError::PlatformApiError {
                status,
                message: first_error_message(&body)
                    .unwrap_or_else(|| format!("credential check rejected with status {status}")),
            }),
        }
    }
}

/// First entry of the body's `errors` array, when present.
fn first_error_message(body: &serde_json::Value) -> Option<String> {
    body.get("errors")?
        .as_array()?
        .first()?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

/// Interpret the create-tweet response: success requires exactly HTTP 201.
fn interpret_tweet_response(
    status: u16,
    body: serde_json::Value,
) -> Result<RemotePost, DispatchError> {
    if status != 201 {
        let message = body
            .get("detail")
            .and_then(|d| d.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("tweet rejected with status {status}"));
        return Err(DispatchError::PlatformApiError { status, message });
    }

    let id = body
        .get("data")
        .and_then(|d| d.get("id"))
        .and_then(|v| v.as_str())
        .map(str::to_string);
    Ok(RemotePost {
        id,
        raw: Some(body),
    })
}

#[async_trait]
impl SocialPlatform for TwitterAdapter {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    fn is_configured(&self, credentials: &CredentialBag) -> bool {
        required_field(credentials, "bearer_token", Platform::Twitter).is_ok()
    }

    fn character_limit(&self) -> Option<usize> {
        Some(TWEET_LIMIT)
    }

    async fn publish(
        &self,
        message: &str,
        link: &str,
        credentials: &CredentialBag,
    ) -> Result<RemotePost, DispatchError> {
        let bearer_token = required_field(credentials, "bearer_token", Platform::Twitter)?;
        let text = compose_tweet(message, link);

        tracing::debug!(chars = text.chars().count(), "publishing tweet");

        let response = self
            .client
            .post(format!("{}/2/tweets", self.base_url))
            .timeout(POST_TIMEOUT)
            .bearer_auth(bearer_token)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| map_transport_error(e, "tweet publish"))?;

        let status = response.status().as_u16();
        let body: serde_json::Value = response.json().await.unwrap_or(json!({}));

        interpret_tweet_response(status, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::bag;
    use serde_json::json;

    const LINK: &str = "https://example.com/p/1";

    #[test]
    fn test_compose_short_message_untouched() {
        let text = compose_tweet("Hello world", LINK);
        assert_eq!(text, format!("Hello world {LINK}"));
    }

    #[test]
    fn test_compose_exactly_at_budget_untouched() {
        let message = "a".repeat(256);
        let text = compose_tweet(&message, LINK);
        assert!(text.starts_with(&message));
        assert!(!text.contains(ELLIPSIS));
    }

    #[test]
    fn test_compose_long_message_truncated_with_ellipsis() {
        let message = "word ".repeat(100); // 500 chars
        let text = compose_tweet(&message, LINK);

        let message_part = text.strip_suffix(&format!(" {LINK}")).unwrap();
        assert!(message_part.ends_with(ELLIPSIS));
        assert!(message_part.chars().count() <= 256);

        // Budget accounting: message part + separator + reserved link allowance
        assert!(message_part.chars().count() + 1 + SHORT_LINK_LEN <= TWEET_LIMIT);
    }

    #[test]
    fn test_compose_total_length_with_short_link() {
        // With a link at or under the 23-char allowance, the literal tweet
        // also fits the 280 budget.
        let message = "x".repeat(400);
        let text = compose_tweet(&message, LINK);
        assert!(LINK.chars().count() <= SHORT_LINK_LEN);
        assert!(text.chars().count() <= TWEET_LIMIT);
    }

    #[test]
    fn test_truncation_counts_chars_not_bytes() {
        // 300 two-byte characters: byte-based truncation would slice mid-char
        let message = "é".repeat(300);
        let text = compose_tweet(&message, LINK);
        let message_part = text.strip_suffix(&format!(" {LINK}")).unwrap();
        assert_eq!(message_part.chars().count(), 256);
        assert!(message_part.ends_with(ELLIPSIS));
    }

    #[test]
    fn test_truncation_does_not_end_on_whitespace() {
        let mut message = "a".repeat(254);
        message.push_str("   tail");
        let text = compose_tweet(&message, LINK);
        let message_part = text.strip_suffix(&format!(" {LINK}")).unwrap();
        assert!(!message_part
            .trim_end_matches(ELLIPSIS)
            .ends_with(char::is_whitespace));
    }

    #[test]
    fn test_interpret_201_with_id() {
        let remote =
            interpret_tweet_response(201, json!({"data": {"id": "178", "text": "hi"}})).unwrap();
        assert_eq!(remote.id.as_deref(), Some("178"));
    }

    #[test]
    fn test_interpret_non_201_uses_detail() {
        let result = interpret_tweet_response(403, json!({"detail": "You are not permitted"}));
        match result {
            Err(DispatchError::PlatformApiError { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "You are not permitted");
            }
            _ => panic!("Expected PlatformApiError"),
        }
    }

    #[test]
    fn test_interpret_200_is_not_success() {
        // The create endpoint answers 201; anything else is a failure
        let result = interpret_tweet_response(200, json!({"data": {"id": "178"}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_first_error_message() {
        let body = json!({"errors": [{"message": "Invalid token"}, {"message": "second"}]});
        assert_eq!(first_error_message(&body).as_deref(), Some("Invalid token"));

        assert_eq!(first_error_message(&json!({})), None);
        assert_eq!(first_error_message(&json!({"errors": []})), None);
    }

    #[tokio::test]
    async fn test_publish_without_bearer_token() {
        let adapter = TwitterAdapter::new(reqwest::Client::new());
        let result = adapter.publish("msg", LINK, &bag(&[])).await;
        assert!(matches!(
            result,
            Err(DispatchError::MissingCredentials(Platform::Twitter))
        ));
    }

    #[tokio::test]
    async fn test_validate_without_bearer_token() {
        let adapter = TwitterAdapter::new(reqwest::Client::new());
        let result = adapter.validate_credentials("k", "s", "").await;
        assert!(!result.valid);
        assert_eq!(
            result.error,
            Some(crate::error::FailureKind::MissingCredentials)
        );
    }

    #[test]
    fn test_is_configured() {
        let adapter = TwitterAdapter::new(reqwest::Client::new());
        assert!(adapter.is_configured(&bag(&[("bearer_token", "tok")])));
        assert!(!adapter.is_configured(&bag(&[("api_key", "k")])));
    }
}
