//! Facebook page-feed adapter

use async_trait::async_trait;

use crate::credentials::CredentialBag;
use crate::error::{map_transport_error, DispatchError};
use crate::platforms::{required_field, RemotePost, SocialPlatform, POST_TIMEOUT};
use crate::types::Platform;

const GRAPH_BASE: &str = "https://graph.facebook.com";

pub struct FacebookAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl FacebookAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: GRAPH_BASE.to_string(),
        }
    }

    /// Point the adapter at a different Graph host. Test hook.
    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

/// Decide success per the feed contract: 2xx and no `error` member in the
/// decoded body. The remote post id is taken from `id` when present.
fn interpret_feed_response(
    status: u16,
    body: serde_json::Value,
) -> Result<RemotePost, DispatchError> {
    if let Some(error) = body.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown Graph API error")
            .to_string();
        return Err(DispatchError::PlatformApiError { status, message });
    }

    if !(200..300).contains(&status) {
        return Err(DispatchError::PlatformApiError {
            status,
            message: format!("feed publish rejected with status {status}"),
        });
    }

    let id = body.get("id").and_then(|v| v.as_str()).map(str::to_string);
    Ok(RemotePost {
        id,
        raw: Some(body),
    })
}

#[async_trait]
impl SocialPlatform for FacebookAdapter {
    fn platform(&self) -> Platform {
        Platform::Facebook
    }

    fn is_configured(&self, credentials: &CredentialBag) -> bool {
        required_field(credentials, "api_key", Platform::Facebook).is_ok()
            && required_field(credentials, "page_id", Platform::Facebook).is_ok()
    }

    async fn publish(
        &self,
        message: &str,
        link: &str,
        credentials: &CredentialBag,
    ) -> Result<RemotePost, DispatchError> {
        let api_key = required_field(credentials, "api_key", Platform::Facebook)?;
        let page_id = credentials
            .get("page_id")
            .map(String::as_str)
            .unwrap_or_default();
        if page_id.trim().is_empty() {
            return Err(DispatchError::MissingPageId);
        }

        let url = format!("{}/{}/feed", self.base_url, page_id);
        tracing::debug!(page_id = %page_id, "publishing to Facebook page feed");

        let response = self
            .client
            .post(&url)
            .timeout(POST_TIMEOUT)
            .form(&[
                ("message", message),
                ("link", link),
                ("access_token", api_key),
            ])
            .send()
            .await
            .map_err(|e| map_transport_error(e, "Facebook feed publish"))?;

        let status = response.status().as_u16();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| map_transport_error(e, "Facebook feed response decode"))?;

        interpret_feed_response(status, body)
    }
}
