//! LinkedIn adapter and OAuth exchange
//!
//! Authorization follows the state machine
//! `Unconfigured → AuthorizationRequested → TokenObtained → (Expired)`:
//! [`LinkedinOauth::authorization_url`] issues a CSRF nonce and the consent
//! URL, [`LinkedinOauth::handle_callback`] verifies the returned `state`
//! before exchanging the code, and the obtained token is persisted into the
//! LinkedIn credential bag. A stored token past its expiry is never used;
//! the adapter falls back to the `client_credentials` grant when client
//! id/secret are configured, otherwise the caller must re-authorize.

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::json;
use std::sync::Arc;

use crate::credentials::{CredentialBag, CredentialStore};
use crate::error::{map_transport_error, DispatchError, FanoutError};
use crate::platforms::{required_field, RemotePost, SocialPlatform, POST_TIMEOUT};
use crate::types::{OAuthToken, Platform};

const API_BASE: &str = "https://api.linkedin.com";
const OAUTH_BASE: &str = "https://www.linkedin.com/oauth/v2";

/// OAuth scope requested on the consent screen. The OpenID variant is used
/// so the callback can resolve the member urn from `/v2/userinfo`.
pub const OAUTH_SCOPE: &str = "openid profile w_member_social";

/// Global credential-store key holding the last issued CSRF nonce.
pub const OAUTH_STATE_KEY: &str = "linkedin_oauth_state";

/// Share one pair of endpoint hosts between the adapter and the exchange.
#[derive(Clone)]
struct Endpoints {
    api_base: String,
    oauth_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_base: API_BASE.to_string(),
            oauth_base: OAUTH_BASE.to_string(),
        }
    }
}

/// Decoded token endpoint response.
#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

fn interpret_token_response(
    status: u16,
    body: serde_json::Value,
) -> Result<OAuthToken, DispatchError> {
    if (200..300).contains(&status) {
        if let Ok(token) = serde_json::from_value::<TokenResponse>(body.clone()) {
            return Ok(OAuthToken::from_expires_in(
                token.access_token,
                token.expires_in,
                Utc::now(),
            ));
        }
    }
    let message = body
        .get("error_description")
        .or_else(|| body.get("error"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("token exchange rejected with status {status}"));
    Err(DispatchError::PlatformApiError { status, message })
}

/// Exchange an authorization code for an access token.
async fn exchange_authorization_code(
    client: &reqwest::Client,
    oauth_base: &str,
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> Result<OAuthToken, DispatchError> {
    let response = client
        .post(format!("{oauth_base}/accessToken"))
        .timeout(POST_TIMEOUT)
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", redirect_uri),
        ])
        .send()
        .await
        .map_err(|e| map_transport_error(e, "LinkedIn code exchange"))?;

    let status = response.status().as_u16();
    let body: serde_json::Value = response.json().await.unwrap_or(json!({}));
    interpret_token_response(status, body)
}

/// Obtain a token via the `client_credentials` grant, authenticating the
/// application with HTTP Basic.
async fn exchange_client_credentials(
    client: &reqwest::Client,
    oauth_base: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<OAuthToken, DispatchError> {
    let basic = base64::engine::general_purpose::STANDARD
        .encode(format!("{client_id}:{client_secret}"));

    let response = client
        .post(format!("{oauth_base}/accessToken"))
        .timeout(POST_TIMEOUT)
        .header("Authorization", format!("Basic {basic}"))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await
        .map_err(|e| map_transport_error(e, "LinkedIn client-credentials exchange"))?;

    let status = response.status().as_u16();
    let body: serde_json::Value = response.json().await.unwrap_or(json!({}));
    interpret_token_response(status, body)
}

/// Build the user-generated-content payload: commentary plus one attached
/// article, published publicly.
fn build_ugc_payload(author_urn: &str, message: &str, link: &str) -> serde_json::Value {
    json!({
        "author": author_urn,
        "lifecycleState": "PUBLISHED",
        "specificContent": {
            "com.linkedin.ugc.ShareContent": {
                "shareCommentary": { "text": message },
                "shareMediaCategory": "ARTICLE",
                "media": [
                    {
                        "status": "READY",
                        "originalUrl": link
                    }
                ]
            }
        },
        "visibility": {
            "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC"
        }
    })
}

/// Success is the presence of a created-object id in the response.
fn interpret_ugc_response(
    status: u16,
    body: serde_json::Value,
) -> Result<RemotePost, DispatchError> {
    match body.get("id").and_then(|v| v.as_str()) {
        Some(id) => Ok(RemotePost {
            id: Some(id.to_string()),
            raw: Some(body),
        }),
        None => {
            let message = body
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("UGC post rejected with status {status}"));
            Err(DispatchError::PlatformApiError { status, message })
        }
    }
}

/// Read a stored, still-valid token out of the bag. An expired or
/// unparsable expiry means the token is unusable.
fn stored_token(credentials: &CredentialBag, now: DateTime<Utc>) -> Option<String> {
    let token = credentials.get("access_token")?;
    if token.trim().is_empty() {
        return None;
    }
    let expires = credentials.get("access_token_expires")?;
    let expires_at = DateTime::parse_from_rfc3339(expires).ok()?.with_timezone(&Utc);
    if now >= expires_at {
        tracing::warn!("stored LinkedIn access token is expired");
        return None;
    }
    Some(token.clone())
}

pub struct LinkedinAdapter {
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl LinkedinAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            endpoints: Endpoints::default(),
        }
    }

    /// Point the adapter at different API/OAuth hosts. Test hook.
    pub fn with_base_urls(
        client: reqwest::Client,
        api_base: impl Into<String>,
        oauth_base: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoints: Endpoints {
                api_base: api_base.into(),
                oauth_base: oauth_base.into(),
            },
        }
    }

    /// Pick the bearer token for a publish: a stored unexpired user token
    /// wins; otherwise the client-credentials grant when the application
    /// credentials are configured.
    async fn resolve_token(&self, credentials: &CredentialBag) -> Result<String, DispatchError> {
        if let Some(token) = stored_token(credentials, Utc::now()) {
            return Ok(token);
        }

        let client_id = credentials.get("client_id").map(String::as_str);
        let client_secret = credentials.get("client_secret").map(String::as_str);
        match (client_id, client_secret) {
            (Some(id), Some(secret)) if !id.trim().is_empty() && !secret.trim().is_empty() => {
                let token =
                    exchange_client_credentials(&self.client, &self.endpoints.oauth_base, id, secret)
                        .await?;
                Ok(token.access_token)
            }
            _ => Err(DispatchError::MissingCredentials(Platform::Linkedin)),
        }
    }

    /// Resolve the author urn: the bag's `member_urn` when present, else a
    /// `/v2/userinfo` lookup with the bearer token.
    async fn resolve_author(
        &self,
        credentials: &CredentialBag,
        bearer: &str,
    ) -> Result<String, DispatchError> {
        if let Some(urn) = credentials.get("member_urn") {
            if !urn.trim().is_empty() {
                return Ok(urn.clone());
            }
        }

        let response = self
            .client
            .get(format!("{}/v2/userinfo", self.endpoints.api_base))
            .timeout(POST_TIMEOUT)
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| map_transport_error(e, "LinkedIn userinfo lookup"))?;

        let status = response.status().as_u16();
        let body: serde_json::Value = response.json().await.unwrap_or(json!({}));
        match body.get("sub").and_then(|v| v.as_str()) {
            Some(sub) => Ok(format!("urn:li:person:{sub}")),
            None => Err(DispatchError::PlatformApiError {
                status,
                message: "could not resolve the posting author".to_string(),
            }),
        }
    }
}

#[async_trait]
impl SocialPlatform for LinkedinAdapter {
    fn platform(&self) -> Platform {
        Platform::Linkedin
    }

    fn is_configured(&self, credentials: &CredentialBag) -> bool {
        stored_token(credentials, Utc::now()).is_some()
            || (required_field(credentials, "client_id", Platform::Linkedin).is_ok()
                && required_field(credentials, "client_secret", Platform::Linkedin).is_ok())
    }

    async fn publish(
        &self,
        message: &str,
        link: &str,
        credentials: &CredentialBag,
    ) -> Result<RemotePost, DispatchError> {
        let bearer = self.resolve_token(credentials).await?;
        let author = self.resolve_author(credentials, &bearer).await?;
        let payload = build_ugc_payload(&author, message, link);

        tracing::debug!(author = %author, "publishing LinkedIn UGC post");

        let response = self
            .client
            .post(format!("{}/v2/ugcPosts", self.endpoints.api_base))
            .timeout(POST_TIMEOUT)
            .bearer_auth(&bearer)
            .header("X-Restli-Protocol-Version", "2.0.0")
            .json(&payload)
            .send()
            .await
            .map_err(|e| map_transport_error(e, "LinkedIn UGC publish"))?;

        let status = response.status().as_u16();
        let body: serde_json::Value = response.json().await.unwrap_or(json!({}));
        interpret_ugc_response(status, body)
    }
}

/// Web-flow OAuth exchange: consent URL issuance and callback handling.
///
/// Holds the credential store so the issued nonce and the obtained token are
/// persisted where the dispatch path reads them.
pub struct LinkedinOauth {
    client: reqwest::Client,
    store: Arc<dyn CredentialStore>,
    redirect_uri: String,
    endpoints: Endpoints,
}

impl LinkedinOauth {
    pub fn new(
        client: reqwest::Client,
        store: Arc<dyn CredentialStore>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client,
            store,
            redirect_uri: redirect_uri.into(),
            endpoints: Endpoints::default(),
        }
    }

    /// Override the endpoint hosts. Test hook.
    pub fn with_base_urls(
        mut self,
        api_base: impl Into<String>,
        oauth_base: impl Into<String>,
    ) -> Self {
        self.endpoints = Endpoints {
            api_base: api_base.into(),
            oauth_base: oauth_base.into(),
        };
        self
    }

    /// Issue the consent URL, persisting a fresh CSRF nonce.
    ///
    /// # Errors
    ///
    /// Fails with `MissingCredentials` when no client id/secret are saved
    /// (the `Unconfigured` state).
    pub fn authorization_url(&self) -> Result<String, FanoutError> {
        let bag = self.store.get(Platform::Linkedin)?;
        let client_id = required_field(&bag, "client_id", Platform::Linkedin)?;
        required_field(&bag, "client_secret", Platform::Linkedin)?;

        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        self.store
            .set_global(OAUTH_STATE_KEY, Some(nonce.clone()))?;

        let url = reqwest::Url::parse_with_params(
            &format!("{}/authorization", self.endpoints.oauth_base),
            &[
                ("response_type", "code"),
                ("client_id", client_id),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("state", nonce.as_str()),
                ("scope", OAUTH_SCOPE),
            ],
        )
        .map_err(|e| DispatchError::TransportError(format!("invalid authorization URL: {e}")))?;

        Ok(url.to_string())
    }

    /// Handle the browser callback: verify the CSRF nonce, exchange the
    /// code, persist the token (and the member urn when resolvable).
    ///
    /// # Errors
    ///
    /// `InvalidState` when `state` does not match the issued nonce; no token
    /// exchange is attempted in that case.
    pub async fn handle_callback(
        &self,
        code: &str,
        state: &str,
    ) -> Result<OAuthToken, FanoutError> {
        let issued = self.store.get_global(OAUTH_STATE_KEY)?;
        match issued {
            Some(expected) if expected == state => {}
            _ => {
                tracing::warn!("LinkedIn callback arrived with a mismatched state parameter");
                return Err(DispatchError::InvalidState.into());
            }
        }
        // Nonce is single-use
        self.store.set_global(OAUTH_STATE_KEY, None)?;

        let bag = self.store.get(Platform::Linkedin)?;
        let client_id = required_field(&bag, "client_id", Platform::Linkedin)?.to_string();
        let client_secret = required_field(&bag, "client_secret", Platform::Linkedin)?.to_string();

        let token = exchange_authorization_code(
            &self.client,
            &self.endpoints.oauth_base,
            &client_id,
            &client_secret,
            code,
            &self.redirect_uri,
        )
        .await?;

        let mut updates = CredentialBag::new();
        updates.insert("access_token".to_string(), token.access_token.clone());
        updates.insert(
            "access_token_expires".to_string(),
            token.expires_at.to_rfc3339(),
        );
        if let Some(urn) = self.lookup_member_urn(&token.access_token).await {
            updates.insert("member_urn".to_string(), urn);
        }
        self.store.merge(Platform::Linkedin, updates)?;

        tracing::info!("LinkedIn access token obtained and stored");
        Ok(token)
    }

    /// Best-effort author lookup right after the exchange; a publish can
    /// still resolve it later if this fails.
    async fn lookup_member_urn(&self, bearer: &str) -> Option<String> {
        let response = self
            .client
            .get(format!("{}/v2/userinfo", self.endpoints.api_base))
            .timeout(POST_TIMEOUT)
            .bearer_auth(bearer)
            .send()
            .await
            .ok()?;
        let body: serde_json::Value = response.json().await.ok()?;
        let sub = body.get("sub")?.as_str()?;
        Some(format!("urn:li:person:{sub}"))
    }
}
