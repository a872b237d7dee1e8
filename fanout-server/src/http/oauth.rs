//! LinkedIn OAuth endpoints
//!
//! The callback is a browser interaction: every outcome, including
//! failures, becomes a redirect back to the settings screen with a query
//! indicator — never an HTTP error status the operator would see raw.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use crate::app::AppState;
use libfanout::error::{DispatchError, FanoutError};

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set when the member denied consent on the platform's screen
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Build the redirect back to the settings screen with the given query
/// indicators appended.
fn settings_redirect(state: &AppState, params: &[(&str, &str)]) -> Redirect {
    let settings_url = &state.config.server.settings_url;
    let base = if settings_url.starts_with("http") {
        settings_url.clone()
    } else {
        format!(
            "{}{}",
            state.config.server.public_url.trim_end_matches('/'),
            settings_url
        )
    };
    match reqwest::Url::parse_with_params(&base, params) {
        Ok(url) => Redirect::to(url.as_str()),
        Err(_) => Redirect::to(&base),
    }
}

/// GET /linkedin/callback?code&state
pub async fn linkedin_callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    if let Some(error) = query.error {
        let detail = query.error_description.unwrap_or(error);
        warn!(detail = %detail, "LinkedIn consent was denied");
        return settings_redirect(&state, &[("linkedin", "error"), ("reason", &detail)]);
    }

    let (code, state_param) = match (query.code, query.state) {
        (Some(code), Some(state_param)) => (code, state_param),
        _ => {
            warn!("LinkedIn callback arrived without code or state");
            return settings_redirect(
                &state,
                &[("linkedin", "error"), ("reason", "missing code or state")],
            );
        }
    };

    match state.oauth.handle_callback(&code, &state_param).await {
        Ok(_) => {
            info!("LinkedIn authorization completed");
            settings_redirect(&state, &[("linkedin", "connected")])
        }
        Err(error) => {
            warn!(error = %error, "LinkedIn authorization failed");
            settings_redirect(
                &state,
                &[("linkedin", "error"), ("reason", &error.to_string())],
            )
        }
    }
}

/// POST /validate-linkedin-credentials
///
/// With client id/secret saved, answers the authorization URL the operator
/// should visit; otherwise reports the missing credentials.
pub async fn validate_linkedin(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.oauth.authorization_url() {
        Ok(auth_url) => Ok(Json(json!({"valid": true, "auth_url": auth_url}))),
        Err(FanoutError::Dispatch(error @ DispatchError::MissingCredentials(_))) => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"valid": false, "error": error.to_string(), "kind": error.kind()})),
        )),
        Err(error) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"valid": false, "error": error.to_string()})),
        )),
    }
}
