//! Twitter credential validation endpoint

use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::app::AppState;
use libfanout::types::{Platform, ValidationResult};

/// Body of POST /validate-twitter-credentials. Fields left empty fall back
/// to the stored credentials, so the operator can test either a fresh form
/// entry or what is already saved.
#[derive(Debug, Default, Deserialize)]
pub struct ValidateTwitterRequest {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default)]
    pub bearer_token: String,
}

/// POST /validate-twitter-credentials
pub async fn validate_twitter(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ValidateTwitterRequest>,
) -> Json<ValidationResult> {
    let stored = state
        .credentials
        .get(Platform::Twitter)
        .unwrap_or_default();

    let pick = |given: String, field: &str| -> String {
        if given.trim().is_empty() {
            stored.get(field).cloned().unwrap_or_default()
        } else {
            given
        }
    };

    let api_key = pick(request.api_key, "api_key");
    let api_secret = pick(request.api_secret, "api_secret");
    let bearer_token = pick(request.bearer_token, "bearer_token");

    let result = state
        .twitter
        .validate_credentials(&api_key, &api_secret, &bearer_token)
        .await;
    Json(result)
}
