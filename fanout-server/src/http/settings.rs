//! Settings endpoints
//!
//! The allow-list lives server-side in `libfanout::settings`; these
//! handlers only translate between HTTP and the store.

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::app::AppState;
use libfanout::error::FanoutError;
use libfanout::settings::{self, SettingsView};

fn internal_error(error: FanoutError) -> (StatusCode, Json<Value>) {
    warn!(error = %error, "settings operation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": error.to_string()})),
    )
}

/// GET /settings
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SettingsView>, (StatusCode, Json<Value>)> {
    settings::get_settings(state.credentials.as_ref())
        .map(Json)
        .map_err(internal_error)
}

/// POST /settings
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<Json<SettingsView>, (StatusCode, Json<Value>)> {
    match settings::update_settings(state.credentials.as_ref(), &payload) {
        Ok(view) => Ok(Json(view)),
        Err(error @ FanoutError::InvalidInput(_)) => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": error.to_string()})),
        )),
        Err(error) => Err(internal_error(error)),
    }
}
