//! Content-save and immediate-dispatch endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::app::AppState;
use libfanout::schedule::ScheduleEntry;
use libfanout::types::{DispatchResult, Platform, PostContent};

/// Body of POST /posts — the content-save collaborator's payload.
#[derive(Debug, Deserialize)]
pub struct SavePostRequest {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub url: String,
    /// Requested publication time per platform, null to leave unscheduled
    #[serde(default)]
    pub schedule: BTreeMap<Platform, Option<DateTime<Utc>>>,
    /// Platforms enabled for this post
    #[serde(default)]
    pub enabled: BTreeMap<Platform, bool>,
}

/// POST /posts
///
/// Stores the content and registers one delayed trigger per enabled
/// platform with a datetime. A re-save of the same post replaces its
/// previous schedule (latest save wins).
pub async fn save_post(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SavePostRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if request.id.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "post id must not be empty"})),
        ));
    }

    state.content.upsert(PostContent {
        id: request.id.clone(),
        title: request.title,
        body: request.body,
        url: request.url,
    });

    let entry = ScheduleEntry {
        post_id: request.id.clone(),
        times: request.schedule,
        enabled: request.enabled,
    };
    let (entry, registered) = state.registry.register(entry);

    info!(post_id = %request.id, registered, "content saved");
    Ok(Json(json!({
        "ok": true,
        "registered": registered,
        "entry": entry,
    })))
}

/// POST /post-now/{platform}/{post_id}
///
/// One immediate dispatch. An unknown platform string is rejected here at
/// the edge; everything past this point works on the enum.
pub async fn post_now(
    State(state): State<Arc<AppState>>,
    Path((platform, post_id)): Path<(String, String)>,
) -> Result<Json<DispatchResult>, (StatusCode, Json<Value>)> {
    let platform: Platform = platform.parse().map_err(|e: libfanout::DispatchError| {
        warn!(error = %e, "post-now rejected");
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": e.to_string(), "kind": e.kind()})),
        )
    })?;

    let result = state.coordinator.dispatch(&post_id, platform).await;
    Ok(Json(result))
}
