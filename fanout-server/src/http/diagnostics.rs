use axum::{extract::State, Json};
use std::sync::Arc;

use crate::app::AppState;
use libfanout::post_log::PostLogEntry;

/// GET /log — the bounded history of recent dispatch attempts, newest
/// first.
pub async fn post_log(State(state): State<Arc<AppState>>) -> Json<Vec<PostLogEntry>> {
    let mut entries = state.coordinator.log().entries();
    entries.reverse();
    Json(entries)
}
