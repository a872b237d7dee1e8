//! Shared state and router assembly

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use libfanout::config::Config;
use libfanout::content::ContentStore;
use libfanout::credentials::CredentialStore;
use libfanout::dispatch::DispatchCoordinator;
use libfanout::platforms::linkedin::LinkedinOauth;
use libfanout::platforms::twitter::TwitterAdapter;
use libfanout::schedule::TriggerRegistry;

/// Central shared state — passed as `Arc<AppState>` to all handlers.
pub struct AppState {
    pub config: Config,
    pub coordinator: Arc<DispatchCoordinator>,
    pub registry: TriggerRegistry,
    pub content: Arc<dyn ContentStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub oauth: LinkedinOauth,
    pub twitter: TwitterAdapter,
}

/// Assemble the full router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/posts", post(crate::http::posts::save_post))
        .route(
            "/post-now/{platform}/{post_id}",
            post(crate::http::posts::post_now),
        )
        .route(
            "/linkedin/callback",
            get(crate::http::oauth::linkedin_callback),
        )
        .route(
            "/validate-linkedin-credentials",
            post(crate::http::oauth::validate_linkedin),
        )
        .route(
            "/validate-twitter-credentials",
            post(crate::http::validate::validate_twitter),
        )
        .route(
            "/settings",
            get(crate::http::settings::get_settings).post(crate::http::settings::update_settings),
        )
        .route("/log", get(crate::http::diagnostics::post_log))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
