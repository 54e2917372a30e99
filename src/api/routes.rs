use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

/// Room for multipart boundaries and text fields on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_file_size as usize + MULTIPART_OVERHEAD;

    let mut router = Router::new()
        // Ingestion and resolution
        .route(
            "/owners/:owner_id/files",
            post(handlers::store_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/owners/:owner_id/files/:file_id",
            get(handlers::locate_file),
        )
        // Internal
        .route("/_internal/replicate", post(handlers::replicate_one))
        .route("/_internal/health", get(handlers::health));

    // Test-only routes
    if state.config.test_mode {
        tracing::warn!("Test mode enabled; importance override route is available.");
        router = router.route(
            "/_internal/files/:file_id/importance",
            put(handlers::set_importance),
        );
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
