use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, create_score, detect_staves, generate_parts, get_page_raster, get_part_pdf,
    partition_score,
};

/// Create the main application router with all API routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/scores", post(create_score))
        .route("/api/v1/scores/:score_id/pages/:page_index/raster", get(get_page_raster))
        .route("/api/v1/scores/:score_id/pages/:page_index/detect", get(detect_staves))
        .route("/api/v1/scores/:score_id/partition", post(partition_score))
        .route("/api/v1/scores/:score_id/generate", post(generate_parts))
        .route("/api/v1/scores/:score_id/parts/:part_name/pdf", get(get_part_pdf))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
