use partbook::adapters::api::handlers::AppStateInner;
use partbook::adapters::api::routes::create_router;
use partbook::adapters::persistence::in_memory::InMemoryScoreStore;
use partbook::adapters::raster::pdfium::PdfiumRasterBackend;
use partbook::config::{configure_logging, AppConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    configure_logging(false);

    let config = AppConfig::from_env();
    let raster_backend = Arc::new(
        PdfiumRasterBackend::new().expect("failed to load pdfium"),
    );
    let score_store = Arc::new(InMemoryScoreStore::new(config.cache_byte_budget));
    let bind_address = config.bind_address.clone();

    let state = Arc::new(AppStateInner::new(score_store, raster_backend, config));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .unwrap_or_else(|e| panic!("failed to bind to {bind_address}: {e}"));

    log::info!("partbook backend listening on http://{bind_address}");
    axum::serve(listener, app).await.expect("server failed to start");
}
