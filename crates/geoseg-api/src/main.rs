use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geoseg_api::config::ApiConfig;
use geoseg_api::routes::create_router;
use geoseg_api::state::AppState;
use geoseg_core::ports::{MaskGenerator, PointPredictor, TileFetcher};
use geoseg_model::SamHttpClient;
use geoseg_pipeline::{AoiCapture, SegmentationDriver};
use geoseg_raster::XyzTileFetcher;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geoseg_api=info,geoseg_pipeline=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env();

    tracing::info!(
        port = config.port,
        data_dir = %config.pipeline.data_dir.display(),
        model_url = %config.model_url,
        tile_source = %config.pipeline.tile_source,
        "Starting GeoSeg API server"
    );

    std::fs::create_dir_all(&config.pipeline.data_dir)
        .expect("failed to create artifact directory");

    let model = Arc::new(SamHttpClient::new(&config.model_url));
    let fetcher: Arc<dyn TileFetcher> =
        Arc::new(XyzTileFetcher::from_source(&config.pipeline.tile_source));
    let generator: Arc<dyn MaskGenerator> = model.clone();
    let predictor: Arc<dyn PointPredictor> = model.clone();

    let driver = SegmentationDriver::new(&config.pipeline, fetcher, generator, predictor);
    let capture = AoiCapture::new(
        config.pipeline.data_dir.clone(),
        config.pipeline.base_url.clone(),
    );

    let state = Arc::new(AppState::new(driver, capture, model, config.clone()));

    let cors = if config.cors_origin == "*" {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(config.cors_origin.parse::<HeaderValue>().expect("invalid CORS origin"))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };

    let app = create_router(state).layer(TraceLayer::new_for_http()).layer(cors);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();

    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await.unwrap();
}
