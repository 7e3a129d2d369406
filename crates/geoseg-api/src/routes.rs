use std::sync::Arc;

use axum::{
    extract::{Path as AxumPath, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;

use geoseg_core::models::{AoiRequest, BoundingBox, Crs, ReturnFormat, SegmentRequest};
use geoseg_pipeline::metadata::{list_project_artifacts, ArtifactGroup};

use crate::error::ApiError;
use crate::state::AppState;

/// Automatic detection: an AOI with no point prompts
#[derive(Debug, Deserialize)]
pub struct AutomaticDetectRequest {
    pub project: String,
    pub id: String,
    pub bbox: BoundingBox,
    pub zoom: u32,
    #[serde(default)]
    pub crs: Crs,
    #[serde(default)]
    pub return_format: ReturnFormat,
}

impl AutomaticDetectRequest {
    fn into_segment_request(self) -> SegmentRequest {
        SegmentRequest {
            project: self.project,
            id: self.id,
            bbox: self.bbox,
            zoom: self.zoom,
            crs: self.crs,
            point_coords: None,
            point_labels: None,
            action_type: None,
            return_format: self.return_format,
        }
    }
}

/// AOI capture: a base64-encoded canvas image for a bounding box
#[derive(Debug, Deserialize)]
pub struct CaptureRequest {
    pub project: String,
    pub id: String,
    pub bbox: BoundingBox,
    pub zoom: u32,
    #[serde(default)]
    pub crs: Crs,
    /// PNG or JPEG payload, base64-encoded, data-URL prefix tolerated
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub model: ModelStatus,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ModelStatus {
    Up(geoseg_model::RuntimeHealth),
    Down { error: String },
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let files = ServeDir::new(&state.config.pipeline.data_dir);
    Router::new()
        .route("/", get(service_status))
        .route("/api/v1/segment/automatic", post(handle_automatic))
        .route("/api/v1/segment/predict", post(handle_predict))
        .route("/api/v1/aoi/capture", post(handle_capture))
        .route("/api/v1/projects/{project}/artifacts", get(handle_list_artifacts))
        .nest_service("/files", files)
        .with_state(state)
}

/// GET / - service and model runtime status
async fn service_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let model = match state.model.health().await {
        Ok(health) => ModelStatus::Up(health),
        Err(e) => ModelStatus::Down { error: e.to_string() },
    };

    Json(StatusResponse {
        service: "geoseg-api",
        version: env!("CARGO_PKG_VERSION"),
        model,
    })
}

async fn handle_automatic(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AutomaticDetectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request = request.into_segment_request();
    request.validate()?;

    tracing::info!(
        project = %request.project,
        id = %request.id,
        bbox = ?request.bbox.0,
        zoom = request.zoom,
        "Processing automatic detection request"
    );

    let response = state.driver.detect(&request).await?;
    Ok(Json(response))
}

async fn handle_predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SegmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.action_type.is_none() {
        return Err(ApiError::bad_request("Missing action_type")
            .with_details("Expected \"single_point\" or \"multi_point\""));
    }
    request.validate()?;

    tracing::info!(
        project = %request.project,
        id = %request.id,
        bbox = ?request.bbox.0,
        zoom = request.zoom,
        action = ?request.action_type,
        "Processing point-prompted segmentation request"
    );

    let response = state.driver.detect(&request).await?;
    Ok(Json(response))
}

async fn handle_capture(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CaptureRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let aoi = AoiRequest {
        project: request.project,
        id: request.id,
        bbox: request.bbox,
        zoom: request.zoom,
        crs: request.crs,
    };
    aoi.validate()?;

    let image_bytes = decode_image_payload(&request.image)
        .map_err(|e| ApiError::bad_request("Invalid image payload").with_details(e))?;

    tracing::info!(
        project = %aoi.project,
        id = %aoi.id,
        bytes = image_bytes.len(),
        "Processing AOI capture"
    );

    let outcome = state.capture.capture(&aoi, &image_bytes)?;
    Ok(Json(outcome))
}

async fn handle_list_artifacts(
    State(state): State<Arc<AppState>>,
    AxumPath(project): AxumPath<String>,
) -> Result<Json<Vec<ArtifactGroup>>, ApiError> {
    let groups = list_project_artifacts(
        &state.config.pipeline.data_dir,
        &project,
        &state.config.pipeline.base_url,
    )?;
    Ok(Json(groups))
}

/// Decode a base64 image payload, tolerating a data-URL prefix
fn decode_image_payload(payload: &str) -> Result<Vec<u8>, String> {
    let encoded = match payload.split_once(";base64,") {
        Some((_, rest)) => rest,
        None => payload,
    };
    BASE64.decode(encoded.trim()).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_base64() {
        let decoded = decode_image_payload("aGVsbG8=").unwrap();
        assert_eq!(decoded, b"hello");
    }

    #[test]
    fn test_decode_data_url() {
        let decoded = decode_image_payload("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(decoded, b"hello");
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_image_payload("%%%not-base64%%%").is_err());
    }

    #[test]
    fn test_predict_request_without_action_is_rejected() {
        let json = r#"{"project":"p","id":"a","bbox":[0.0,0.0,1.0,1.0],"zoom":10}"#;
        let request: SegmentRequest = serde_json::from_str(json).unwrap();
        assert!(request.action_type.is_none());
    }
}
