//! HTTP client for the sidecar segmentation model service.
//!
//! The model runtime (SAM automatic generator and point predictor) runs as
//! a separate process owning the GPU; this client drives it over a small
//! JSON API. Paths are exchanged, not pixels: both processes share the
//! artifact filesystem.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use geoseg_core::error::{GeosegError, Result};
use geoseg_core::models::Crs;
use geoseg_core::ports::{MaskGenerator, PointPredictor};

/// Client for one model service instance.
pub struct SamHttpClient {
    /// Base URL for the model service (e.g. "http://localhost:8500")
    base_url: String,
    client: reqwest::Client,
}

impl SamHttpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create with the default localhost URL
    pub fn localhost() -> Self {
        Self::new("http://localhost:8500")
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Probe the model service; used by the status endpoint.
    pub async fn health(&self) -> Result<RuntimeHealth> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| self.unreachable("health", e))?;

        if !response.status().is_success() {
            return Err(GeosegError::ModelRuntime {
                operation: "health".to_string(),
                reason: format!("model service returned {}", response.status()),
            });
        }

        response.json().await.map_err(|e| GeosegError::ModelRuntime {
            operation: "health".to_string(),
            reason: format!("unparseable health response: {}", e),
        })
    }

    async fn post(&self, operation: &str, endpoint: &str, body: &impl Serialize) -> Result<()> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, endpoint))
            .json(body)
            .send()
            .await
            .map_err(|e| self.unreachable(operation, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response
                .json::<ServiceError>()
                .await
                .map(|e| e.error)
                .unwrap_or_else(|_| "no error detail".to_string());
            return Err(GeosegError::ModelRuntime {
                operation: operation.to_string(),
                reason: format!("model service returned {}: {}", status, detail),
            });
        }

        Ok(())
    }

    fn unreachable(&self, operation: &str, err: reqwest::Error) -> GeosegError {
        GeosegError::ModelRuntime {
            operation: operation.to_string(),
            reason: format!(
                "Failed to reach model service at {}: {}. \
                 Ensure the segmentation service is running and GEOSEG_MODEL_URL points at it.",
                self.base_url, err
            ),
        }
    }
}

#[async_trait]
impl MaskGenerator for SamHttpClient {
    async fn generate(&self, input_raster: &Path, output_mask: &Path) -> Result<()> {
        tracing::debug!(input = %input_raster.display(), "Requesting whole-image mask");
        self.post(
            "generate",
            "/generate",
            &GenerateRequest {
                input_path: input_raster.to_string_lossy().into_owned(),
                output_path: output_mask.to_string_lossy().into_owned(),
            },
        )
        .await
    }

    async fn raster_to_vector(&self, mask: &Path, output_vector: &Path) -> Result<()> {
        tracing::debug!(mask = %mask.display(), "Requesting mask vectorization");
        self.post(
            "raster_to_vector",
            "/raster-to-vector",
            &RasterToVectorRequest {
                mask_path: mask.to_string_lossy().into_owned(),
                output_path: output_vector.to_string_lossy().into_owned(),
            },
        )
        .await
    }
}

#[async_trait]
impl PointPredictor for SamHttpClient {
    async fn set_image(&self, raster: &Path) -> Result<()> {
        tracing::debug!(raster = %raster.display(), "Setting predictor image");
        self.post(
            "set_image",
            "/set-image",
            &SetImageRequest { image_path: raster.to_string_lossy().into_owned() },
        )
        .await
    }

    async fn predict(
        &self,
        point_coords: &[(f64, f64)],
        point_labels: &[i32],
        point_crs: Crs,
        output_mask: &Path,
    ) -> Result<()> {
        tracing::debug!(points = point_coords.len(), "Requesting point prediction");
        self.post(
            "predict",
            "/predict",
            &PredictRequest {
                point_coords: point_coords.to_vec(),
                point_labels: point_labels.to_vec(),
                point_crs: point_crs.authority(),
                output_path: output_mask.to_string_lossy().into_owned(),
            },
        )
        .await
    }
}

/// Health report from the model service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeHealth {
    pub status: String,
    /// Compute device the model runs on, e.g. "cuda:0" or "cpu"
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    input_path: String,
    output_path: String,
}

#[derive(Debug, Serialize)]
struct RasterToVectorRequest {
    mask_path: String,
    output_path: String,
}

#[derive(Debug, Serialize)]
struct SetImageRequest {
    image_path: String,
}

#[derive(Debug, Serialize)]
struct PredictRequest {
    point_coords: Vec<(f64, f64)>,
    point_labels: Vec<i32>,
    point_crs: String,
    output_path: String,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = SamHttpClient::new("http://model:8500");
        assert_eq!(client.base_url(), "http://model:8500");

        let client = SamHttpClient::localhost();
        assert_eq!(client.base_url(), "http://localhost:8500");
    }

    #[test]
    fn test_predict_request_wire_format() {
        let req = PredictRequest {
            point_coords: vec![(11.38, 44.52)],
            point_labels: vec![1],
            point_crs: Crs::wgs84().authority(),
            output_path: "public/bologna/f08_mask.tif".to_string(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["point_crs"], "EPSG:4326");
        assert_eq!(json["point_coords"][0][0], 11.38);
        assert_eq!(json["point_labels"][0], 1);
    }

    #[tokio::test]
    async fn test_unreachable_service_maps_to_model_runtime_error() {
        // Nothing listens on this port
        let client = SamHttpClient::new("http://127.0.0.1:1");
        let err = client.set_image(Path::new("a.tif")).await.unwrap_err();
        match err {
            GeosegError::ModelRuntime { operation, reason } => {
                assert_eq!(operation, "set_image");
                assert!(reason.contains("model service"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
