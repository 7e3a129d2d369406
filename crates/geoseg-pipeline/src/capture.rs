//! AOI capture.
//!
//! Persists a client-drawn canvas image for an AOI and georeferences it as
//! a GeoTIFF at the canonical source-image path, so later point-prompted
//! requests against the same (project, id) segment the captured drawing
//! instead of fetched imagery.

use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;

use geoseg_core::error::Result;
use geoseg_core::models::AoiRequest;
use geoseg_core::{ArtifactKind, ArtifactSet};
use geoseg_raster::convert_image_to_geotiff;

use crate::metadata::ArtifactMetadata;

/// Result of an AOI capture
#[derive(Debug, Clone, Serialize)]
pub struct CaptureOutcome {
    pub project: String,
    pub id: String,
    pub bbox: [f64; 4],
    pub zoom: u32,
    pub image_url: String,
    pub tif_url: String,
}

pub struct AoiCapture {
    data_dir: PathBuf,
    base_url: String,
}

impl AoiCapture {
    pub fn new(data_dir: PathBuf, base_url: String) -> Self {
        Self { data_dir, base_url }
    }

    /// Store the decoded canvas image and its georeferenced conversion.
    pub fn capture(&self, request: &AoiRequest, image_bytes: &[u8]) -> Result<CaptureOutcome> {
        let artifacts = ArtifactSet::new(&request.project, &request.id);

        let tif_path = self.data_dir.join(artifacts.path(ArtifactKind::SourceImage));
        let png_path = tif_path.with_extension("png");

        if let Some(parent) = png_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&png_path, image_bytes)?;

        convert_image_to_geotiff(image_bytes, request.bbox, &tif_path)?;

        ArtifactMetadata {
            project: request.project.clone(),
            id: request.id.clone(),
            bbox: request.bbox,
            zoom: request.zoom,
            action_type: None,
            created_at: Utc::now(),
        }
        .write(&self.data_dir)?;

        let tif_url = artifacts.url(&self.base_url, ArtifactKind::SourceImage);
        let image_url = format!(
            "{}/files/{}/{}.png",
            self.base_url.trim_end_matches('/'),
            request.project,
            request.id
        );

        tracing::info!(
            project = %request.project,
            id = %request.id,
            tif = %tif_path.display(),
            "Captured AOI canvas"
        );

        Ok(CaptureOutcome {
            project: request.project.clone(),
            id: request.id.clone(),
            bbox: request.bbox.0,
            zoom: request.zoom,
            image_url,
            tif_url,
        })
    }
}
