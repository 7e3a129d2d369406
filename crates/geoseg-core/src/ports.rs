//! Port trait definitions
//!
//! The pipeline depends on three external collaborators with fixed
//! contracts: a tile-fetch service, a whole-image mask generator, and a
//! point-prompted predictor. Adapters implement these traits; the pipeline
//! never knows which implementation it drives.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{BoundingBox, Crs};

/// Port for turning a bounding box + zoom into a georeferenced raster
#[async_trait]
pub trait TileFetcher: Send + Sync {
    /// Fetch imagery for `bbox` at `zoom` from the named source and write a
    /// georeferenced raster at `output`. `overwrite` replaces any existing
    /// file at that path.
    async fn fetch(
        &self,
        bbox: BoundingBox,
        zoom: u32,
        source: &str,
        output: &Path,
        overwrite: bool,
    ) -> Result<()>;
}

/// Port for the automatic (whole-image) segmentation runtime
#[async_trait]
pub trait MaskGenerator: Send + Sync {
    /// Segment the whole input raster, writing one mask raster at `output_mask`
    async fn generate(&self, input_raster: &Path, output_mask: &Path) -> Result<()>;

    /// Convert a raster mask into a tabular geometry file at `output_vector`
    async fn raster_to_vector(&self, mask: &Path, output_vector: &Path) -> Result<()>;
}

/// Port for the point-prompted segmentation runtime.
///
/// `set_image` establishes the current image for every subsequent `predict`
/// call; callers must hold the sequence together (the driver serializes it
/// behind a mutex).
#[async_trait]
pub trait PointPredictor: Send + Sync {
    async fn set_image(&self, raster: &Path) -> Result<()>;

    async fn predict(
        &self,
        point_coords: &[(f64, f64)],
        point_labels: &[i32],
        point_crs: Crs,
        output_mask: &Path,
    ) -> Result<()>;
}
