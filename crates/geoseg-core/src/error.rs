//! Error types for GeoSeg

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeosegError {
    // Request validation errors
    #[error("Invalid bounding box {bbox:?}: {reason}")]
    InvalidBoundingBox { bbox: [f64; 4], reason: String },

    #[error("Invalid zoom level {zoom}: must be between 0 and {max}")]
    InvalidZoom { zoom: u32, max: u32 },

    #[error("{coords} point coordinates but {labels} point labels")]
    PointLabelMismatch { coords: usize, labels: usize },

    #[error("Missing required input: {what}")]
    MissingInput { what: String },

    // Imagery errors
    #[error("Tile fetch failed for bbox {bbox:?} at zoom {zoom}: {reason}")]
    TileFetch {
        bbox: [f64; 4],
        zoom: u32,
        reason: String,
    },

    #[error("Raster I/O failed for {path}: {reason}")]
    RasterIo { path: PathBuf, reason: String },

    #[error("Image decode failed: {reason}")]
    ImageDecode { reason: String },

    // Model runtime errors
    #[error("Model runtime {operation} failed: {reason}")]
    ModelRuntime { operation: String, reason: String },

    // Vectorization errors
    #[error("Vectorization failed for {path}: {reason}")]
    Vectorize { path: PathBuf, reason: String },

    #[error("Reprojection from EPSG:{from_epsg} to EPSG:{to_epsg} failed: {reason}")]
    Reprojection {
        from_epsg: u32,
        to_epsg: u32,
        reason: String,
    },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GeosegError {
    /// True for errors caused by a malformed request rather than by the
    /// pipeline or its collaborators.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            GeosegError::InvalidBoundingBox { .. }
                | GeosegError::InvalidZoom { .. }
                | GeosegError::PointLabelMismatch { .. }
                | GeosegError::MissingInput { .. }
                | GeosegError::ImageDecode { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, GeosegError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_client_fault() {
        let err = GeosegError::InvalidZoom { zoom: 30, max: 22 };
        assert!(err.is_client_fault());

        let err = GeosegError::PointLabelMismatch { coords: 2, labels: 1 };
        assert!(err.is_client_fault());
    }

    #[test]
    fn test_pipeline_errors_are_not_client_fault() {
        let err = GeosegError::ModelRuntime {
            operation: "predict".to_string(),
            reason: "connection refused".to_string(),
        };
        assert!(!err.is_client_fault());
    }

    #[test]
    fn test_error_messages_carry_context() {
        let err = GeosegError::TileFetch {
            bbox: [11.37, 44.51, 11.39, 44.53],
            zoom: 15,
            reason: "HTTP 503".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("11.37"));
        assert!(msg.contains("15"));
        assert!(msg.contains("HTTP 503"));
    }
}
