//! Request models shared across all geoseg crates.
//!
//! The near-duplicate per-route parameter lists of earlier revisions are
//! collapsed into one typed [`SegmentRequest`] with an explicit
//! [`ActionType`] enumeration. Requests are validated once, before any I/O
//! or model invocation, and never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::error::{GeosegError, Result};

/// Highest zoom level accepted for tile imagery.
pub const MAX_ZOOM: u32 = 22;

/// Coordinate Reference System identified by EPSG code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Crs(pub u32);

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Crs {
    /// WGS 84 (EPSG:4326)
    pub fn wgs84() -> Self {
        Self(4326)
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self(3857)
    }

    /// Authority string understood by proj, e.g. "EPSG:4326"
    pub fn authority(&self) -> String {
        format!("EPSG:{}", self.0)
    }
}

/// Geographic bounding box: [min_lon, min_lat, max_lon, max_lat]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundingBox(pub [f64; 4]);

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self([min_lon, min_lat, max_lon, max_lat])
    }

    pub fn min_lon(&self) -> f64 {
        self.0[0]
    }

    pub fn min_lat(&self) -> f64 {
        self.0[1]
    }

    pub fn max_lon(&self) -> f64 {
        self.0[2]
    }

    pub fn max_lat(&self) -> f64 {
        self.0[3]
    }

    /// Validate coordinate ranges and axis ordering.
    pub fn validate(&self) -> Result<()> {
        let [min_lon, min_lat, max_lon, max_lat] = self.0;

        for lon in [min_lon, max_lon] {
            if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
                return Err(GeosegError::InvalidBoundingBox {
                    bbox: self.0,
                    reason: format!("longitude {} out of range [-180, 180]", lon),
                });
            }
        }

        for lat in [min_lat, max_lat] {
            if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
                return Err(GeosegError::InvalidBoundingBox {
                    bbox: self.0,
                    reason: format!("latitude {} out of range [-90, 90]", lat),
                });
            }
        }

        if min_lon >= max_lon {
            return Err(GeosegError::InvalidBoundingBox {
                bbox: self.0,
                reason: "min_lon must be strictly less than max_lon".to_string(),
            });
        }

        if min_lat >= max_lat {
            return Err(GeosegError::InvalidBoundingBox {
                bbox: self.0,
                reason: "min_lat must be strictly less than max_lat".to_string(),
            });
        }

        Ok(())
    }
}

/// How point prompts drive the predictor workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    SinglePoint,
    MultiPoint,
}

/// Shape of the segmentation response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReturnFormat {
    /// Inline GeoJSON feature collection
    #[default]
    Geojson,
    /// Public URL of the persisted vector artifact
    Url,
}

/// A rectangular area of interest on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AoiRequest {
    pub project: String,
    pub id: String,
    pub bbox: BoundingBox,
    pub zoom: u32,
    #[serde(default)]
    pub crs: Crs,
}

impl AoiRequest {
    pub fn validate(&self) -> Result<()> {
        if self.project.is_empty() {
            return Err(GeosegError::MissingInput { what: "project".to_string() });
        }
        if self.id.is_empty() {
            return Err(GeosegError::MissingInput { what: "id".to_string() });
        }
        self.bbox.validate()?;
        if self.zoom > MAX_ZOOM {
            return Err(GeosegError::InvalidZoom { zoom: self.zoom, max: MAX_ZOOM });
        }
        Ok(())
    }
}

/// A segmentation request: an AOI plus optional point prompts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRequest {
    pub project: String,
    pub id: String,
    pub bbox: BoundingBox,
    pub zoom: u32,
    #[serde(default)]
    pub crs: Crs,
    /// Ordered (lon, lat) prompt points; absent for the automatic workflow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_coords: Option<Vec<(f64, f64)>>,
    /// Foreground/background labels, parallel to `point_coords`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_labels: Option<Vec<i32>>,
    /// Unset means automatic whole-image segmentation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<ActionType>,
    #[serde(default)]
    pub return_format: ReturnFormat,
}

impl SegmentRequest {
    /// AOI view of this request
    pub fn aoi(&self) -> AoiRequest {
        AoiRequest {
            project: self.project.clone(),
            id: self.id.clone(),
            bbox: self.bbox,
            zoom: self.zoom,
            crs: self.crs,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.aoi().validate()?;

        if let (Some(coords), Some(labels)) = (&self.point_coords, &self.point_labels) {
            if coords.len() != labels.len() {
                return Err(GeosegError::PointLabelMismatch {
                    coords: coords.len(),
                    labels: labels.len(),
                });
            }
        }

        if self.action_type.is_some() {
            let coords = self
                .point_coords
                .as_ref()
                .ok_or_else(|| GeosegError::MissingInput {
                    what: "point_coords".to_string(),
                })?;
            if coords.is_empty() {
                return Err(GeosegError::MissingInput {
                    what: "at least one prompt point".to_string(),
                });
            }
        }

        Ok(())
    }
}
