//! XYZ (slippy-map) tile fetching.
//!
//! Mosaics web tiles covering a bounding box at a zoom level into one
//! georeferenced GeoTIFF. Tiles are square Web Mercator cells, so the
//! mosaic is written in EPSG:3857 where the pixel grid maps linearly onto
//! projected coordinates; consumers reproject downstream as needed.

use std::f64::consts::PI;
use std::path::Path;

use async_trait::async_trait;
use image::RgbImage;

use geoseg_core::error::{GeosegError, Result};
use geoseg_core::models::{BoundingBox, Crs};
use geoseg_core::ports::TileFetcher;

use crate::geotiff::{transform_from_bounds, write_rgb_geotiff};

const TILE_SIZE: u32 = 256;
/// Web Mercator half-extent in meters (PI * equatorial radius)
const MERCATOR_ORIGIN: f64 = 20_037_508.342789244;
/// Upper bound on tiles per request; larger AOIs must drop the zoom level
const MAX_TILES: u64 = 256;

/// Tile fetcher for XYZ tile endpoints with {x}/{y}/{z} URL templates.
pub struct XyzTileFetcher {
    template: String,
    client: reqwest::Client,
}

impl XyzTileFetcher {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Google satellite imagery, the default basemap
    pub fn satellite() -> Self {
        Self::new("https://mt1.google.com/vt/lyrs=s&x={x}&y={y}&z={z}")
    }

    /// OpenStreetMap standard tiles
    pub fn openstreetmap() -> Self {
        Self::new("https://tile.openstreetmap.org/{z}/{x}/{y}.png")
    }

    /// Resolve a named source to a fetcher. An http(s) template with
    /// placeholders is accepted directly.
    pub fn from_source(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            return Self::new(source);
        }
        match source {
            "OpenStreetMap" | "Map" => Self::openstreetmap(),
            _ => Self::satellite(),
        }
    }

    fn tile_url(&self, x: u32, y: u32, z: u32) -> String {
        self.template
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
            .replace("{z}", &z.to_string())
    }

    async fn download_tile(&self, x: u32, y: u32, z: u32) -> Result<RgbImage> {
        let url = self.tile_url(x, y, z);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| GeosegError::TileFetch {
                bbox: [0.0; 4],
                zoom: z,
                reason: format!("tile {}/{}/{}: {}", z, x, y, e),
            })?;

        let bytes = response.bytes().await.map_err(|e| GeosegError::TileFetch {
            bbox: [0.0; 4],
            zoom: z,
            reason: format!("tile {}/{}/{} body: {}", z, x, y, e),
        })?;

        let img = image::load_from_memory(&bytes).map_err(|e| GeosegError::TileFetch {
            bbox: [0.0; 4],
            zoom: z,
            reason: format!("tile {}/{}/{} decode: {}", z, x, y, e),
        })?;

        Ok(img.to_rgb8())
    }
}

#[async_trait]
impl TileFetcher for XyzTileFetcher {
    async fn fetch(
        &self,
        bbox: BoundingBox,
        zoom: u32,
        source: &str,
        output: &Path,
        overwrite: bool,
    ) -> Result<()> {
        if !overwrite && output.is_file() {
            return Ok(());
        }

        let range = TileRange::covering(bbox, zoom)?;
        tracing::info!(
            bbox = ?bbox.0,
            zoom = zoom,
            source = source,
            tiles = range.count(),
            "Downloading tile mosaic"
        );

        let mut mosaic = RgbImage::new(range.width_px(), range.height_px());
        for ty in range.y_min..=range.y_max {
            for tx in range.x_min..=range.x_max {
                let tile = self.download_tile(tx, ty, zoom).await.map_err(|e| match e {
                    GeosegError::TileFetch { zoom, reason, .. } => {
                        GeosegError::TileFetch { bbox: bbox.0, zoom, reason }
                    }
                    other => other,
                })?;
                let px = (tx - range.x_min) * TILE_SIZE;
                let py = (ty - range.y_min) * TILE_SIZE;
                image::imageops::replace(&mut mosaic, &tile, px as i64, py as i64);
            }
        }

        let (img, bounds) = range.crop_to_bbox(mosaic, bbox);
        let transform =
            transform_from_bounds(bounds, img.width() as usize, img.height() as usize);
        write_rgb_geotiff(output, &img, transform, Crs::web_mercator())?;

        Ok(())
    }
}

/// Inclusive rectangle of XYZ tiles covering a bounding box at one zoom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub zoom: u32,
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
}

impl TileRange {
    pub fn covering(bbox: BoundingBox, zoom: u32) -> Result<Self> {
        let (x_min, y_max) = lonlat_to_tile(bbox.min_lon(), bbox.min_lat(), zoom);
        let (x_max, y_min) = lonlat_to_tile(bbox.max_lon(), bbox.max_lat(), zoom);

        let range = Self { zoom, x_min, x_max, y_min, y_max };
        if range.count() > MAX_TILES {
            return Err(GeosegError::TileFetch {
                bbox: bbox.0,
                zoom,
                reason: format!(
                    "{} tiles exceed the {} tile limit, lower the zoom level",
                    range.count(),
                    MAX_TILES
                ),
            });
        }
        Ok(range)
    }

    pub fn count(&self) -> u64 {
        (self.x_max - self.x_min + 1) as u64 * (self.y_max - self.y_min + 1) as u64
    }

    pub fn width_px(&self) -> u32 {
        (self.x_max - self.x_min + 1) * TILE_SIZE
    }

    pub fn height_px(&self) -> u32 {
        (self.y_max - self.y_min + 1) * TILE_SIZE
    }

    /// Web Mercator bounds of the whole tile rectangle
    pub fn mercator_bounds(&self) -> (f64, f64, f64, f64) {
        let tile_span = 2.0 * MERCATOR_ORIGIN / 2f64.powi(self.zoom as i32);
        let min_x = -MERCATOR_ORIGIN + self.x_min as f64 * tile_span;
        let max_x = -MERCATOR_ORIGIN + (self.x_max + 1) as f64 * tile_span;
        let max_y = MERCATOR_ORIGIN - self.y_min as f64 * tile_span;
        let min_y = MERCATOR_ORIGIN - (self.y_max + 1) as f64 * tile_span;
        (min_x, min_y, max_x, max_y)
    }

    /// Crop the mosaic to the requested bbox. Pixel offsets are exact in
    /// Web Mercator because the grid is linear in projected coordinates.
    fn crop_to_bbox(&self, mosaic: RgbImage, bbox: BoundingBox) -> (RgbImage, (f64, f64, f64, f64)) {
        let (tile_min_x, _tile_min_y, tile_max_x, tile_max_y) = self.mercator_bounds();
        let meters_per_px = (tile_max_x - tile_min_x) / mosaic.width() as f64;

        let (want_min_x, want_min_y) = lonlat_to_mercator(bbox.min_lon(), bbox.min_lat());
        let (want_max_x, want_max_y) = lonlat_to_mercator(bbox.max_lon(), bbox.max_lat());

        let left = ((want_min_x - tile_min_x) / meters_per_px).floor().max(0.0) as u32;
        let top = ((tile_max_y - want_max_y) / meters_per_px).floor().max(0.0) as u32;
        let right = (((want_max_x - tile_min_x) / meters_per_px).ceil() as u32).min(mosaic.width());
        let bottom =
            (((tile_max_y - want_min_y) / meters_per_px).ceil() as u32).min(mosaic.height());

        let width = right.saturating_sub(left).max(1);
        let height = bottom.saturating_sub(top).max(1);
        let cropped = image::imageops::crop_imm(&mosaic, left, top, width, height).to_image();

        let bounds = (
            tile_min_x + left as f64 * meters_per_px,
            tile_max_y - bottom as f64 * meters_per_px,
            tile_min_x + right as f64 * meters_per_px,
            tile_max_y - top as f64 * meters_per_px,
        );
        (cropped, bounds)
    }
}

/// XYZ tile containing a lon/lat point at a zoom level
pub fn lonlat_to_tile(lon: f64, lat: f64, zoom: u32) -> (u32, u32) {
    let n = 2f64.powi(zoom as i32);
    let x = ((lon + 180.0) / 360.0 * n).floor();
    let lat_rad = lat.to_radians();
    let y = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n).floor();

    let max_index = n - 1.0;
    (x.clamp(0.0, max_index) as u32, y.clamp(0.0, max_index) as u32)
}

/// Spherical Web Mercator forward projection
pub fn lonlat_to_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = lon / 180.0 * MERCATOR_ORIGIN;
    let y = ((90.0 + lat) * PI / 360.0).tan().ln() / PI * MERCATOR_ORIGIN;
    (x, y)
}
