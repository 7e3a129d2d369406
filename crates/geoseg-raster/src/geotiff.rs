//! GDAL-backed GeoTIFF writing.
//!
//! A raster is georeferenced by an affine transform mapping its pixel
//! extent onto geographic bounds, plus a spatial reference. Both come from
//! the caller; this module only stamps them onto the file.

use std::path::Path;

use gdal::raster::Buffer;
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager};
use image::RgbImage;

use geoseg_core::error::{GeosegError, Result};
use geoseg_core::models::Crs;

/// Affine transform mapping a `width` x `height` pixel grid onto the given
/// bounds (min_x, min_y, max_x, max_y), row origin at the top.
pub fn transform_from_bounds(
    bounds: (f64, f64, f64, f64),
    width: usize,
    height: usize,
) -> [f64; 6] {
    let (min_x, min_y, max_x, max_y) = bounds;
    let pixel_width = (max_x - min_x) / width as f64;
    let pixel_height = (max_y - min_y) / height as f64;
    [min_x, pixel_width, 0.0, max_y, 0.0, -pixel_height]
}

/// Write an RGB image as a 3-band GeoTIFF with the given transform and CRS.
pub fn write_rgb_geotiff(
    output: &Path,
    img: &RgbImage,
    transform: [f64; 6],
    crs: Crs,
) -> Result<()> {
    let (width, height) = (img.width() as usize, img.height() as usize);

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let driver = DriverManager::get_driver_by_name("GTiff")
        .map_err(|e| raster_io(output, format!("GTiff driver unavailable: {}", e)))?;

    let mut dataset = driver
        .create_with_band_type::<u8, _>(output, width, height, 3)
        .map_err(|e| raster_io(output, format!("Failed to create raster: {}", e)))?;

    dataset
        .set_geo_transform(&transform)
        .map_err(|e| raster_io(output, format!("Failed to set transform: {}", e)))?;

    let srs = SpatialRef::from_epsg(crs.0)
        .map_err(|e| raster_io(output, format!("Unknown EPSG:{}: {}", crs.0, e)))?;
    dataset
        .set_spatial_ref(&srs)
        .map_err(|e| raster_io(output, format!("Failed to set CRS: {}", e)))?;

    for channel in 0..3usize {
        let data: Vec<u8> = img.pixels().map(|p| p.0[channel]).collect();
        let mut buffer = Buffer::new((width, height), data);
        let mut band = dataset
            .rasterband(channel + 1)
            .map_err(|e| raster_io(output, format!("Band {} unavailable: {}", channel + 1, e)))?;
        band.write((0, 0), (width, height), &mut buffer)
            .map_err(|e| raster_io(output, format!("Band {} write failed: {}", channel + 1, e)))?;
    }

    Ok(())
}

/// Check that GDAL can open a raster without fully loading it.
pub fn validate_raster(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(raster_io(path, "File not found".to_string()));
    }
    Dataset::open(path).map_err(|e| raster_io(path, format!("Failed to open raster: {}", e)))?;
    Ok(())
}

fn raster_io(path: &Path, reason: String) -> GeosegError {
    GeosegError::RasterIo { path: path.to_path_buf(), reason }
}
