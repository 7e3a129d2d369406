//! Canvas-to-raster conversion.
//!
//! Turns a client-drawn pixel image into a georeferenced raster by mapping
//! its pixel extent linearly onto the request bounding box, fixed to
//! WGS84. This is the alternative imagery source to the tile fetcher: the
//! AOI-capture workflow hands the resulting GeoTIFF straight to the
//! segmentation driver.

use std::path::{Path, PathBuf};

use geoseg_core::error::{GeosegError, Result};
use geoseg_core::models::{BoundingBox, Crs};

use crate::geotiff::{transform_from_bounds, write_rgb_geotiff};

/// Decode an image payload and write it as a 3-band WGS84 GeoTIFF at
/// `output`, with pixel dimensions preserved and geography taken from
/// `bbox`. Non-RGB inputs are coerced to RGB before writing.
pub fn convert_image_to_geotiff(
    image_bytes: &[u8],
    bbox: BoundingBox,
    output: &Path,
) -> Result<PathBuf> {
    let decoded = image::load_from_memory(image_bytes).map_err(|e| GeosegError::ImageDecode {
        reason: format!("{} (target {})", e, output.display()),
    })?;
    let rgb = decoded.to_rgb8();

    let transform = transform_from_bounds(
        (bbox.min_lon(), bbox.min_lat(), bbox.max_lon(), bbox.max_lat()),
        rgb.width() as usize,
        rgb.height() as usize,
    );

    write_rgb_geotiff(output, &rgb, transform, Crs::wgs84())?;

    tracing::info!(
        output = %output.display(),
        width = rgb.width(),
        height = rgb.height(),
        bbox = ?bbox.0,
        "Converted canvas image to GeoTIFF"
    );

    Ok(output.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_rejected_with_context() {
        let bbox = BoundingBox::new(11.37, 44.51, 11.39, 44.53);
        let err = convert_image_to_geotiff(b"not an image", bbox, Path::new("/tmp/x.tif"))
            .unwrap_err();
        assert!(matches!(err, GeosegError::ImageDecode { .. }));
        assert!(err.to_string().contains("x.tif"));
    }
}
