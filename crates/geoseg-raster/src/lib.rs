//! GeoSeg Raster - Georeferenced raster and vector I/O
//!
//! Imagery resolution with on-disk caching, canvas-to-raster conversion,
//! XYZ tile mosaics, and the GDAL-backed vector table reading the
//! vectorizer is built on.

pub mod convert;
pub mod geotiff;
pub mod resolver;
pub mod tiles;
pub mod vector;

pub use convert::convert_image_to_geotiff;
pub use resolver::ImageryResolver;
pub use tiles::XyzTileFetcher;
