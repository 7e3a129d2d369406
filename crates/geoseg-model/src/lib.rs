//! GeoSeg Model - HTTP adapter for the segmentation model runtime

pub mod client;

pub use client::{RuntimeHealth, SamHttpClient};
