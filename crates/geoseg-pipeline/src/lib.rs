//! GeoSeg Pipeline - Segmentation artifact orchestration
//!
//! The driver, vectorizer and result assembler that turn an AOI request
//! into persisted raster/vector artifacts and a GeoJSON response.

pub mod assemble;
pub mod capture;
pub mod driver;
pub mod metadata;
pub mod vectorize;

pub use assemble::{ResultAssembler, SegmentResponse};
pub use capture::{AoiCapture, CaptureOutcome};
pub use driver::SegmentationDriver;
pub use vectorize::{MaskVectorizer, Vectorize};
