//! GeoSeg Core - Domain models, artifact naming, and port definitions
//!
//! This crate contains the request model, the deterministic artifact namer,
//! and the collaborator port traits the segmentation pipeline is built on.

pub mod artifact;
pub mod config;
pub mod error;
pub mod models;
pub mod ports;

pub use artifact::{ArtifactKind, ArtifactSet};
pub use error::{GeosegError, Result};
