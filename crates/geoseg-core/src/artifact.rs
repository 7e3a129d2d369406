//! Deterministic artifact naming.
//!
//! Every on-disk identity in the pipeline derives from (project, id) and,
//! for per-point artifacts of a multi-point request, a point index. The
//! mapping is pure: it never touches the filesystem and cannot fail.
//! Identical inputs always yield identical paths, so a re-run of the same
//! request overwrites its artifacts in place instead of accumulating copies.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The kinds of artifact a request produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Georeferenced source raster the model runs against
    SourceImage,
    /// Raster segmentation mask
    Mask,
    /// Final GeoJSON vector output
    Vector,
    /// Intermediate tabular geometry (GeoPackage) from raster_to_vector
    TabularGeometry,
    /// Sidecar JSON recording the request parameters
    Metadata,
}

impl ArtifactKind {
    fn suffix(&self) -> &'static str {
        match self {
            ArtifactKind::SourceImage => ".tif",
            ArtifactKind::Mask => "_mask.tif",
            ArtifactKind::Vector => ".geojson",
            ArtifactKind::TabularGeometry => ".gpkg",
            ArtifactKind::Metadata => ".json",
        }
    }

    fn indexed_suffix(&self, index: usize) -> String {
        match self {
            ArtifactKind::SourceImage => format!("_{}.tif", index),
            ArtifactKind::Mask => format!("_mask_{}.tif", index),
            ArtifactKind::Vector => format!("_{}.geojson", index),
            ArtifactKind::TabularGeometry => format!("_{}.gpkg", index),
            ArtifactKind::Metadata => format!("_{}.json", index),
        }
    }
}

/// The canonical file identities for one (project, id) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    project: String,
    id: String,
}

impl ArtifactSet {
    pub fn new(project: impl Into<String>, id: impl Into<String>) -> Self {
        Self { project: project.into(), id: id.into() }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Relative path of an artifact under the public root
    pub fn path(&self, kind: ArtifactKind) -> PathBuf {
        PathBuf::from(&self.project).join(format!("{}{}", self.id, kind.suffix()))
    }

    /// Relative path of a per-point artifact; the index keeps concurrent
    /// per-point files of one multi-point request from colliding.
    pub fn indexed_path(&self, kind: ArtifactKind, index: usize) -> PathBuf {
        PathBuf::from(&self.project).join(format!("{}{}", self.id, kind.indexed_suffix(index)))
    }

    /// Public URL of an artifact, served under `{base_url}/files/`
    pub fn url(&self, base_url: &str, kind: ArtifactKind) -> String {
        format!(
            "{}/files/{}",
            base_url.trim_end_matches('/'),
            self.path(kind).to_string_lossy()
        )
    }

    /// Public URL of a per-point artifact
    pub fn indexed_url(&self, base_url: &str, kind: ArtifactKind, index: usize) -> String {
        format!(
            "{}/files/{}",
            base_url.trim_end_matches('/'),
            self.indexed_path(kind, index).to_string_lossy()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naming_is_idempotent() {
        let a = ArtifactSet::new("bologna", "f08");
        let b = ArtifactSet::new("bologna", "f08");
        for kind in [
            ArtifactKind::SourceImage,
            ArtifactKind::Mask,
            ArtifactKind::Vector,
            ArtifactKind::TabularGeometry,
            ArtifactKind::Metadata,
        ] {
            assert_eq!(a.path(kind), b.path(kind));
            assert_eq!(a.url("http://localhost:8000", kind), b.url("http://localhost:8000", kind));
        }
    }

    #[test]
    fn test_paths_are_namespaced_by_project() {
        let set = ArtifactSet::new("bologna", "f08");
        assert_eq!(set.path(ArtifactKind::SourceImage), PathBuf::from("bologna/f08.tif"));
        assert_eq!(set.path(ArtifactKind::Mask), PathBuf::from("bologna/f08_mask.tif"));
        assert_eq!(set.path(ArtifactKind::Vector), PathBuf::from("bologna/f08.geojson"));
        assert_eq!(set.path(ArtifactKind::TabularGeometry), PathBuf::from("bologna/f08.gpkg"));
        assert_eq!(set.path(ArtifactKind::Metadata), PathBuf::from("bologna/f08.json"));
    }

    #[test]
    fn test_distinct_ids_never_collide() {
        let a = ArtifactSet::new("bologna", "f08");
        let b = ArtifactSet::new("bologna", "f09");
        for kind in [
            ArtifactKind::SourceImage,
            ArtifactKind::Mask,
            ArtifactKind::Vector,
            ArtifactKind::TabularGeometry,
            ArtifactKind::Metadata,
        ] {
            assert_ne!(a.path(kind), b.path(kind));
        }
    }

    #[test]
    fn test_indexed_paths_never_collide_across_points() {
        let set = ArtifactSet::new("bologna", "f08");
        let m0 = set.indexed_path(ArtifactKind::Mask, 0);
        let m1 = set.indexed_path(ArtifactKind::Mask, 1);
        assert_ne!(m0, m1);
        assert_eq!(m0, PathBuf::from("bologna/f08_mask_0.tif"));
        // Indexed paths stay distinct from the un-indexed one
        assert_ne!(m0, set.path(ArtifactKind::Mask));
    }

    #[test]
    fn test_url_joins_cleanly_with_trailing_slash() {
        let set = ArtifactSet::new("bologna", "f08");
        assert_eq!(
            set.url("http://localhost:8000/", ArtifactKind::Vector),
            "http://localhost:8000/files/bologna/f08.geojson"
        );
        assert_eq!(
            set.indexed_url("http://localhost:8000", ArtifactKind::Vector, 2),
            "http://localhost:8000/files/bologna/f08_2.geojson"
        );
    }
}
