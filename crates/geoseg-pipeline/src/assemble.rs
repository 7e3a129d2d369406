//! Result assembly.
//!
//! The assembler always persists the feature collection at the canonical
//! vector artifact path, then returns either the inline collection or just
//! the public URL of the persisted file, so large results can stay out of
//! the response body while the URL stays valid either way.

use std::path::PathBuf;

use geojson::FeatureCollection;
use serde::Serialize;

use geoseg_core::error::Result;
use geoseg_core::models::ReturnFormat;
use geoseg_core::{ArtifactKind, ArtifactSet};
use geoseg_raster::vector::write_feature_collection;

/// Response of a segmentation workflow
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SegmentResponse {
    /// Inline GeoJSON feature collection
    Features(FeatureCollection),
    /// Reference to the persisted vector artifact
    Reference { geojson_url: String },
}

impl SegmentResponse {
    pub fn features(&self) -> Option<&FeatureCollection> {
        match self {
            SegmentResponse::Features(fc) => Some(fc),
            SegmentResponse::Reference { .. } => None,
        }
    }
}

pub struct ResultAssembler {
    data_dir: PathBuf,
    base_url: String,
}

impl ResultAssembler {
    pub fn new(data_dir: PathBuf, base_url: String) -> Self {
        Self { data_dir, base_url }
    }

    /// Persist the collection and render it per the requested format.
    pub fn assemble(
        &self,
        collection: FeatureCollection,
        artifacts: &ArtifactSet,
        return_format: ReturnFormat,
    ) -> Result<SegmentResponse> {
        let vector_path = self.data_dir.join(artifacts.path(ArtifactKind::Vector));
        write_feature_collection(&collection, &vector_path)?;

        tracing::info!(
            path = %vector_path.display(),
            features = collection.features.len(),
            format = ?return_format,
            "Persisted vector artifact"
        );

        Ok(match return_format {
            ReturnFormat::Geojson => SegmentResponse::Features(collection),
            ReturnFormat::Url => SegmentResponse::Reference {
                geojson_url: artifacts.url(&self.base_url, ArtifactKind::Vector),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoseg_raster::vector::read_feature_collection;

    fn empty_collection() -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: vec![],
            foreign_members: None,
        }
    }

    #[test]
    fn test_geojson_format_returns_inline_features() {
        let dir = tempfile::tempdir().unwrap();
        let assembler =
            ResultAssembler::new(dir.path().to_path_buf(), "http://localhost:8000".to_string());
        let artifacts = ArtifactSet::new("bologna", "f08");

        let response = assembler
            .assemble(empty_collection(), &artifacts, ReturnFormat::Geojson)
            .unwrap();

        assert!(response.features().is_some());
        // Persisted even though the inline form was returned
        assert!(dir.path().join("bologna/f08.geojson").is_file());
    }

    #[test]
    fn test_url_format_withholds_features() {
        let dir = tempfile::tempdir().unwrap();
        let assembler =
            ResultAssembler::new(dir.path().to_path_buf(), "http://localhost:8000".to_string());
        let artifacts = ArtifactSet::new("bologna", "f08");

        let response =
            assembler.assemble(empty_collection(), &artifacts, ReturnFormat::Url).unwrap();

        assert!(response.features().is_none());
        let SegmentResponse::Reference { geojson_url } = response else {
            panic!("expected a reference");
        };
        assert_eq!(geojson_url, "http://localhost:8000/files/bologna/f08.geojson");

        let json = serde_json::to_value(SegmentResponse::Reference { geojson_url }).unwrap();
        assert!(json.get("features").is_none(), "no inline features in url mode");
    }

    #[test]
    fn test_persisted_artifact_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let assembler =
            ResultAssembler::new(dir.path().to_path_buf(), "http://localhost:8000".to_string());
        let artifacts = ArtifactSet::new("bologna", "f08");

        let response = assembler
            .assemble(empty_collection(), &artifacts, ReturnFormat::Geojson)
            .unwrap();

        let persisted = read_feature_collection(&dir.path().join("bologna/f08.geojson")).unwrap();
        assert_eq!(&persisted, response.features().unwrap());
    }
}
