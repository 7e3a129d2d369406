//! Artifact metadata sidecars and project browsing.
//!
//! Each request leaves a small JSON sidecar next to its artifacts recording
//! the parameters that produced them; the listing endpoint groups a
//! project's files by base name, newest first.

use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use geoseg_core::error::{GeosegError, Result};
use geoseg_core::models::{ActionType, BoundingBox};
use geoseg_core::{ArtifactKind, ArtifactSet};

/// Sidecar recording the request that produced an artifact set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub project: String,
    pub id: String,
    pub bbox: BoundingBox,
    pub zoom: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<ActionType>,
    pub created_at: DateTime<Utc>,
}

impl ArtifactMetadata {
    pub fn write(&self, data_dir: &Path) -> Result<()> {
        let artifacts = ArtifactSet::new(&self.project, &self.id);
        let path = data_dir.join(artifacts.path(ArtifactKind::Metadata));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| GeosegError::Serialization(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn read(data_dir: &Path, project: &str, id: &str) -> Result<Self> {
        let artifacts = ArtifactSet::new(project, id);
        let path = data_dir.join(artifacts.path(ArtifactKind::Metadata));
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| GeosegError::Serialization(e.to_string()))
    }
}

/// One file within an artifact group
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactFile {
    pub file_name: String,
    pub url: String,
}

/// A project's files sharing one base name
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactGroup {
    pub base_name: String,
    pub files: Vec<ArtifactFile>,
    pub modified_at: DateTime<Utc>,
}

/// List a project's artifacts grouped by base name, newest group first.
pub fn list_project_artifacts(
    data_dir: &Path,
    project: &str,
    base_url: &str,
) -> Result<Vec<ArtifactGroup>> {
    let project_dir = data_dir.join(project);
    if !project_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut groups: Vec<ArtifactGroup> = Vec::new();
    for entry in std::fs::read_dir(&project_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().into_owned();
        let base_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.clone());
        let modified_at = modified_time(&path)?;
        let url = format!(
            "{}/files/{}/{}",
            base_url.trim_end_matches('/'),
            project,
            file_name
        );

        match groups.iter_mut().find(|g| g.base_name == base_name) {
            Some(group) => {
                group.files.push(ArtifactFile { file_name, url });
                if modified_at > group.modified_at {
                    group.modified_at = modified_at;
                }
            }
            None => groups.push(ArtifactGroup {
                base_name,
                files: vec![ArtifactFile { file_name, url }],
                modified_at,
            }),
        }
    }

    groups.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
    Ok(groups)
}

fn modified_time(path: &Path) -> Result<DateTime<Utc>> {
    let modified = std::fs::metadata(path)?.modified().unwrap_or(SystemTime::UNIX_EPOCH);
    Ok(DateTime::<Utc>::from(modified))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let meta = ArtifactMetadata {
            project: "bologna".to_string(),
            id: "f08".to_string(),
            bbox: BoundingBox::new(11.37, 44.51, 11.39, 44.53),
            zoom: 15,
            action_type: Some(ActionType::MultiPoint),
            created_at: Utc::now(),
        };

        meta.write(dir.path()).unwrap();
        let read = ArtifactMetadata::read(dir.path(), "bologna", "f08").unwrap();
        assert_eq!(read.id, "f08");
        assert_eq!(read.zoom, 15);
        assert_eq!(read.action_type, Some(ActionType::MultiPoint));
    }

    #[test]
    fn test_listing_groups_by_base_name() {
        let dir = tempfile::tempdir().unwrap();
        let project_dir = dir.path().join("bologna");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::write(project_dir.join("f08.tif"), b"a").unwrap();
        std::fs::write(project_dir.join("f08.geojson"), b"b").unwrap();
        std::fs::write(project_dir.join("f09.tif"), b"c").unwrap();

        let groups =
            list_project_artifacts(dir.path(), "bologna", "http://localhost:8000").unwrap();

        assert_eq!(groups.len(), 2);
        let f08 = groups.iter().find(|g| g.base_name == "f08").unwrap();
        assert_eq!(f08.files.len(), 2);
        assert!(f08
            .files
            .iter()
            .any(|f| f.url == "http://localhost:8000/files/bologna/f08.geojson"));
    }

    #[test]
    fn test_listing_missing_project_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let groups = list_project_artifacts(dir.path(), "ghost", "http://x").unwrap();
        assert!(groups.is_empty());
    }
}
