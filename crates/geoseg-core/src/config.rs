//! Pipeline configuration with file and environment layering.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GeosegError, Result};
use crate::models::Crs;

/// Knobs for the segmentation pipeline.
///
/// Defaults are overridden by a TOML file, which is in turn overridden by
/// `GEOSEG_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root directory artifacts are written under, served at `/files`
    pub data_dir: PathBuf,
    /// Base URL public artifact links are built from
    pub base_url: String,
    /// Named imagery source passed to the tile fetcher
    pub tile_source: String,
    /// CRS every response geometry is reprojected into
    pub response_crs: Crs,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("public"),
            base_url: "http://localhost:8000".to_string(),
            tile_source: "Satellite".to_string(),
            response_crs: Crs::wgs84(),
        }
    }
}

impl PipelineConfig {
    /// Load from a TOML file, keeping defaults for absent keys
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| GeosegError::ConfigInvalid {
            key: "file".to_string(),
            reason: format!("Failed to read config file: {}", e),
        })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| GeosegError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(data_dir) = file_config.data_dir {
            self.data_dir = data_dir;
        }
        if let Some(base_url) = file_config.base_url {
            self.base_url = base_url;
        }
        if let Some(tile_source) = file_config.tile_source {
            self.tile_source = tile_source;
        }
        if let Some(epsg) = file_config.response_crs {
            self.response_crs = Crs(epsg);
        }

        Ok(self)
    }

    /// Apply `GEOSEG_*` environment overrides
    pub fn load_from_env(mut self) -> Self {
        if let Ok(data_dir) = env::var("GEOSEG_DATA_DIR") {
            self.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(base_url) = env::var("GEOSEG_BASE_URL") {
            self.base_url = base_url;
        }

        if let Ok(tile_source) = env::var("GEOSEG_TILE_SOURCE") {
            self.tile_source = tile_source;
        }

        if let Ok(crs_str) = env::var("GEOSEG_RESPONSE_CRS") {
            match crs_str.parse::<u32>() {
                Ok(epsg) => self.response_crs = Crs(epsg),
                Err(_) => tracing::warn!(
                    "Invalid GEOSEG_RESPONSE_CRS value '{}': expected integer EPSG code",
                    crs_str
                ),
            }
        }

        self
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    data_dir: Option<PathBuf>,
    base_url: Option<String>,
    tile_source: Option<String>,
    response_crs: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("public"));
        assert_eq!(config.tile_source, "Satellite");
        assert_eq!(config.response_crs, Crs::wgs84());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
data_dir = "/srv/geoseg/public"
base_url = "https://geoseg.example.com"
response_crs = 3857
"#
        )
        .unwrap();

        let config = PipelineConfig::default().load_from_file(file.path()).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/geoseg/public"));
        assert_eq!(config.base_url, "https://geoseg.example.com");
        assert_eq!(config.response_crs, Crs(3857));
        // Absent keys keep their defaults
        assert_eq!(config.tile_source, "Satellite");
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml [[[").unwrap();

        let result = PipelineConfig::default().load_from_file(file.path());
        assert!(matches!(result, Err(GeosegError::ConfigInvalid { .. })));
    }
}
