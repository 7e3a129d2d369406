use std::env;

use geoseg_core::config::PipelineConfig;

/// API server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    pub cors_origin: String,
    pub model_url: String,
    pub pipeline: PipelineConfig,
}

impl ApiConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let port = env::var("GEOSEG_PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(8000);

        let cors_origin = env::var("GEOSEG_CORS_ORIGIN").unwrap_or_else(|_| "*".to_string());

        let model_url =
            env::var("GEOSEG_MODEL_URL").unwrap_or_else(|_| "http://localhost:8500".to_string());

        // GEOSEG_TILE_SOURCE accepts a named source or an {x}/{y}/{z} template
        let pipeline = PipelineConfig::default().load_from_env();

        Self {
            port,
            cors_origin,
            model_url,
            pipeline,
        }
    }

    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
