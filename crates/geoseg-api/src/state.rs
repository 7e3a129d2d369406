use std::sync::Arc;

use geoseg_model::SamHttpClient;
use geoseg_pipeline::{AoiCapture, SegmentationDriver};

use crate::config::ApiConfig;

pub struct AppState {
    pub driver: SegmentationDriver,
    pub capture: AoiCapture,
    pub model: Arc<SamHttpClient>,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(
        driver: SegmentationDriver,
        capture: AoiCapture,
        model: Arc<SamHttpClient>,
        config: ApiConfig,
    ) -> Self {
        Self {
            driver,
            capture,
            model,
            config,
        }
    }
}
