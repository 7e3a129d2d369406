//! Segmentation driver.
//!
//! Orchestrates the two workflows against the injected collaborators:
//!
//! - automatic: resolve imagery -> generate one whole-image mask ->
//!   vectorize -> assemble;
//! - point-prompted: resolve imagery -> set_image -> predict (once for
//!   single_point, once per point for multi_point) -> vectorize ->
//!   assemble.
//!
//! The predictor is a singleton stateful resource: `set_image` establishes
//! the current image every later `predict` reads. A mutex held across the
//! whole sequence keeps concurrent requests from interleaving on that
//! hidden state. Multi-point loops fail fast: the first error aborts the
//! remaining points and no partial aggregate is returned.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use geojson::FeatureCollection;
use tokio::sync::Mutex;

use geoseg_core::config::PipelineConfig;
use geoseg_core::error::{GeosegError, Result};
use geoseg_core::models::{ActionType, Crs, SegmentRequest};
use geoseg_core::ports::{MaskGenerator, PointPredictor, TileFetcher};
use geoseg_core::{ArtifactKind, ArtifactSet};
use geoseg_raster::ImageryResolver;

use crate::assemble::{ResultAssembler, SegmentResponse};
use crate::metadata::ArtifactMetadata;
use crate::vectorize::{MaskVectorizer, Vectorize};

pub struct SegmentationDriver {
    resolver: ImageryResolver,
    generator: Arc<dyn MaskGenerator>,
    predictor: Arc<dyn PointPredictor>,
    vectorizer: Arc<dyn Vectorize>,
    assembler: ResultAssembler,
    data_dir: PathBuf,
    response_crs: Crs,
    predictor_lock: Mutex<()>,
}

impl SegmentationDriver {
    pub fn new(
        config: &PipelineConfig,
        fetcher: Arc<dyn TileFetcher>,
        generator: Arc<dyn MaskGenerator>,
        predictor: Arc<dyn PointPredictor>,
    ) -> Self {
        let vectorizer = Arc::new(MaskVectorizer::new(generator.clone(), config.response_crs));
        Self::with_vectorizer(config, fetcher, generator, predictor, vectorizer)
    }

    /// Construct with an explicit vectorizer implementation.
    pub fn with_vectorizer(
        config: &PipelineConfig,
        fetcher: Arc<dyn TileFetcher>,
        generator: Arc<dyn MaskGenerator>,
        predictor: Arc<dyn PointPredictor>,
        vectorizer: Arc<dyn Vectorize>,
    ) -> Self {
        Self {
            resolver: ImageryResolver::new(
                fetcher,
                config.data_dir.clone(),
                config.tile_source.clone(),
            ),
            generator,
            predictor,
            vectorizer,
            assembler: ResultAssembler::new(config.data_dir.clone(), config.base_url.clone()),
            data_dir: config.data_dir.clone(),
            response_crs: config.response_crs,
            predictor_lock: Mutex::new(()),
        }
    }

    /// Run the workflow the request selects; unset action_type means
    /// automatic whole-image segmentation.
    pub async fn detect(&self, request: &SegmentRequest) -> Result<SegmentResponse> {
        let result = match request.action_type {
            None => self.detect_automatic(request).await,
            Some(action) => self.detect_predictor(request, action).await,
        };

        if let Err(error) = &result {
            tracing::error!(
                project = %request.project,
                id = %request.id,
                bbox = ?request.bbox.0,
                zoom = request.zoom,
                action = ?request.action_type,
                error = %error,
                "Segmentation pipeline failed"
            );
        }

        result
    }

    /// Automatic workflow: one whole-image mask, one feature collection.
    pub async fn detect_automatic(&self, request: &SegmentRequest) -> Result<SegmentResponse> {
        let artifacts = ArtifactSet::new(&request.project, &request.id);
        tracing::info!(
            project = %request.project,
            id = %request.id,
            bbox = ?request.bbox.0,
            zoom = request.zoom,
            "Processing automatic detection"
        );

        let raster = self.resolver.resolve(request.bbox, request.zoom, &artifacts).await?;

        let mask = self.prepare_path(&artifacts.path(ArtifactKind::Mask))?;
        self.generator.generate(&raster, &mask).await?;

        let collection = self
            .vectorizer
            .vectorize(
                &mask,
                &self.abs(&artifacts.path(ArtifactKind::TabularGeometry)),
                &self.abs(&artifacts.path(ArtifactKind::Vector)),
            )
            .await?;

        self.write_metadata(request)?;
        self.assembler.assemble(collection, &artifacts, request.return_format)
    }

    /// Point-prompted workflow, single or multi-point.
    pub async fn detect_predictor(
        &self,
        request: &SegmentRequest,
        action: ActionType,
    ) -> Result<SegmentResponse> {
        let coords = request.point_coords.as_ref().ok_or_else(|| GeosegError::MissingInput {
            what: "point_coords".to_string(),
        })?;

        let artifacts = ArtifactSet::new(&request.project, &request.id);
        tracing::info!(
            project = %request.project,
            id = %request.id,
            bbox = ?request.bbox.0,
            zoom = request.zoom,
            action = ?action,
            points = coords.len(),
            "Processing point-prompted segmentation"
        );

        let raster = self.resolver.resolve(request.bbox, request.zoom, &artifacts).await?;

        // set_image and every dependent predict run under one guard
        let _guard = self.predictor_lock.lock().await;
        self.predictor.set_image(&raster).await?;

        let collection = match action {
            ActionType::SinglePoint => self.predict_single(request, coords, &artifacts).await?,
            ActionType::MultiPoint => self.predict_multi(request, coords, &artifacts).await?,
        };

        self.write_metadata(request)?;
        self.assembler.assemble(collection, &artifacts, request.return_format)
    }

    async fn predict_single(
        &self,
        request: &SegmentRequest,
        coords: &[(f64, f64)],
        artifacts: &ArtifactSet,
    ) -> Result<FeatureCollection> {
        let labels = request
            .point_labels
            .clone()
            .unwrap_or_else(|| vec![1; coords.len()]);

        let mask = self.prepare_path(&artifacts.path(ArtifactKind::Mask))?;
        self.predictor.predict(coords, &labels, self.response_crs, &mask).await?;

        self.vectorizer
            .vectorize(
                &mask,
                &self.abs(&artifacts.path(ArtifactKind::TabularGeometry)),
                &self.abs(&artifacts.path(ArtifactKind::Vector)),
            )
            .await
    }

    /// One independent prediction per point, each against its own indexed
    /// artifacts; per-point features concatenate in point order, without
    /// deduplication.
    async fn predict_multi(
        &self,
        request: &SegmentRequest,
        coords: &[(f64, f64)],
        artifacts: &ArtifactSet,
    ) -> Result<FeatureCollection> {
        let mut features = Vec::new();

        for (index, point) in coords.iter().enumerate() {
            tracing::info!(
                id = %request.id,
                index = index,
                point = ?point,
                "Predicting point"
            );

            let mask = self.prepare_path(&artifacts.indexed_path(ArtifactKind::Mask, index))?;
            self.predictor
                .predict(&[*point], &[1], self.response_crs, &mask)
                .await?;

            let partial = self
                .vectorizer
                .vectorize(
                    &mask,
                    &self.abs(&artifacts.indexed_path(ArtifactKind::TabularGeometry, index)),
                    &self.abs(&artifacts.indexed_path(ArtifactKind::Vector, index)),
                )
                .await?;

            features.extend(partial.features);
        }

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
    }

    fn write_metadata(&self, request: &SegmentRequest) -> Result<()> {
        ArtifactMetadata {
            project: request.project.clone(),
            id: request.id.clone(),
            bbox: request.bbox,
            zoom: request.zoom,
            action_type: request.action_type,
            created_at: Utc::now(),
        }
        .write(&self.data_dir)
    }

    fn abs(&self, relative: &Path) -> PathBuf {
        self.data_dir.join(relative)
    }

    fn prepare_path(&self, relative: &Path) -> Result<PathBuf> {
        let path = self.abs(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }
}
