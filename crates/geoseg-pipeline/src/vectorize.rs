//! Mask vectorization.
//!
//! Raster mask -> tabular geometry (via the model runtime) -> reprojected,
//! normalized GeoJSON feature collection. The collection is serialized to
//! the canonical vector artifact and parsed back, so the caller always
//! receives exactly what a reader of the artifact would see.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use geo::{ConvexHull, CoordsIter};
use geojson::{Feature, FeatureCollection};

use geoseg_core::error::Result;
use geoseg_core::models::Crs;
use geoseg_core::ports::MaskGenerator;
use geoseg_raster::vector::{
    read_feature_collection, read_vector_table, reproject_geometry, write_feature_collection,
};

/// Port for turning a raster mask into a feature collection
#[async_trait]
pub trait Vectorize: Send + Sync {
    /// Vectorize `mask` through the intermediate `tabular` file, persisting
    /// and returning the normalized collection at `output_vector`.
    async fn vectorize(
        &self,
        mask: &Path,
        tabular: &Path,
        output_vector: &Path,
    ) -> Result<FeatureCollection>;
}

/// The production vectorizer, backed by the model runtime's
/// raster_to_vector capability and GDAL vector reading.
pub struct MaskVectorizer {
    runtime: Arc<dyn MaskGenerator>,
    response_crs: Crs,
}

impl MaskVectorizer {
    pub fn new(runtime: Arc<dyn MaskGenerator>, response_crs: Crs) -> Self {
        Self { runtime, response_crs }
    }
}

#[async_trait]
impl Vectorize for MaskVectorizer {
    async fn vectorize(
        &self,
        mask: &Path,
        tabular: &Path,
        output_vector: &Path,
    ) -> Result<FeatureCollection> {
        self.runtime.raster_to_vector(mask, tabular).await?;

        let table = read_vector_table(tabular)?;
        tracing::info!(
            mask = %mask.display(),
            features = table.features.len(),
            source_epsg = table.crs.0,
            "Vectorized segmentation mask"
        );

        let mut features = Vec::with_capacity(table.features.len());
        for record in table.features {
            let reprojected = reproject_geometry(&record.geometry, table.crs, self.response_crs)?;
            let normalized = normalize_geometry(reprojected);
            features.push(Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::from(&normalized))),
                id: None,
                properties: Some(record.properties),
                foreign_members: None,
            });
        }

        let collection = FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        };

        write_feature_collection(&collection, output_vector)?;
        read_feature_collection(output_vector)
    }
}

/// Reduce any geometry that is not a single polygon to its convex hull.
/// Downstream consumers only handle simple polygons; the hull trades holes
/// and concavity for that guarantee.
pub fn normalize_geometry(geometry: geo::Geometry<f64>) -> geo::Geometry<f64> {
    match geometry {
        geo::Geometry::Polygon(polygon) => geo::Geometry::Polygon(polygon),
        geo::Geometry::MultiPolygon(multi) => geo::Geometry::Polygon(multi.convex_hull()),
        other => {
            let points: geo::MultiPoint<f64> =
                other.coords_iter().map(geo::Point::from).collect();
            geo::Geometry::Polygon(points.convex_hull())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn test_single_polygon_passes_through() {
        let poly = polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 0.0),
            (x: 2.0, y: 2.0),
            (x: 0.0, y: 2.0),
            (x: 0.0, y: 0.0),
        ];
        let normalized = normalize_geometry(poly.clone().into());
        assert_eq!(normalized, geo::Geometry::Polygon(poly));
    }

    #[test]
    fn test_multipolygon_becomes_convex_hull() {
        let a = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ];
        let b = polygon![
            (x: 3.0, y: 3.0),
            (x: 4.0, y: 3.0),
            (x: 4.0, y: 4.0),
            (x: 3.0, y: 3.0),
        ];
        let multi = geo::MultiPolygon(vec![a, b]);

        let normalized = normalize_geometry(multi.into());
        let geo::Geometry::Polygon(hull) = normalized else {
            panic!("expected a polygon");
        };
        // The hull spans both parts
        use geo::BoundingRect;
        let rect = hull.bounding_rect().unwrap();
        assert_eq!(rect.min().x, 0.0);
        assert_eq!(rect.max().x, 4.0);
    }

    #[test]
    fn test_polygon_with_hole_keeps_hole() {
        let outer = vec![
            geo::Coord { x: 0.0, y: 0.0 },
            geo::Coord { x: 10.0, y: 0.0 },
            geo::Coord { x: 10.0, y: 10.0 },
            geo::Coord { x: 0.0, y: 10.0 },
            geo::Coord { x: 0.0, y: 0.0 },
        ];
        let inner = vec![
            geo::Coord { x: 4.0, y: 4.0 },
            geo::Coord { x: 6.0, y: 4.0 },
            geo::Coord { x: 6.0, y: 6.0 },
            geo::Coord { x: 4.0, y: 6.0 },
            geo::Coord { x: 4.0, y: 4.0 },
        ];
        let poly = geo::Polygon::new(outer.into(), vec![inner.into()]);

        let normalized = normalize_geometry(poly.clone().into());
        let geo::Geometry::Polygon(out) = normalized else {
            panic!("expected a polygon");
        };
        assert_eq!(out.interiors().len(), 1, "single polygons keep their holes");
    }
}
