//! Vector geometry I/O and CRS normalization.
//!
//! Reads the tabular geometry output of mask vectorization (a GeoPackage
//! layer), reprojects it into a target CRS, and round-trips GeoJSON
//! feature collections through the canonical vector artifact.

use std::path::Path;

use gdal::vector::{FieldValue, LayerAccess};
use gdal::Dataset;
use geo::MapCoords;
use geojson::{Feature, FeatureCollection, GeoJson};
use proj::Proj;
use serde_json::{Map, Value as JsonValue};

use geoseg_core::error::{GeosegError, Result};
use geoseg_core::models::Crs;

/// One geometry + properties record read from a vector layer
#[derive(Debug, Clone)]
pub struct VectorFeature {
    pub geometry: geo::Geometry<f64>,
    pub properties: Map<String, JsonValue>,
}

/// A vector layer in memory, tagged with its source CRS
#[derive(Debug, Clone)]
pub struct VectorTable {
    pub crs: Crs,
    pub features: Vec<VectorFeature>,
}

/// Read the first layer of a vector dataset (GeoPackage or anything GDAL
/// opens). An empty layer is a valid, empty table.
pub fn read_vector_table(path: &Path) -> Result<VectorTable> {
    let dataset = Dataset::open(path)
        .map_err(|e| vectorize_err(path, format!("Failed to open vector dataset: {}", e)))?;

    let mut layer = dataset
        .layer(0)
        .map_err(|e| vectorize_err(path, format!("No readable layer: {}", e)))?;

    let crs = layer
        .spatial_ref()
        .and_then(|sr| sr.auth_code().ok())
        .map(|code| Crs(code as u32))
        .unwrap_or_else(Crs::wgs84);

    let mut features = Vec::new();
    for feature in layer.features() {
        let Some(geometry) = feature.geometry() else {
            continue;
        };
        let geojson_str = geometry
            .json()
            .map_err(|e| vectorize_err(path, format!("Geometry export failed: {}", e)))?;
        let geojson_geom: geojson::Geometry = serde_json::from_str(&geojson_str)
            .map_err(|e| vectorize_err(path, format!("Geometry parse failed: {}", e)))?;
        let geometry = geo::Geometry::<f64>::try_from(&geojson_geom)
            .map_err(|e| vectorize_err(path, format!("Unsupported geometry: {}", e)))?;

        let mut properties = Map::new();
        for (name, value) in feature.fields() {
            properties.insert(name, field_to_json(value));
        }

        features.push(VectorFeature { geometry, properties });
    }

    Ok(VectorTable { crs, features })
}

fn field_to_json(value: Option<FieldValue>) -> JsonValue {
    match value {
        Some(FieldValue::IntegerValue(v)) => JsonValue::from(v),
        Some(FieldValue::Integer64Value(v)) => JsonValue::from(v),
        Some(FieldValue::RealValue(v)) => JsonValue::from(v),
        Some(FieldValue::StringValue(v)) => JsonValue::from(v),
        Some(FieldValue::IntegerListValue(v)) => JsonValue::from(v),
        Some(FieldValue::Integer64ListValue(v)) => JsonValue::from(v),
        Some(FieldValue::RealListValue(v)) => JsonValue::from(v),
        Some(FieldValue::StringListValue(v)) => JsonValue::from(v),
        _ => JsonValue::Null,
    }
}

/// Reproject a geometry between coordinate reference systems. Same source
/// and target is a no-op clone.
pub fn reproject_geometry(
    geometry: &geo::Geometry<f64>,
    from: Crs,
    to: Crs,
) -> Result<geo::Geometry<f64>> {
    if from == to {
        return Ok(geometry.clone());
    }

    let proj = Proj::new_known_crs(&from.authority(), &to.authority(), None).map_err(|e| {
        GeosegError::Reprojection {
            from_epsg: from.0,
            to_epsg: to.0,
            reason: format!("Failed to create projection: {}", e),
        }
    })?;

    geometry.try_map_coords(|coord| {
        proj.convert((coord.x, coord.y))
            .map(|(x, y)| geo::Coord { x, y })
            .map_err(|e| GeosegError::Reprojection {
                from_epsg: from.0,
                to_epsg: to.0,
                reason: format!("Projection failed: {}", e),
            })
    })
}

/// Serialize a feature collection to the canonical vector artifact.
pub fn write_feature_collection(collection: &FeatureCollection, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(collection)
        .map_err(|e| GeosegError::Serialization(e.to_string()))?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Parse a feature collection back from the canonical vector artifact.
pub fn read_feature_collection(path: &Path) -> Result<FeatureCollection> {
    let content = std::fs::read_to_string(path)?;
    let geojson: GeoJson = content
        .parse()
        .map_err(|e| GeosegError::Serialization(format!("{}: {}", path.display(), e)))?;
    match geojson {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        GeoJson::Feature(feature) => Ok(FeatureCollection {
            bbox: None,
            features: vec![feature],
            foreign_members: None,
        }),
        GeoJson::Geometry(geometry) => Ok(FeatureCollection {
            bbox: None,
            features: vec![Feature {
                bbox: None,
                geometry: Some(geometry),
                id: None,
                properties: None,
                foreign_members: None,
            }],
            foreign_members: None,
        }),
    }
}

fn vectorize_err(path: &Path, reason: String) -> GeosegError {
    GeosegError::Vectorize { path: path.to_path_buf(), reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn test_reproject_same_crs_is_identity() {
        let poly: geo::Geometry<f64> = polygon![
            (x: 11.37, y: 44.51),
            (x: 11.39, y: 44.51),
            (x: 11.39, y: 44.53),
            (x: 11.37, y: 44.51),
        ]
        .into();
        let out = reproject_geometry(&poly, Crs::wgs84(), Crs::wgs84()).unwrap();
        assert_eq!(out, poly);
    }

    #[test]
    fn test_feature_collection_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.geojson");

        let poly: geo::Geometry<f64> = polygon![
            (x: 11.37, y: 44.51),
            (x: 11.39, y: 44.51),
            (x: 11.39, y: 44.53),
            (x: 11.37, y: 44.51),
        ]
        .into();
        let collection = FeatureCollection {
            bbox: None,
            features: vec![Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::from(&poly))),
                id: None,
                properties: None,
                foreign_members: None,
            }],
            foreign_members: None,
        };

        write_feature_collection(&collection, &path).unwrap();
        let parsed = read_feature_collection(&path).unwrap();
        assert_eq!(parsed.features.len(), 1);
        assert_eq!(parsed.features[0].geometry, collection.features[0].geometry);
    }

    #[test]
    fn test_read_missing_file_is_error() {
        assert!(read_feature_collection(Path::new("/nonexistent/x.geojson")).is_err());
    }
}
