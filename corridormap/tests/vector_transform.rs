//! File-level GeoJSON transforms against the Charlotte corridor engine.

use std::fs;

use corridormap::coord::CoordinateEngine;
use corridormap::vector::{
    coordinate_range, default_output_path, VectorError, VectorTransformer, MAX_EXPECTED_EXTENT_CM,
};
use serde_json::{json, Value};
use tempfile::TempDir;

const CENTER: (f64, f64) = (35.227, -80.843);

fn write_geojson(dir: &TempDir, name: &str, value: &Value) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
    path
}

#[test]
fn test_mixed_collection_round_trip_to_disk() {
    let dir = TempDir::new().unwrap();
    let input = write_geojson(
        &dir,
        "landmarks.geojson",
        &json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"name": "Center"},
                    "geometry": {"type": "Point", "coordinates": [CENTER.1, CENTER.0, 200.0]}
                },
                {
                    "type": "Feature",
                    "properties": {"name": "Lot"},
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[
                            [-80.85, 35.22], [-80.84, 35.22], [-80.84, 35.23], [-80.85, 35.22]
                        ]]
                    }
                },
                {
                    "type": "Feature",
                    "properties": {"name": "Unplaced"},
                    "geometry": null
                }
            ]
        }),
    );

    let engine = CoordinateEngine::charlotte().unwrap();
    let transformer = VectorTransformer::new(&engine);
    let (output, stats) = transformer.transform_file(&input, None, 0.0).unwrap();

    assert_eq!(output, default_output_path(&input));
    assert_eq!(output, dir.path().join("unreal").join("landmarks_unreal.geojson"));
    assert_eq!(stats.features_transformed, 3);

    let written: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written["_metadata"]["source_file"], "landmarks.geojson");
    assert_eq!(written["_metadata"]["origin_unreal"], json!([0, 0, 0]));

    let center = &written["features"][0]["geometry"]["coordinates"];
    assert!(center[0].as_f64().unwrap().abs() <= 1.0);
    assert!(center[1].as_f64().unwrap().abs() <= 1.0);
    assert_eq!(center[2].as_f64().unwrap(), 20_000.0);

    let ring = written["features"][1]["geometry"]["coordinates"][0]
        .as_array()
        .unwrap();
    assert_eq!(ring.len(), 4);
    assert_eq!(ring[0], ring[3]);

    assert!(written["features"][2]["geometry"].is_null());
    assert_eq!(written["features"][2]["properties"]["name"], "Unplaced");

    let range = coordinate_range(&written).unwrap();
    assert_eq!(range.positions, 5);
    assert!(!range.exceeds(MAX_EXPECTED_EXTENT_CM));
}

#[test]
fn test_axis_convention_north_east_up() {
    let engine = CoordinateEngine::charlotte().unwrap();
    let transformer = VectorTransformer::new(&engine);

    let north = json!({"type": "Point", "coordinates": [CENTER.1, CENTER.0 + 0.01]});
    let east = json!({"type": "Point", "coordinates": [CENTER.1 + 0.01, CENTER.0]});

    let north = transformer.transform_document(&north, "n", 0.0).unwrap();
    let east = transformer.transform_document(&east, "e", 0.0).unwrap();

    // 0.01 degrees of latitude is roughly 1.1 km.
    let nx = north["coordinates"][0].as_f64().unwrap();
    assert!((105_000.0..116_000.0).contains(&nx), "nx = {}", nx);
    assert!(north["coordinates"][1].as_f64().unwrap().abs() < 2_000.0);

    let ey = east["coordinates"][1].as_f64().unwrap();
    assert!((85_000.0..97_000.0).contains(&ey), "ey = {}", ey);
    assert!(east["coordinates"][0].as_f64().unwrap().abs() < 2_000.0);
}

#[test]
fn test_malformed_input_leaves_no_output() {
    let dir = TempDir::new().unwrap();
    let input = write_geojson(
        &dir,
        "broken.geojson",
        &json!({"type": "Feature", "geometry": {"type": "Point", "coordinates": [-80.8]}}),
    );

    let engine = CoordinateEngine::charlotte().unwrap();
    let result = VectorTransformer::new(&engine).transform_file(&input, None, 0.0);

    assert!(matches!(result, Err(VectorError::InvalidPosition(1))));
    assert!(!default_output_path(&input).exists());
}

#[test]
fn test_explicit_output_path() {
    let dir = TempDir::new().unwrap();
    let input = write_geojson(
        &dir,
        "road.geojson",
        &json!({"type": "LineString", "coordinates": [[-80.85, 35.22], [-80.84, 35.23]]}),
    );
    let target = dir.path().join("out").join("road.json");

    let engine = CoordinateEngine::charlotte().unwrap();
    let (output, stats) = VectorTransformer::new(&engine)
        .transform_file(&input, Some(&target), 150.0)
        .unwrap();

    assert_eq!(output, target);
    assert_eq!(stats.features_transformed, 1);
    let written: Value = serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
    assert_eq!(written["type"], "LineString");
    assert_eq!(written["coordinates"][1][2].as_f64().unwrap(), 15_000.0);
}
