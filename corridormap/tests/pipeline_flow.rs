//! End-to-end pipeline runs with in-process collaborators.

use std::cell::Cell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use corridormap::acquisition::{
    AcquisitionError, Collaborators, CorridorPipeline, DataLayout, DemCatalog, HeightmapResampler,
    HighwaySource, RasterBounds, RasterInfo, RasterReader, CENTERLINE_FILE, PRODUCTS_FILE,
    RAW_FILE,
};
use corridormap::config::CorridorConfig;
use corridormap::coord::GeoBounds;
use corridormap::pipeline::{ExecutionOrder, StepStatus};
use serde_json::{json, Value};
use tempfile::TempDir;

struct FixedHighway(Value);

impl HighwaySource for FixedHighway {
    fn fetch(&self, _bounds: &GeoBounds) -> Result<Value, AcquisitionError> {
        Ok(self.0.clone())
    }
}

struct CountingCatalog {
    calls: Rc<Cell<usize>>,
}

impl DemCatalog for CountingCatalog {
    fn query(&self, _bounds: &GeoBounds, dataset: &str) -> Result<Vec<Value>, AcquisitionError> {
        self.calls.set(self.calls.get() + 1);
        if dataset.contains("NED") {
            return Err(AcquisitionError::Http("503 Service Unavailable".into()));
        }
        Ok(vec![json!({
            "title": "USGS 1 Meter 17 x51y391",
            "downloadURL": "https://example.test/x51y391.tif",
            "sizeInBytes": 1024,
        })])
    }
}

struct FlatRaster;

impl RasterReader for FlatRaster {
    fn read_info(&self, _path: &Path) -> Result<RasterInfo, AcquisitionError> {
        Ok(RasterInfo {
            width: 1000,
            height: 1000,
            crs: "EPSG:32617".into(),
            bounds: RasterBounds {
                west: 500_000.0,
                south: 3_890_000.0,
                east: 501_000.0,
                north: 3_891_000.0,
            },
            nodata: None,
            min_elevation: Some(180.0),
            max_elevation: Some(240.0),
            mean_elevation: Some(210.0),
        })
    }
}

impl HeightmapResampler for FlatRaster {
    fn render(
        &self,
        _source: &Path,
        _info: &RasterInfo,
        width: u32,
        height: u32,
        output: &Path,
    ) -> Result<(), AcquisitionError> {
        fs::write(output, format!("{}x{}", width, height))?;
        Ok(())
    }
}

fn highway() -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": "way/1",
                "properties": {"ref": "I 485", "highway": "motorway"},
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[-80.90, 35.20], [-80.85, 35.22]]
                }
            },
            {
                "type": "Feature",
                "id": "way/2",
                "properties": {"ref": "I 485", "highway": "motorway"},
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[-80.85, 35.22], [-80.80, 35.25]]
                }
            }
        ]
    })
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_highway_then_vectors_produces_engine_geojson() {
    let dir = TempDir::new().unwrap();
    let layout = DataLayout::new(dir.path());
    let collaborators = Collaborators::default().with_highway_source(FixedHighway(highway()));
    let mut pipeline =
        CorridorPipeline::new(CorridorConfig::default(), layout.clone(), collaborators).unwrap();

    let results = pipeline
        .run_subset(&["extract_highway", "transform_vectors"])
        .unwrap();

    assert_eq!(results["extract_highway"].status, StepStatus::Success);
    assert_eq!(results["extract_highway"].stats["segments"], json!(2));
    assert_eq!(results["transform_vectors"].status, StepStatus::Success);
    assert_eq!(results["transform_vectors"].stats["files_transformed"], json!(1));

    assert!(layout.osm_dir().join(RAW_FILE).is_file());
    let centerline = read_json(&layout.vectors_dir().join(CENTERLINE_FILE));
    assert_eq!(centerline["features"][0]["geometry"]["type"], "MultiLineString");

    let output = read_json(&layout.unreal_vectors_dir().join("i485_centerline_unreal.geojson"));
    let feature = &output["features"][0];
    assert_eq!(feature["properties"]["_transformed_crs"], "Unreal");
    assert_eq!(feature["geometry"]["type"], "MultiLineString");

    // Every vertex lies within a few kilometres of the corridor center.
    for line in feature["geometry"]["coordinates"].as_array().unwrap() {
        for position in line.as_array().unwrap() {
            let x = position[0].as_f64().unwrap();
            let y = position[1].as_f64().unwrap();
            assert!(x.abs() < 2_000_000.0, "x = {}", x);
            assert!(y.abs() < 2_000_000.0, "y = {}", y);
            assert_eq!(position[2].as_f64().unwrap(), 0.0);
        }
    }
}

#[test]
fn test_rerun_does_not_transform_outputs() {
    let dir = TempDir::new().unwrap();
    let layout = DataLayout::new(dir.path());
    let collaborators = Collaborators::default().with_highway_source(FixedHighway(highway()));
    let mut pipeline =
        CorridorPipeline::new(CorridorConfig::default(), layout.clone(), collaborators).unwrap();

    pipeline
        .run_subset(&["extract_highway", "transform_vectors"])
        .unwrap();
    let results = pipeline.run_subset(&["transform_vectors"]).unwrap();

    assert_eq!(results["transform_vectors"].stats["files_transformed"], json!(1));
    assert!(!layout
        .unreal_vectors_dir()
        .join("i485_centerline_unreal_unreal.geojson")
        .exists());
}

#[test]
fn test_empty_highway_halts_run() {
    let dir = TempDir::new().unwrap();
    let empty = json!({"type": "FeatureCollection", "features": []});
    let collaborators = Collaborators::default().with_highway_source(FixedHighway(empty));
    let mut pipeline = CorridorPipeline::new(
        CorridorConfig::default(),
        DataLayout::new(dir.path()),
        collaborators,
    )
    .unwrap();

    let results = pipeline
        .run_subset(&["extract_highway", "transform_vectors"])
        .unwrap();

    assert_eq!(results["extract_highway"].status, StepStatus::Failed);
    assert!(!results.contains_key("transform_vectors"));

    let summary = pipeline.summary();
    assert!(summary.has_critical_failure());
    assert_eq!(summary.failed, 1);
}

#[test]
fn test_dem_catalogue_continues_past_failed_dataset() {
    let dir = TempDir::new().unwrap();
    let layout = DataLayout::new(dir.path());
    let calls = Rc::new(Cell::new(0));
    let mut config = CorridorConfig::default();
    config.dem.query_delay = std::time::Duration::ZERO;
    let collaborators = Collaborators::default().with_dem_catalog(CountingCatalog {
        calls: Rc::clone(&calls),
    });
    let mut pipeline = CorridorPipeline::new(config, layout.clone(), collaborators).unwrap();

    let results = pipeline.run_subset(&["download_dem"]).unwrap();

    assert_eq!(calls.get(), 2);
    let result = &results["download_dem"];
    assert_eq!(result.status, StepStatus::Success);
    assert_eq!(result.stats["products_found"], json!(1));
    assert_eq!(result.stats["download_urls"], json!(1));

    let saved = read_json(&layout.dem_dir().join(PRODUCTS_FILE));
    assert_eq!(saved["total"], json!(1));
}

#[test]
fn test_heightmap_from_placed_dem() {
    let dir = TempDir::new().unwrap();
    let layout = DataLayout::new(dir.path());
    let collaborators = Collaborators::default().with_raster(FlatRaster, FlatRaster);
    let mut pipeline =
        CorridorPipeline::new(CorridorConfig::default(), layout.clone(), collaborators).unwrap();
    fs::write(layout.dem_dir().join("tile.tif"), b"raster").unwrap();
    fs::write(layout.dem_dir().join("notes.txt"), b"ignored").unwrap();

    let results = pipeline.run_subset(&["generate_heightmap"]).unwrap();

    let result = &results["generate_heightmap"];
    assert_eq!(result.status, StepStatus::Success);
    assert_eq!(result.stats["heightmaps_generated"], json!(1));

    let png = layout.heightmaps_dir().join("tile.png");
    assert_eq!(fs::read_to_string(png).unwrap(), "1009x1009");
    let metadata = read_json(&layout.heightmaps_dir().join("tile.json"));
    assert_eq!(metadata["resampled"], json!(true));
    assert_eq!(metadata["elevation"]["range_meters"], json!(60.0));
}

#[test]
fn test_full_run_without_network_collaborators() {
    let dir = TempDir::new().unwrap();
    let mut pipeline = CorridorPipeline::new(
        CorridorConfig::default(),
        DataLayout::new(dir.path()),
        Collaborators::default(),
    )
    .unwrap();
    pipeline.set_order(ExecutionOrder::Topological);

    let results = pipeline
        .run_subset(&["download_dem", "generate_heightmap", "extract_highway"])
        .unwrap();

    for name in ["download_dem", "generate_heightmap", "extract_highway"] {
        assert_eq!(results[name].status, StepStatus::Skipped, "{}", name);
    }

    let summary = pipeline.summary();
    assert!(!summary.has_critical_failure());
    assert_eq!(summary.skipped, 3);
    assert_eq!(summary.not_run, 2);
}
