//! The corridor pipeline: five steps over a shared context.

use std::path::PathBuf;
use std::rc::Rc;

use serde::Serialize;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::dem::{download_links, fetch_products, DemCatalog, TnmCatalog, PRODUCTS_FILE};
use super::heightmap::{find_dem_files, HeightmapGenerator, HeightmapResampler, RasterReader};
use super::highway::{
    centerline, feature_count, HighwaySource, HighwayStats, OverpassHighwaySource,
    CENTERLINE_FILE, RAW_FILE,
};
use super::layout::DataLayout;
use super::AcquisitionError;
use crate::config::CorridorConfig;
use crate::coord::CoordinateEngine;
use crate::download::download_blocking;
use crate::pipeline::{
    ExecutionOrder, Orchestrator, PipelineError, PipelineStep, RunSummary, StepError, StepResults,
    StepStats,
};
use crate::vector::{VectorTransformer, OUTPUT_SUFFIX};

/// Step names in declared order.
pub const STEP_NAMES: [&str; 5] = [
    "download_tiles",
    "download_dem",
    "extract_highway",
    "generate_heightmap",
    "transform_vectors",
];

/// External services and raster handling used by the steps.
#[derive(Default)]
pub struct Collaborators {
    pub dem_catalog: Option<Box<dyn DemCatalog>>,
    pub highway_source: Option<Box<dyn HighwaySource>>,
    pub raster_reader: Option<Box<dyn RasterReader>>,
    pub resampler: Option<Box<dyn HeightmapResampler>>,
}

impl Collaborators {
    /// HTTP catalogue and highway source; no raster collaborators.
    pub fn http(config: &CorridorConfig) -> Result<Self, AcquisitionError> {
        Ok(Self::default()
            .with_dem_catalog(TnmCatalog::new(config.dem.timeout)?)
            .with_highway_source(OverpassHighwaySource::new(config.tiles.timeout)?))
    }

    pub fn with_dem_catalog(mut self, catalog: impl DemCatalog + 'static) -> Self {
        self.dem_catalog = Some(Box::new(catalog));
        self
    }

    pub fn with_highway_source(mut self, source: impl HighwaySource + 'static) -> Self {
        self.highway_source = Some(Box::new(source));
        self
    }

    pub fn with_raster(
        mut self,
        reader: impl RasterReader + 'static,
        resampler: impl HeightmapResampler + 'static,
    ) -> Self {
        self.raster_reader = Some(Box::new(reader));
        self.resampler = Some(Box::new(resampler));
        self
    }
}

struct StepContext {
    config: CorridorConfig,
    layout: DataLayout,
    engine: CoordinateEngine,
    collaborators: Collaborators,
    cancel: CancellationToken,
}

/// The corridor steps registered on an [`Orchestrator`].
pub struct CorridorPipeline {
    orchestrator: Orchestrator,
    context: Rc<StepContext>,
}

impl CorridorPipeline {
    /// Creates the data directories, builds the coordinate engine and
    /// registers every step.
    pub fn new(
        config: CorridorConfig,
        layout: DataLayout,
        collaborators: Collaborators,
    ) -> Result<Self, AcquisitionError> {
        layout.ensure()?;
        let engine = CoordinateEngine::from_epsg(config.bounds.clone(), config.epsg)?;
        let context = Rc::new(StepContext {
            config,
            layout,
            engine,
            collaborators,
            cancel: CancellationToken::new(),
        });

        let mut orchestrator = Orchestrator::new();
        register(&mut orchestrator, &context)?;
        info!(root = %context.layout.root().display(), "Pipeline ready");

        Ok(Self {
            orchestrator,
            context,
        })
    }

    /// Token that stops the tile download between dispatches.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.context.cancel.clone()
    }

    pub fn set_order(&mut self, order: ExecutionOrder) {
        self.orchestrator.set_order(order);
    }

    pub fn list_steps(&self) -> &[PipelineStep] {
        self.orchestrator.list_steps()
    }

    pub fn layout(&self) -> &DataLayout {
        &self.context.layout
    }

    pub fn engine(&self) -> &CoordinateEngine {
        &self.context.engine
    }

    pub fn run_all(&mut self) -> Result<StepResults, PipelineError> {
        self.orchestrator.run_all()
    }

    pub fn run_subset<S: AsRef<str>>(&mut self, names: &[S]) -> Result<StepResults, PipelineError> {
        self.orchestrator.run_subset(names)
    }

    pub fn results(&self) -> &StepResults {
        self.orchestrator.results()
    }

    pub fn summary(&self) -> RunSummary {
        self.orchestrator.summary()
    }
}

fn register(
    orchestrator: &mut Orchestrator,
    context: &Rc<StepContext>,
) -> Result<(), PipelineError> {
    let steps: [(PipelineStep, fn(&StepContext) -> Result<StepStats, StepError>); 5] = [
        (
            PipelineStep::new("download_tiles", "Download Map Tiles")
                .description("Download OpenStreetMap tiles for the corridor")
                .critical(false),
            download_tiles,
        ),
        (
            PipelineStep::new("download_dem", "Download DEM Data")
                .description("Query the USGS 3DEP catalogue for elevation products")
                .critical(false),
            download_dem,
        ),
        (
            PipelineStep::new("extract_highway", "Extract Highway Geometry")
                .description("Extract I-485 geometry from OpenStreetMap"),
            extract_highway,
        ),
        (
            PipelineStep::new("generate_heightmap", "Generate Heightmap")
                .description("Convert DEM rasters to engine heightmaps")
                .requires(&["download_dem"])
                .critical(false),
            generate_heightmap,
        ),
        (
            PipelineStep::new("transform_vectors", "Transform Vectors")
                .description("Transform GeoJSON vectors into the engine frame")
                .requires(&["extract_highway"]),
            transform_vectors,
        ),
    ];

    for (step, work) in steps {
        let ctx = Rc::clone(context);
        orchestrator.register_step(step, move || work(&ctx))?;
    }
    Ok(())
}

fn to_stats<T: Serialize>(value: &T) -> Result<StepStats, StepError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StepError::failed(format!("stats are not an object: {}", other))),
    }
}

fn download_tiles(ctx: &StepContext) -> Result<StepStats, StepError> {
    let zooms = ctx.config.zoom_levels();
    let output = ctx.layout.tiles_dir();
    info!(zooms = ?zooms, output = %output.display(), "Downloading tiles");

    let stats = download_blocking(
        ctx.engine.bounds(),
        zooms,
        &output,
        ctx.config.tiles.downloader_config(),
        ctx.config.tiles.timeout,
        Some(ctx.cancel.clone()),
    )?;
    to_stats(&stats)
}

fn download_dem(ctx: &StepContext) -> Result<StepStats, StepError> {
    let catalog = ctx
        .collaborators
        .dem_catalog
        .as_deref()
        .ok_or_else(|| StepError::missing("no DEM catalogue configured"))?;

    let products = fetch_products(
        catalog,
        ctx.engine.bounds(),
        &ctx.config.dem.datasets,
        ctx.config.dem.query_delay,
    );
    let products_file = ctx.layout.dem_dir().join(PRODUCTS_FILE);
    products.save(&products_file)?;

    let links = download_links(&products.items);
    info!(
        products = products.total,
        download_urls = links.len(),
        "DEM products catalogued; rasters are placed in raw/dem manually"
    );

    to_stats(&json!({
        "products_found": products.total,
        "download_urls": links.len(),
        "products_file": products_file.display().to_string(),
    }))
}

fn extract_highway(ctx: &StepContext) -> Result<StepStats, StepError> {
    let source = ctx
        .collaborators
        .highway_source
        .as_deref()
        .ok_or_else(|| StepError::missing("no highway source configured"))?;

    let raw = source.fetch(ctx.engine.bounds())?;
    if feature_count(&raw) == 0 {
        return Err(StepError::failed("no highway segments found in corridor"));
    }

    let raw_path = ctx.layout.osm_dir().join(RAW_FILE);
    std::fs::write(&raw_path, serde_json::to_string_pretty(&raw)?)?;

    let line = centerline(&raw)?;
    let centerline_path = ctx.layout.vectors_dir().join(CENTERLINE_FILE);
    std::fs::write(&centerline_path, serde_json::to_string_pretty(&line)?)?;

    let raw_stats = HighwayStats::measure(&raw)?;
    info!(
        segments = raw_stats.segments,
        length_km = raw_stats.length_km,
        centerline = %centerline_path.display(),
        "Highway extracted"
    );

    let mut stats = to_stats(&raw_stats)?;
    stats.insert("raw_file".into(), json!(raw_path.display().to_string()));
    stats.insert(
        "centerline_file".into(),
        json!(centerline_path.display().to_string()),
    );
    Ok(stats)
}

fn generate_heightmap(ctx: &StepContext) -> Result<StepStats, StepError> {
    let (reader, resampler) = match (
        ctx.collaborators.raster_reader.as_deref(),
        ctx.collaborators.resampler.as_deref(),
    ) {
        (Some(reader), Some(resampler)) => (reader, resampler),
        (None, _) => return Err(StepError::missing("no raster reader configured")),
        (_, None) => return Err(StepError::missing("no heightmap resampler configured")),
    };

    let dem_files = find_dem_files(&ctx.layout.dem_dir())?;
    if dem_files.is_empty() {
        info!("No DEM files found; place rasters in raw/dem");
        return to_stats(&json!({"heightmaps_generated": 0, "message": "No DEM files found"}));
    }

    let generator = HeightmapGenerator::new(reader, resampler);
    let output_dir = ctx.layout.heightmaps_dir();
    let mut heightmaps = Vec::new();
    for dem in &dem_files {
        match generator.generate(dem, &output_dir, ctx.config.heightmap.target_size) {
            Ok(metadata) => heightmaps.push(json!({
                "source": metadata.source_file,
                "output": metadata.heightmap_file,
                "resolution": metadata.resolution,
            })),
            Err(e) => warn!(file = %dem.display(), error = %e, "Heightmap generation failed"),
        }
    }

    to_stats(&json!({
        "heightmaps_generated": heightmaps.len(),
        "heightmaps": heightmaps,
    }))
}

fn transform_vectors(ctx: &StepContext) -> Result<StepStats, StepError> {
    let transformer = VectorTransformer::new(&ctx.engine);
    if !transformer.validate_origin() {
        return Err(StepError::failed("Origin transform validation failed"));
    }

    let inputs = vector_inputs(&ctx.layout)?;
    if inputs.is_empty() {
        info!("No GeoJSON files found to transform");
        return to_stats(&json!({"files_transformed": 0}));
    }

    let default_elevation = ctx.config.vectors.default_elevation;
    let mut transformed = Vec::new();
    for input in &inputs {
        match transformer.transform_file(input, None, default_elevation) {
            Ok((_, stats)) => transformed.push(json!({
                "source": file_name(&stats.input_file),
                "output": file_name(&stats.output_file),
                "features": stats.features_transformed,
            })),
            Err(e) => warn!(file = %input.display(), error = %e, "Vector transform failed"),
        }
    }

    to_stats(&json!({
        "files_transformed": transformed.len(),
        "transformed": transformed,
    }))
}

/// `processed/vectors/*.geojson`, excluding already transformed outputs.
fn vector_inputs(layout: &DataLayout) -> Result<Vec<PathBuf>, StepError> {
    let dir = layout.vectors_dir();
    let pattern = format!(
        "{}/*.geojson",
        glob::Pattern::escape(&dir.to_string_lossy())
    );

    let mut inputs = Vec::new();
    for entry in glob::glob(&pattern).map_err(|e| StepError::failed(e.to_string()))? {
        let path = entry.map_err(|e| StepError::failed(e.to_string()))?;
        let is_output = path
            .file_stem()
            .is_some_and(|s| s.to_string_lossy().contains(OUTPUT_SUFFIX));
        if !is_output {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_registration_matches_declared_table() {
        let dir = TempDir::new().unwrap();
        let pipeline = CorridorPipeline::new(
            CorridorConfig::default(),
            DataLayout::new(dir.path()),
            Collaborators::default(),
        )
        .unwrap();

        let steps = pipeline.list_steps();
        let names: Vec<&str> = steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, STEP_NAMES);

        let critical: Vec<bool> = steps.iter().map(|s| s.critical).collect();
        assert_eq!(critical, vec![false, false, true, false, true]);
        assert_eq!(steps[3].requires, vec!["download_dem"]);
        assert_eq!(steps[4].requires, vec!["extract_highway"]);
        assert!(dir.path().join("processed/vectors/unreal").is_dir());
    }

    #[test]
    fn test_missing_collaborators_skip() {
        let dir = TempDir::new().unwrap();
        let mut pipeline = CorridorPipeline::new(
            CorridorConfig::default(),
            DataLayout::new(dir.path()),
            Collaborators::default(),
        )
        .unwrap();

        let results = pipeline
            .run_subset(&["download_dem", "extract_highway", "generate_heightmap"])
            .unwrap();

        for name in ["download_dem", "extract_highway", "generate_heightmap"] {
            assert_eq!(
                results[name].status,
                crate::pipeline::StepStatus::Skipped,
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_vector_inputs_skip_outputs() {
        let dir = TempDir::new().unwrap();
        let layout = DataLayout::new(dir.path());
        layout.ensure().unwrap();
        for name in ["b.geojson", "a.geojson", "a_unreal.geojson", "notes.json"] {
            fs::write(layout.vectors_dir().join(name), "{}").unwrap();
        }

        let names: Vec<String> = vector_inputs(&layout)
            .unwrap()
            .iter()
            .map(|p| file_name(p))
            .collect();

        assert_eq!(names, vec!["a.geojson", "b.geojson"]);
    }

    #[test]
    fn test_unsupported_projection_rejected() {
        let dir = TempDir::new().unwrap();
        let config = CorridorConfig {
            epsg: 4326,
            ..CorridorConfig::default()
        };
        let result =
            CorridorPipeline::new(config, DataLayout::new(dir.path()), Collaborators::default());
        assert!(matches!(result, Err(AcquisitionError::Coord(_))));
    }
}
