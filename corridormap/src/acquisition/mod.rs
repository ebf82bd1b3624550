//! Corridor acquisition steps.
//!
//! [`CorridorPipeline`] registers the five corridor steps with an
//! [`Orchestrator`](crate::pipeline::Orchestrator):
//!
//! | step | critical | requires |
//! |---|---|---|
//! | `download_tiles` | no | |
//! | `download_dem` | no | |
//! | `extract_highway` | yes | |
//! | `generate_heightmap` | no | `download_dem` |
//! | `transform_vectors` | yes | `extract_highway` |
//!
//! External services and raster handling sit behind [`DemCatalog`],
//! [`HighwaySource`], [`RasterReader`] and [`HeightmapResampler`]. A step
//! whose collaborator is absent reports `skipped`.

mod dem;
mod heightmap;
mod highway;
mod layout;
mod steps;

pub use dem::{
    download_links, fetch_products, DemCatalog, DemProducts, DownloadLink, TnmCatalog,
    PRODUCTS_FILE, TNM_PRODUCTS_URL,
};
pub use heightmap::{
    find_dem_files, target_resolution, HeightmapGenerator, HeightmapMetadata, HeightmapResampler,
    RasterBounds, RasterInfo, RasterReader, STANDARD_SIZES,
};
pub use highway::{
    centerline, haversine_distance, overpass_to_geojson, HighwaySource, HighwayStats,
    OverpassHighwaySource, CENTERLINE_FILE, RAW_FILE,
};
pub use layout::DataLayout;
pub use steps::{Collaborators, CorridorPipeline, STEP_NAMES};

use std::io;

use thiserror::Error;

use crate::coord::CoordError;
use crate::pipeline::PipelineError;
use crate::vector::VectorError;

/// Errors from acquisition collaborators and step setup.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("Raster error: {0}")]
    Raster(String),

    #[error("Invalid highway ref pattern: {0}")]
    InvalidRefPattern(#[from] regex::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Vector(#[from] VectorError),

    #[error(transparent)]
    Coord(#[from] CoordError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
