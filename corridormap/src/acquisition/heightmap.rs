//! DEM to engine heightmap conversion.
//!
//! Raster decoding and resampling live behind [`RasterReader`] and
//! [`HeightmapResampler`]; this module picks the output size, drives the
//! collaborators and writes the metadata sidecar.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use super::AcquisitionError;

/// Engine terrain sizes (2^n + 1 style), smallest first.
pub const STANDARD_SIZES: [u32; 5] = [513, 1009, 2017, 4033, 8065];

/// Extensions recognised as DEM rasters, compared case-insensitively.
pub const DEM_EXTENSIONS: [&str; 4] = ["tif", "tiff", "geotiff", "dem"];

/// Centimeters per meter in the engine frame.
pub const UNREAL_SCALE: f64 = 100.0;

/// Largest value of a 16-bit heightmap sample.
pub const HEIGHTMAP_MAX_VALUE: u32 = 65535;

/// Header and statistics of a DEM raster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RasterInfo {
    pub width: u32,
    pub height: u32,
    pub crs: String,
    pub bounds: RasterBounds,
    pub nodata: Option<f64>,
    pub min_elevation: Option<f64>,
    pub max_elevation: Option<f64>,
    pub mean_elevation: Option<f64>,
}

/// Raster extent in its own CRS units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RasterBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

/// Reads raster headers and elevation statistics.
pub trait RasterReader {
    fn read_info(&self, path: &Path) -> Result<RasterInfo, AcquisitionError>;
}

/// Resamples a DEM to `width x height`, normalizes elevations to the 16-bit
/// range (white highest, nodata black) and writes a grayscale PNG.
pub trait HeightmapResampler {
    fn render(
        &self,
        source: &Path,
        info: &RasterInfo,
        width: u32,
        height: u32,
        output: &Path,
    ) -> Result<(), AcquisitionError>;
}

/// Output size for a `width x height` raster.
///
/// A requested size is used as-is (with a warning if it is not standard).
/// Otherwise the smallest standard size covering the larger dimension is
/// chosen, falling back to the largest standard size.
pub fn target_resolution(width: u32, height: u32, requested: Option<u32>) -> (u32, u32) {
    if let Some(size) = requested {
        if !STANDARD_SIZES.contains(&size) {
            warn!(size, "Requested heightmap size is not a standard terrain size");
        }
        return (size, size);
    }

    let max_dim = width.max(height);
    let size = STANDARD_SIZES
        .iter()
        .copied()
        .find(|s| *s >= max_dim)
        .unwrap_or(STANDARD_SIZES[STANDARD_SIZES.len() - 1]);
    (size, size)
}

/// DEM rasters directly inside `dir`, sorted. A missing directory yields none.
pub fn find_dem_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_dem = path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| DEM_EXTENSIONS.contains(&e.to_lowercase().as_str()));
        if is_dem {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElevationSummary {
    pub min_meters: Option<f64>,
    pub max_meters: Option<f64>,
    pub mean_meters: Option<f64>,
    pub range_meters: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnrealImport {
    pub scale: f64,
    pub min_value: u32,
    pub max_value: u32,
    pub convention: String,
}

/// Sidecar written next to each heightmap as `<stem>.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeightmapMetadata {
    pub source_file: String,
    pub heightmap_file: String,
    pub resolution: Resolution,
    pub source_resolution: Resolution,
    pub resampled: bool,
    pub elevation: ElevationSummary,
    pub unreal: UnrealImport,
    pub crs: String,
    pub bounds: RasterBounds,
}

/// Converts DEM files through a reader and resampler pair.
pub struct HeightmapGenerator<'a> {
    reader: &'a dyn RasterReader,
    resampler: &'a dyn HeightmapResampler,
}

impl<'a> HeightmapGenerator<'a> {
    pub fn new(reader: &'a dyn RasterReader, resampler: &'a dyn HeightmapResampler) -> Self {
        Self { reader, resampler }
    }

    /// Writes `<output_dir>/<stem>.png` and its metadata sidecar.
    pub fn generate(
        &self,
        source: &Path,
        output_dir: &Path,
        target_size: Option<u32>,
    ) -> Result<HeightmapMetadata, AcquisitionError> {
        let info = self.reader.read_info(source)?;
        let (width, height) = target_resolution(info.width, info.height, target_size);
        let resampled = info.width != width || info.height != height;

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        fs::create_dir_all(output_dir)?;
        let output = output_dir.join(format!("{}.png", stem));

        if resampled {
            info!(
                source = %source.display(),
                from = %format_args!("{}x{}", info.width, info.height),
                to = %format_args!("{}x{}", width, height),
                "Resampling DEM"
            );
        }
        self.resampler.render(source, &info, width, height, &output)?;

        let range_meters = match (info.min_elevation, info.max_elevation) {
            (Some(min), Some(max)) => Some(max - min),
            _ => None,
        };
        let metadata = HeightmapMetadata {
            source_file: file_name(source),
            heightmap_file: file_name(&output),
            resolution: Resolution { width, height },
            source_resolution: Resolution {
                width: info.width,
                height: info.height,
            },
            resampled,
            elevation: ElevationSummary {
                min_meters: info.min_elevation,
                max_meters: info.max_elevation,
                mean_meters: info.mean_elevation,
                range_meters,
            },
            unreal: UnrealImport {
                scale: UNREAL_SCALE,
                min_value: 0,
                max_value: HEIGHTMAP_MAX_VALUE,
                convention: "white=highest, black=lowest".to_string(),
            },
            crs: info.crs.clone(),
            bounds: info.bounds,
        };

        fs::write(
            output.with_extension("json"),
            serde_json::to_string_pretty(&metadata)?,
        )?;
        Ok(metadata)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
