//! Configuration structs and their compiled-in defaults.

use std::time::Duration;

use crate::coord::GeoBounds;
use crate::download::{
    DownloaderConfig, RetryPolicy, DEFAULT_BASE_URL, DEFAULT_PROGRESS_INTERVAL, DEFAULT_TIMEOUT,
    DEFAULT_WORKERS,
};

/// EPSG code of the corridor's projected CRS (UTM zone 17N).
pub const DEFAULT_EPSG: u32 = 32617;

/// Zoom levels for quick iteration.
pub const DEFAULT_DEVELOPMENT_ZOOMS: [u8; 2] = [15, 16];

/// Zoom levels for a full acquisition.
pub const DEFAULT_PRODUCTION_ZOOMS: [u8; 4] = [14, 15, 16, 17];

/// Elevation datasets queried from the product catalogue, in order.
pub const DEFAULT_DEM_DATASETS: [&str; 2] = [
    "3D Elevation Program (3DEP) 1 meter",
    "National Elevation Dataset (NED) 1/3 arc-second",
];

/// Pause between catalogue queries.
pub const DEFAULT_DEM_QUERY_DELAY: Duration = Duration::from_secs(1);

/// Which zoom list a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZoomProfile {
    #[default]
    Development,
    Production,
}

impl std::str::FromStr for ZoomProfile {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(()),
        }
    }
}

/// `[zoom]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoomSettings {
    pub profile: ZoomProfile,
    pub development: Vec<u8>,
    pub production: Vec<u8>,
}

impl Default for ZoomSettings {
    fn default() -> Self {
        Self {
            profile: ZoomProfile::default(),
            development: DEFAULT_DEVELOPMENT_ZOOMS.to_vec(),
            production: DEFAULT_PRODUCTION_ZOOMS.to_vec(),
        }
    }
}

impl ZoomSettings {
    /// Levels for the selected profile.
    pub fn active(&self) -> &[u8] {
        match self.profile {
            ZoomProfile::Development => &self.development,
            ZoomProfile::Production => &self.production,
        }
    }
}

/// `[tiles]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSettings {
    pub base_url: String,
    pub rate_limit_delay: Duration,
    pub workers: usize,
    pub timeout: Duration,
    pub progress_interval: usize,
    pub max_attempts: u32,
}

impl Default for TileSettings {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_limit_delay: retry.rate_limit_delay,
            workers: DEFAULT_WORKERS,
            timeout: DEFAULT_TIMEOUT,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            max_attempts: retry.max_attempts,
        }
    }
}

impl TileSettings {
    pub fn downloader_config(&self) -> DownloaderConfig {
        DownloaderConfig {
            base_url: self.base_url.clone(),
            workers: self.workers,
            progress_interval: self.progress_interval,
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                rate_limit_delay: self.rate_limit_delay,
                ..RetryPolicy::default()
            },
        }
    }
}

/// `[dem]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DemSettings {
    pub datasets: Vec<String>,
    pub query_delay: Duration,
    pub timeout: Duration,
}

impl Default for DemSettings {
    fn default() -> Self {
        Self {
            datasets: DEFAULT_DEM_DATASETS.iter().map(|s| s.to_string()).collect(),
            query_delay: DEFAULT_DEM_QUERY_DELAY,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// `[heightmap]` section.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeightmapSettings {
    /// Forced output size; `None` picks the best standard size per file
    pub target_size: Option<u32>,
}

/// `[vectors]` section.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VectorSettings {
    /// Elevation in meters for positions without a third component
    pub default_elevation: f64,
}

/// Everything a corridor run needs.
#[derive(Debug, Clone, PartialEq)]
pub struct CorridorConfig {
    pub bounds: GeoBounds,
    pub zoom: ZoomSettings,
    pub tiles: TileSettings,
    /// `[projection] epsg`
    pub epsg: u32,
    pub dem: DemSettings,
    pub heightmap: HeightmapSettings,
    pub vectors: VectorSettings,
}

impl Default for CorridorConfig {
    fn default() -> Self {
        Self {
            bounds: GeoBounds::charlotte(),
            zoom: ZoomSettings::default(),
            tiles: TileSettings::default(),
            epsg: DEFAULT_EPSG,
            dem: DemSettings::default(),
            heightmap: HeightmapSettings::default(),
            vectors: VectorSettings::default(),
        }
    }
}

impl CorridorConfig {
    /// Zoom levels for the selected profile.
    pub fn zoom_levels(&self) -> &[u8] {
        self.zoom.active()
    }

    /// Replaces the zoom list of the selected profile.
    pub fn set_zoom_levels(&mut self, levels: Vec<u8>) {
        match self.zoom.profile {
            ZoomProfile::Development => self.zoom.development = levels,
            ZoomProfile::Production => self.zoom.production = levels,
        }
    }
}
