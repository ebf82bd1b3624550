//! Corridor configuration.
//!
//! [`CorridorConfig::default`] carries the compiled-in Charlotte corridor and
//! acquisition settings. [`CorridorConfig::load_from`] overlays an INI file:
//!
//! ```ini
//! [bounds]
//! north = 35.37
//! south = 35.08
//! east = -80.65
//! west = -81.00
//! center_lat = 35.227
//! center_lon = -80.843
//!
//! [zoom]
//! profile = development
//! development = 15,16
//! production = 14,15,16,17
//!
//! [tiles]
//! base_url = https://tile.openstreetmap.org
//! rate_limit_delay_ms = 250
//! workers = 4
//! timeout = 30
//!
//! [projection]
//! epsg = 32617
//!
//! [dem]
//! datasets = 3D Elevation Program (3DEP) 1 meter, National Elevation Dataset (NED) 1/3 arc-second
//!
//! [heightmap]
//! target_size = auto
//!
//! [vectors]
//! default_elevation = 0
//! ```

mod parser;
mod settings;

pub use settings::{
    CorridorConfig, DemSettings, HeightmapSettings, TileSettings, VectorSettings, ZoomProfile,
    ZoomSettings, DEFAULT_DEM_DATASETS, DEFAULT_DEM_QUERY_DELAY, DEFAULT_DEVELOPMENT_ZOOMS,
    DEFAULT_EPSG, DEFAULT_PRODUCTION_ZOOMS,
};

use std::path::Path;

use ini::Ini;
use thiserror::Error;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl CorridorConfig {
    /// Loads configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        parser::parse_ini(&ini)
    }

    /// Parses INI text directly.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(ini::Error::Parse)?;
        parser::parse_ini(&ini)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("corridor.ini");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = CorridorConfig::default();

        assert_eq!(config.bounds.name(), "Charlotte I-485 Corridor");
        assert_eq!(config.zoom_levels(), &[15, 16]);
        assert_eq!(config.zoom.production, vec![14, 15, 16, 17]);
        assert_eq!(config.tiles.base_url, "https://tile.openstreetmap.org");
        assert_eq!(config.tiles.rate_limit_delay, Duration::from_millis(250));
        assert_eq!(config.tiles.workers, 4);
        assert_eq!(config.tiles.timeout, Duration::from_secs(30));
        assert_eq!(config.tiles.progress_interval, 50);
        assert_eq!(config.epsg, 32617);
        assert_eq!(config.dem.datasets.len(), 2);
        assert_eq!(config.heightmap.target_size, None);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = CorridorConfig::load_from(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config, CorridorConfig::default());
    }

    #[test]
    fn test_overlay() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "[zoom]\nprofile = production\nproduction = 12, 13\n\n\
             [tiles]\nworkers = 8\nrate_limit_delay_ms = 500\nbase_url = https://tiles.example.com/\n\n\
             [heightmap]\ntarget_size = 1009\n\n\
             [vectors]\ndefault_elevation = 210.5\n",
        );

        let config = CorridorConfig::load_from(&path).unwrap();

        assert_eq!(config.zoom_levels(), &[12, 13]);
        assert_eq!(config.zoom.development, vec![15, 16]);
        assert_eq!(config.tiles.workers, 8);
        assert_eq!(config.tiles.rate_limit_delay, Duration::from_millis(500));
        assert_eq!(config.tiles.base_url, "https://tiles.example.com");
        assert_eq!(config.heightmap.target_size, Some(1009));
        assert_eq!(config.vectors.default_elevation, 210.5);

        let downloader = config.tiles.downloader_config();
        assert_eq!(downloader.workers, 8);
        assert_eq!(downloader.retry.rate_limit_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_bounds_overlay_keeps_unset_edges() {
        let config = CorridorConfig::from_ini_str("[bounds]\nname = Test\nnorth = 35.5\n").unwrap();

        assert_eq!(config.bounds.name(), "Test");
        assert_eq!(config.bounds.north(), 35.5);
        assert_eq!(config.bounds.south(), 35.08);
        assert_eq!(config.bounds.center(), (35.227, -80.843));
    }

    #[test]
    fn test_invalid_bounds() {
        let result = CorridorConfig::from_ini_str("[bounds]\nsouth = 36.0\n");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref section, .. }) if section == "bounds"
        ));
    }

    #[test]
    fn test_invalid_values() {
        let cases = [
            ("[zoom]\ndevelopment = 15,abc\n", "zoom", "development"),
            ("[zoom]\nproduction = 23\n", "zoom", "production"),
            ("[zoom]\nprofile = staging\n", "zoom", "profile"),
            ("[tiles]\nworkers = 0\n", "tiles", "workers"),
            ("[tiles]\nbase_url = ftp://tiles\n", "tiles", "base_url"),
            ("[projection]\nepsg = 4326\n", "projection", "epsg"),
            ("[dem]\ndatasets = ,\n", "dem", "datasets"),
            ("[vectors]\ndefault_elevation = high\n", "vectors", "default_elevation"),
        ];

        for (text, want_section, want_key) in cases {
            match CorridorConfig::from_ini_str(text) {
                Err(ConfigError::InvalidValue { section, key, .. }) => {
                    assert_eq!(section, want_section, "{}", text);
                    assert_eq!(key, want_key, "{}", text);
                }
                other => panic!("expected InvalidValue for {:?}, got {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_projection_overlay() {
        let config = CorridorConfig::from_ini_str("[projection]\nepsg = 32717\n").unwrap();
        assert_eq!(config.epsg, 32717);
    }
}
