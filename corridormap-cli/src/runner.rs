//! CLI runner for common setup.
//!
//! Loads configuration, resolves the data directory and starts logging.

use std::path::{Path, PathBuf};

use corridormap::acquisition::DataLayout;
use corridormap::config::CorridorConfig;
use corridormap::coord::CoordinateEngine;
use corridormap::logging::{init_logging_full, LoggingGuard, DEFAULT_LOG_FILE};
use tracing::info;

use crate::error::CliError;

/// Default data root, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct CommonArgs {
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
}

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    _logging_guard: Option<LoggingGuard>,
    config: CorridorConfig,
    data_dir: PathBuf,
}

impl CliRunner {
    /// Loads configuration and starts logging under `<data_dir>/logs`.
    ///
    /// `quiet` keeps log events off stdout so the command can print a
    /// machine-readable report there.
    pub fn new(args: &CommonArgs, quiet: bool) -> Result<Self, CliError> {
        let config = load_config(args.config.as_deref())?;
        let data_dir = args
            .data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let guard = init_logging_full(&data_dir.join("logs"), DEFAULT_LOG_FILE, !quiet)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            _logging_guard: Some(guard),
            config,
            data_dir,
        })
    }

    /// Loads configuration without touching the filesystem or logging.
    pub fn without_logging(args: &CommonArgs) -> Result<Self, CliError> {
        Ok(Self {
            _logging_guard: None,
            config: load_config(args.config.as_deref())?,
            data_dir: args
                .data_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
        })
    }

    pub fn config(&self) -> &CorridorConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut CorridorConfig {
        &mut self.config
    }

    pub fn layout(&self) -> DataLayout {
        DataLayout::new(&self.data_dir)
    }

    /// Coordinate engine for the configured corridor and projection.
    pub fn engine(&self) -> Result<CoordinateEngine, CliError> {
        Ok(CoordinateEngine::from_epsg(
            self.config.bounds.clone(),
            self.config.epsg,
        )?)
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            command,
            corridor = self.config.bounds.name(),
            data_dir = %self.data_dir.display(),
            "CorridorMap starting"
        );
    }
}

fn load_config(path: Option<&Path>) -> Result<CorridorConfig, CliError> {
    match path {
        Some(path) if !path.exists() => Err(CliError::Config(format!(
            "config file not found: {}",
            path.display()
        ))),
        Some(path) => Ok(CorridorConfig::load_from(path)?),
        None => Ok(CorridorConfig::default()),
    }
}

/// Parses `"15,16"` into zoom levels.
pub fn parse_zoom_list(value: &str) -> Result<Vec<u8>, CliError> {
    let levels = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u8>()
                .map_err(|_| CliError::Config(format!("invalid zoom level '{}'", s)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if levels.is_empty() {
        return Err(CliError::Config("no zoom levels given".to_string()));
    }
    Ok(levels)
}
