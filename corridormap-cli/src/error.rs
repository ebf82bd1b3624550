//! CLI error handling with user-friendly messages.

use std::fmt;
use std::process;

use corridormap::acquisition::AcquisitionError;
use corridormap::config::ConfigError;
use corridormap::coord::CoordError;
use corridormap::pipeline::PipelineError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file or argument error
    Config(String),
    /// Invalid corridor bounds or projection
    Coordinates(CoordError),
    /// Failed to set up the pipeline
    Setup(AcquisitionError),
    /// Invalid step graph
    Pipeline(PipelineError),
    /// Failed to render a report
    Report(serde_json::Error),
    /// The origin check did not pass
    OriginInvalid,
    /// One or more critical steps failed
    CriticalFailure(Vec<String>),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Setup(AcquisitionError::Io(_)) => {
                eprintln!();
                eprintln!("Check that the data directory is writable (--data-dir).");
            }
            CliError::OriginInvalid => {
                eprintln!();
                eprintln!("The corridor center must project to the local origin.");
                eprintln!("Check [bounds] center_lat/center_lon and [projection] epsg.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Coordinates(e) => write!(f, "Coordinate error: {}", e),
            CliError::Setup(e) => write!(f, "Failed to set up pipeline: {}", e),
            CliError::Pipeline(e) => write!(f, "Pipeline error: {}", e),
            CliError::Report(e) => write!(f, "Failed to render report: {}", e),
            CliError::OriginInvalid => write!(f, "Origin validation failed"),
            CliError::CriticalFailure(steps) => {
                write!(f, "Critical step(s) failed: {}", steps.join(", "))
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Coordinates(e) => Some(e),
            CliError::Setup(e) => Some(e),
            CliError::Pipeline(e) => Some(e),
            CliError::Report(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<CoordError> for CliError {
    fn from(e: CoordError) -> Self {
        CliError::Coordinates(e)
    }
}

impl From<AcquisitionError> for CliError {
    fn from(e: AcquisitionError) -> Self {
        CliError::Setup(e)
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        CliError::Pipeline(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Report(e)
    }
}
