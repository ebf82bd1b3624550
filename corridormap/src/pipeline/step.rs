//! Step metadata, status and results.

use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Free-form statistics reported by a step.
pub type StepStats = serde_json::Map<String, serde_json::Value>;

/// Static description of one pipeline step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineStep {
    /// Unique key
    pub name: String,
    pub display_name: String,
    pub description: String,
    /// Names of steps this one consumes output from
    pub requires: Vec<String>,
    /// A failure halts the remaining run
    pub critical: bool,
}

impl PipelineStep {
    /// Creates a critical step with no requirements.
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            description: String::new(),
            requires: Vec::new(),
            critical: true,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn requires(mut self, names: &[&str]) -> Self {
        self.requires = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }
}

/// Lifecycle of a step within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Success,
    Failed,
    Skipped,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    /// Single-character marker for the text summary.
    pub fn icon(&self) -> char {
        match self {
            Self::Success => '✓',
            Self::Failed => '✗',
            Self::Skipped => '○',
            Self::Running => '⋯',
            Self::Pending => '·',
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Skipped)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned from a step's work function.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    /// An external collaborator the step needs is not available.
    #[error("{0}")]
    MissingDependency(String),

    /// Any other failure.
    #[error("{0}")]
    Failed(String),
}

impl StepError {
    pub fn missing(message: impl Into<String>) -> Self {
        Self::MissingDependency(message.into())
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

impl From<std::io::Error> for StepError {
    fn from(e: std::io::Error) -> Self {
        Self::Failed(e.to_string())
    }
}

impl From<serde_json::Error> for StepError {
    fn from(e: serde_json::Error) -> Self {
        Self::Failed(e.to_string())
    }
}

impl From<crate::coord::CoordError> for StepError {
    fn from(e: crate::coord::CoordError) -> Self {
        Self::Failed(e.to_string())
    }
}

impl From<crate::download::DownloadError> for StepError {
    fn from(e: crate::download::DownloadError) -> Self {
        Self::Failed(e.to_string())
    }
}

impl From<crate::vector::VectorError> for StepError {
    fn from(e: crate::vector::VectorError) -> Self {
        Self::Failed(e.to_string())
    }
}

impl From<crate::acquisition::AcquisitionError> for StepError {
    fn from(e: crate::acquisition::AcquisitionError) -> Self {
        Self::Failed(e.to_string())
    }
}

/// Record of one step execution, `running` until its work returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    pub name: String,
    pub status: StepStatus,
    #[serde(rename = "duration_seconds", serialize_with = "serialize_secs")]
    pub duration: Duration,
    pub message: String,
    pub error: Option<String>,
    pub stats: StepStats,
}

impl StepResult {
    /// Entry for a step whose work has started but not returned.
    pub fn running(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Running,
            duration: Duration::ZERO,
            message: "Running".to_string(),
            error: None,
            stats: StepStats::new(),
        }
    }

    /// Builds the result for a finished work function.
    pub fn from_outcome(
        name: impl Into<String>,
        outcome: Result<StepStats, StepError>,
        duration: Duration,
    ) -> Self {
        let name = name.into();
        match outcome {
            Ok(stats) => Self {
                name,
                status: StepStatus::Success,
                duration,
                message: "Completed successfully".to_string(),
                error: None,
                stats,
            },
            Err(StepError::MissingDependency(e)) => Self {
                name,
                status: StepStatus::Skipped,
                duration,
                message: format!("Missing dependency: {}", e),
                error: Some(e),
                stats: StepStats::new(),
            },
            Err(StepError::Failed(e)) => Self {
                name,
                status: StepStatus::Failed,
                duration,
                message: format!("Failed: {}", e),
                error: Some(e),
                stats: StepStats::new(),
            },
        }
    }
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_running_entry() {
        let result = StepResult::running("extract_highway");
        assert_eq!(result.status, StepStatus::Running);
        assert!(!result.status.is_terminal());
        assert_eq!(result.duration, Duration::ZERO);
        assert_eq!(result.error, None);
        assert!(result.stats.is_empty());
    }

    #[test]
    fn test_step_builder() {
        let step = PipelineStep::new("generate_heightmap", "Generate Heightmap")
            .description("Convert DEM to heightmap")
            .requires(&["download_dem"])
            .critical(false);

        assert_eq!(step.name, "generate_heightmap");
        assert_eq!(step.requires, vec!["download_dem".to_string()]);
        assert!(!step.critical);
        assert!(PipelineStep::new("a", "A").critical);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_value(StepStatus::Skipped).unwrap(), json!("skipped"));
        assert_eq!(StepStatus::Running.to_string(), "running");
        assert!(StepStatus::Failed.is_terminal());
        assert!(!StepStatus::Pending.is_terminal());
    }

    #[test]
    fn test_success_result() {
        let mut stats = StepStats::new();
        stats.insert("segments".into(), json!(12));

        let result =
            StepResult::from_outcome("extract_highway", Ok(stats), Duration::from_millis(1500));

        assert_eq!(result.status, StepStatus::Success);
        assert_eq!(result.message, "Completed successfully");
        assert_eq!(result.error, None);
        assert_eq!(result.stats["segments"], json!(12));
    }

    #[test]
    fn test_missing_dependency_is_skipped() {
        let result = StepResult::from_outcome(
            "generate_heightmap",
            Err(StepError::missing("no raster reader configured")),
            Duration::ZERO,
        );

        assert_eq!(result.status, StepStatus::Skipped);
        assert_eq!(result.message, "Missing dependency: no raster reader configured");
        assert_eq!(result.error.as_deref(), Some("no raster reader configured"));
    }

    #[test]
    fn test_failure_keeps_message_verbatim() {
        let result = StepResult::from_outcome(
            "transform_vectors",
            Err(StepError::failed("origin validation failed")),
            Duration::ZERO,
        );

        assert_eq!(result.status, StepStatus::Failed);
        assert_eq!(result.message, "Failed: origin validation failed");
        assert_eq!(result.error.as_deref(), Some("origin validation failed"));
    }

    #[test]
    fn test_result_json_shape() {
        let result =
            StepResult::from_outcome("a", Ok(StepStats::new()), Duration::from_millis(250));
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["status"], json!("success"));
        assert_eq!(value["duration_seconds"], json!(0.25));
        assert!(value["error"].is_null());
    }
}
