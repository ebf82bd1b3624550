//! Run summary across the declared step list.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use super::step::{PipelineStep, StepStats, StepStatus};
use super::StepResults;

/// One declared step's line in the summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    pub name: String,
    pub display_name: String,
    pub critical: bool,
    /// `None` when the step did not run
    pub status: Option<StepStatus>,
    pub duration_seconds: Option<f64>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub stats: Option<StepStats>,
}

/// Aggregate outcome of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub steps: Vec<SummaryEntry>,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    pub not_run: usize,
    pub total_duration_seconds: f64,
}

impl RunSummary {
    /// True if a critical step ended `failed`.
    pub fn has_critical_failure(&self) -> bool {
        self.steps
            .iter()
            .any(|e| e.critical && e.status == Some(StepStatus::Failed))
    }
}

/// Builds a summary for `steps` (declared order) from a result mapping.
///
/// Statuses other than success and failed are counted as skipped.
pub fn summarize(steps: &[PipelineStep], results: &StepResults, total: Duration) -> RunSummary {
    let mut summary = RunSummary {
        steps: Vec::with_capacity(steps.len()),
        success: 0,
        failed: 0,
        skipped: 0,
        not_run: 0,
        total_duration_seconds: total.as_secs_f64(),
    };

    for step in steps {
        let entry = match results.get(&step.name) {
            Some(result) => {
                match result.status {
                    StepStatus::Success => summary.success += 1,
                    StepStatus::Failed => summary.failed += 1,
                    _ => summary.skipped += 1,
                }
                SummaryEntry {
                    name: step.name.clone(),
                    display_name: step.display_name.clone(),
                    critical: step.critical,
                    status: Some(result.status),
                    duration_seconds: Some(result.duration.as_secs_f64()),
                    message: Some(result.message.clone()),
                    error: result.error.clone(),
                    stats: Some(result.stats.clone()),
                }
            }
            None => {
                summary.not_run += 1;
                SummaryEntry {
                    name: step.name.clone(),
                    display_name: step.display_name.clone(),
                    critical: step.critical,
                    status: None,
                    duration_seconds: None,
                    message: None,
                    error: None,
                    stats: None,
                }
            }
        };
        summary.steps.push(entry);
    }

    summary
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(f, "PIPELINE SUMMARY")?;
        writeln!(f, "{}", "=".repeat(60))?;

        for entry in &self.steps {
            match (entry.status, entry.duration_seconds) {
                (Some(status), Some(secs)) => writeln!(
                    f,
                    "  {} {}: {} ({:.1}s)",
                    status.icon(),
                    entry.display_name,
                    status,
                    secs
                )?,
                _ => writeln!(f, "  · {}: not run", entry.display_name)?,
            }
        }

        writeln!(f)?;
        writeln!(
            f,
            "Total: {} success, {} failed, {} skipped",
            self.success, self.failed, self.skipped
        )?;
        write!(f, "Duration: {:.1} seconds", self.total_duration_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{StepError, StepResult};

    fn steps() -> Vec<PipelineStep> {
        vec![
            PipelineStep::new("a", "Step A").critical(false),
            PipelineStep::new("b", "Step B"),
            PipelineStep::new("c", "Step C").critical(false),
            PipelineStep::new("d", "Step D"),
        ]
    }

    fn results() -> StepResults {
        let mut results = StepResults::new();
        results.insert(
            "a".into(),
            StepResult::from_outcome("a", Ok(StepStats::new()), Duration::from_millis(1200)),
        );
        results.insert(
            "b".into(),
            StepResult::from_outcome("b", Err(StepError::failed("boom")), Duration::ZERO),
        );
        results.insert(
            "c".into(),
            StepResult::from_outcome("c", Err(StepError::missing("reader")), Duration::ZERO),
        );
        results
    }

    #[test]
    fn test_counts_match_results() {
        let summary = summarize(&steps(), &results(), Duration::from_secs(2));

        assert_eq!(summary.success, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.not_run, 1);
        assert_eq!(summary.steps.len(), 4);
        assert_eq!(summary.steps[3].status, None);
        assert!(summary.has_critical_failure());
    }

    #[test]
    fn test_running_status_counts_as_skipped() {
        let mut results = StepResults::new();
        let mut stuck = StepResult::from_outcome("a", Ok(StepStats::new()), Duration::ZERO);
        stuck.status = StepStatus::Running;
        results.insert("a".into(), stuck);

        let summary = summarize(&steps(), &results, Duration::ZERO);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.success, 0);
    }

    #[test]
    fn test_non_critical_failure_is_not_critical() {
        let mut results = StepResults::new();
        results.insert(
            "a".into(),
            StepResult::from_outcome("a", Err(StepError::failed("x")), Duration::ZERO),
        );

        let summary = summarize(&steps(), &results, Duration::ZERO);
        assert_eq!(summary.failed, 1);
        assert!(!summary.has_critical_failure());
    }

    #[test]
    fn test_text_report() {
        let text = summarize(&steps(), &results(), Duration::from_secs(2)).to_string();

        assert!(text.contains("✓ Step A: success (1.2s)"));
        assert!(text.contains("✗ Step B: failed (0.0s)"));
        assert!(text.contains("○ Step C: skipped"));
        assert!(text.contains("· Step D: not run"));
        assert!(text.contains("Total: 1 success, 1 failed, 1 skipped"));
        assert!(text.ends_with("Duration: 2.0 seconds"));
    }

    #[test]
    fn test_json_report() {
        let summary = summarize(&steps(), &results(), Duration::ZERO);
        let value = serde_json::to_value(&summary).unwrap();

        assert_eq!(value["steps"][0]["status"], "success");
        assert!(value["steps"][3]["status"].is_null());
        assert_eq!(value["failed"], 1);
    }
}
