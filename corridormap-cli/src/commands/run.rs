//! Run command - execute the acquisition pipeline.

use corridormap::acquisition::{Collaborators, CorridorPipeline};
use corridormap::pipeline::{ExecutionOrder, RunSummary, StepStatus};
use tracing::warn;

use crate::error::CliError;
use crate::runner::{parse_zoom_list, CliRunner, CommonArgs};

/// Arguments for the run command.
pub struct RunArgs {
    pub common: CommonArgs,
    /// Comma-separated step names; all steps when absent
    pub steps: Option<String>,
    /// Comma-separated zoom levels overriding the active profile
    pub zoom: Option<String>,
    pub topological: bool,
    pub json: bool,
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let mut runner = CliRunner::new(&args.common, args.json)?;
    runner.log_startup("run");

    if let Some(zoom) = &args.zoom {
        runner.config_mut().set_zoom_levels(parse_zoom_list(zoom)?);
    }

    let collaborators = Collaborators::http(runner.config())?;
    let mut pipeline =
        CorridorPipeline::new(runner.config().clone(), runner.layout(), collaborators)?;
    if args.topological {
        pipeline.set_order(ExecutionOrder::Topological);
    }

    let cancel = pipeline.cancellation_token();
    ctrlc::set_handler(move || {
        warn!("Interrupt received, cancelling");
        cancel.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    match parse_step_list(args.steps.as_deref()) {
        Some(names) => pipeline.run_subset(&names)?,
        None => pipeline.run_all()?,
    };

    let summary = pipeline.summary();
    report(&summary, args.json)?;

    if summary.has_critical_failure() {
        return Err(CliError::CriticalFailure(critical_failures(&summary)));
    }
    Ok(())
}

fn report(summary: &RunSummary, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        println!();
        println!("{}", summary);
    }
    Ok(())
}

/// Splits `"a, b"` into step names; `None` for an absent or empty list.
fn parse_step_list(value: Option<&str>) -> Option<Vec<String>> {
    let names: Vec<String> = value?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    (!names.is_empty()).then_some(names)
}

fn critical_failures(summary: &RunSummary) -> Vec<String> {
    summary
        .steps
        .iter()
        .filter(|e| e.critical && e.status == Some(StepStatus::Failed))
        .map(|e| e.name.clone())
        .collect()
}
