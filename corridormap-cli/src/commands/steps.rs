//! Steps command - list registered pipeline steps.

use corridormap::acquisition::{Collaborators, CorridorPipeline};
use corridormap::pipeline::PipelineStep;

use crate::error::CliError;
use crate::runner::{CliRunner, CommonArgs};

/// Run the steps command.
///
/// No collaborators are attached; listing never touches the network.
pub fn run(common: CommonArgs, json: bool) -> Result<(), CliError> {
    let runner = CliRunner::without_logging(&common)?;
    let pipeline = CorridorPipeline::new(
        runner.config().clone(),
        runner.layout(),
        Collaborators::default(),
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(pipeline.list_steps())?);
    } else {
        for line in render(pipeline.list_steps()) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn render(steps: &[PipelineStep]) -> Vec<String> {
    let mut lines = Vec::with_capacity(steps.len() * 2);
    for step in steps {
        let requires = if step.requires.is_empty() {
            "-".to_string()
        } else {
            step.requires.join(", ")
        };
        lines.push(format!(
            "{:<20} {:<28} critical={:<5} requires={}",
            step.name, step.display_name, step.critical, requires
        ));
        if !step.description.is_empty() {
            lines.push(format!("{:<20} {}", "", step.description));
        }
    }
    lines
}
