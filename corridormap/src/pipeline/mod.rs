//! Step registry and orchestrator.
//!
//! Steps are declared with a unique name, a list of steps they depend on and
//! a criticality flag. The [`Orchestrator`] runs them one at a time, turning
//! every outcome into a [`StepResult`]:
//!
//! | work function returns | status |
//! |---|---|
//! | `Ok(stats)` | `success` |
//! | `Err(StepError::MissingDependency)` | `skipped` |
//! | `Err(StepError::Failed)` | `failed` |
//!
//! A failed critical step stops the run.

mod orchestrator;
mod registry;
mod step;
mod summary;

pub use orchestrator::{Orchestrator, StepWork};
pub use registry::{ExecutionOrder, StepRegistry};
pub use step::{PipelineStep, StepError, StepResult, StepStats, StepStatus};
pub use summary::{summarize, RunSummary, SummaryEntry};

use std::collections::HashMap;

use thiserror::Error;

/// Step name to result for one run.
pub type StepResults = HashMap<String, StepResult>;

/// Errors in the step graph itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("Step '{0}' is already registered")]
    DuplicateStep(String),

    #[error("Step '{step}' requires unknown step '{dependency}'")]
    UnknownDependency { step: String, dependency: String },

    #[error("Dependency cycle among steps: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),
}
