//! Sequential step execution with per-step outcome accounting.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use super::registry::{ExecutionOrder, StepRegistry};
use super::step::{PipelineStep, StepError, StepResult, StepStats, StepStatus};
use super::summary::{summarize, RunSummary};
use super::{PipelineError, StepResults};

/// Work function attached to a registered step.
pub type StepWork = Box<dyn FnMut() -> Result<StepStats, StepError>>;

/// Runs registered steps one at a time and keeps the latest results.
///
/// A step error never escapes a run; it becomes a [`StepResult`]. Only a
/// failed critical step stops the run early, and steps after it get no entry.
pub struct Orchestrator {
    registry: StepRegistry,
    work: HashMap<String, StepWork>,
    order: ExecutionOrder,
    results: StepResults,
    last_duration: Duration,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Self {
            registry: StepRegistry::new(),
            work: HashMap::new(),
            order: ExecutionOrder::default(),
            results: StepResults::new(),
            last_duration: Duration::ZERO,
        }
    }

    pub fn with_order(mut self, order: ExecutionOrder) -> Self {
        self.order = order;
        self
    }

    pub fn set_order(&mut self, order: ExecutionOrder) {
        self.order = order;
    }

    /// Registers a step and the function that performs it.
    pub fn register_step<F>(&mut self, step: PipelineStep, work: F) -> Result<(), PipelineError>
    where
        F: FnMut() -> Result<StepStats, StepError> + 'static,
    {
        let name = step.name.clone();
        self.registry.register(step)?;
        self.work.insert(name, Box::new(work));
        Ok(())
    }

    /// Step metadata in declared order.
    pub fn list_steps(&self) -> &[PipelineStep] {
        self.registry.steps()
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    /// Results of the most recent run.
    pub fn results(&self) -> &StepResults {
        &self.results
    }

    /// Runs every registered step in the configured order.
    ///
    /// The dependency graph is validated before anything runs.
    pub fn run_all(&mut self) -> Result<StepResults, PipelineError> {
        let order = self.registry.execution_order(self.order)?;
        info!(steps = order.len(), order = ?self.order, "Starting pipeline");
        Ok(self.run_sequence(&order))
    }

    /// Runs the named steps in the caller's order.
    ///
    /// Unknown names are logged and ignored.
    pub fn run_subset<S: AsRef<str>>(&mut self, names: &[S]) -> Result<StepResults, PipelineError> {
        self.registry.validate()?;

        let mut known = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            if self.registry.contains(name) {
                known.push(name.to_string());
            } else {
                warn!(step = name, "Unknown step, skipping");
            }
        }

        info!(steps = ?known, "Running selected steps");
        Ok(self.run_sequence(&known))
    }

    /// Summary of the most recent run against all declared steps.
    pub fn summary(&self) -> RunSummary {
        summarize(self.registry.steps(), &self.results, self.last_duration)
    }

    fn run_sequence(&mut self, names: &[String]) -> StepResults {
        let started = Instant::now();
        self.results = StepResults::new();

        for name in names {
            let result = self.run_step(name);
            let status = result.status;
            self.results.insert(name.clone(), result);

            let critical = self.registry.get(name).is_some_and(|s| s.critical);
            if critical && status == StepStatus::Failed {
                error!(step = %name, "Critical step failed, pipeline stopping");
                break;
            }
        }

        self.last_duration = started.elapsed();
        self.results.clone()
    }

    /// Records a `running` entry for `name`, runs its work and replaces the
    /// entry with the final result.
    fn run_step(&mut self, name: &str) -> StepResult {
        let display_name = self
            .registry
            .get(name)
            .map(|s| s.display_name.clone())
            .unwrap_or_else(|| name.to_string());

        let Some(work) = self.work.get_mut(name) else {
            return StepResult::from_outcome(
                name,
                Err(StepError::failed(format!("Unknown step: {}", name))),
                Duration::ZERO,
            );
        };

        self.results.insert(name.to_string(), StepResult::running(name));
        info!(step = name, display_name = %display_name, "Step started");
        let started = Instant::now();
        let outcome = work();
        let result = StepResult::from_outcome(name, outcome, started.elapsed());

        match result.status {
            StepStatus::Success => info!(
                step = name,
                duration_secs = result.duration.as_secs_f64(),
                "Step completed"
            ),
            StepStatus::Skipped => warn!(step = name, message = %result.message, "Step skipped"),
            _ => warn!(step = name, message = %result.message, "Step failed"),
        }

        result
    }
}
