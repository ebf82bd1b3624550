//! Step registry and dependency graph validation.

use std::collections::HashSet;

use super::step::PipelineStep;
use super::PipelineError;

/// How the orchestrator sequences a full run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionOrder {
    /// Registration order; `requires` is documentation only.
    #[default]
    Declared,
    /// Dependencies first, ties broken by registration order.
    Topological,
}

/// Ordered set of uniquely named steps.
#[derive(Debug, Clone, Default)]
pub struct StepRegistry {
    steps: Vec<PipelineStep>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a step at the end of the declared order.
    pub fn register(&mut self, step: PipelineStep) -> Result<(), PipelineError> {
        if self.contains(&step.name) {
            return Err(PipelineError::DuplicateStep(step.name));
        }
        self.steps.push(step);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.steps.iter().any(|s| s.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&PipelineStep> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Steps in declared order.
    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Checks that every requirement is registered and the graph is acyclic.
    pub fn validate(&self) -> Result<(), PipelineError> {
        for step in &self.steps {
            for dependency in &step.requires {
                if !self.contains(dependency) {
                    return Err(PipelineError::UnknownDependency {
                        step: step.name.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }
        self.topological_order().map(|_| ())
    }

    /// Step names in the requested order, after validation.
    pub fn execution_order(&self, order: ExecutionOrder) -> Result<Vec<String>, PipelineError> {
        self.validate()?;
        match order {
            ExecutionOrder::Declared => Ok(self.steps.iter().map(|s| s.name.clone()).collect()),
            ExecutionOrder::Topological => self.topological_order(),
        }
    }

    /// Kahn's algorithm, always picking the earliest-declared ready step.
    fn topological_order(&self) -> Result<Vec<String>, PipelineError> {
        let mut done: HashSet<&str> = HashSet::new();
        let mut order = Vec::with_capacity(self.steps.len());

        while order.len() < self.steps.len() {
            let next = self.steps.iter().find(|s| {
                !done.contains(s.name.as_str())
                    && s.requires
                        .iter()
                        .all(|r| done.contains(r.as_str()) || !self.contains(r))
            });

            match next {
                Some(step) => {
                    done.insert(step.name.as_str());
                    order.push(step.name.clone());
                }
                None => {
                    let remaining = self
                        .steps
                        .iter()
                        .filter(|s| !done.contains(s.name.as_str()))
                        .map(|s| s.name.clone())
                        .collect();
                    return Err(PipelineError::DependencyCycle(remaining));
                }
            }
        }

        Ok(order)
    }
}
