//! Ordered, fail-fast execution of compiled actions.

use crate::config::Configuration;
use crate::error::{OnboardError, Result};
use crate::systemd::UnitManager;
use std::collections::HashMap;
use std::sync::Arc;

/// Runtime values supplied by the onboarding request, keyed by value name.
pub type RuntimeValues = HashMap<String, String>;

/// One executable side effect.
pub trait Step: Send + Sync {
    fn run(&self, values: &RuntimeValues) -> Result<()>;
}

struct CompiledAction {
    name: String,
    step: Box<dyn Step>,
}

/// The compiled actions of a validated configuration, in declaration order.
///
/// Runs are not serialized here; callers must not execute two runs at once.
#[derive(Default)]
pub struct Pipeline {
    actions: Vec<CompiledAction>,
}

impl Pipeline {
    /// Compile every action of `config`. `config` must have been validated.
    pub fn compile(config: &Configuration, units: Arc<dyn UnitManager>) -> Result<Self> {
        let mut pipeline = Pipeline::default();
        for action in &config.actions {
            pipeline.push(action.name.clone(), action.compile(units.clone())?);
        }
        Ok(pipeline)
    }

    pub fn push(&mut self, name: impl Into<String>, step: Box<dyn Step>) {
        self.actions.push(CompiledAction {
            name: name.into(),
            step,
        });
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(|a| a.name.as_str())
    }

    /// Run every step in order, stopping at the first failure. Steps that
    /// already ran are not undone.
    pub fn execute(&self, values: &RuntimeValues) -> Result<()> {
        for action in &self.actions {
            tracing::debug!(action = %action.name, "executing action");
            if let Err(e) = action.step.run(values) {
                tracing::error!(action = %action.name, error = %e, "action failed");
                return Err(OnboardError::Step {
                    name: action.name.clone(),
                    source: Box::new(e),
                });
            }
        }
        tracing::info!(actions = self.actions.len(), "onboarding complete");
        Ok(())
    }
}
