// warehouse/src/pipeline/definition.rs

//! `Pipeline<TData, Err>`: step definitions and handler registration.

use super::context_data::ContextData;
use super::control::PipelineControl;
use super::step::{Handler, StepDef};
use crate::error::PipelineError;
use std::collections::HashMap;
use std::future::Future;

/// An ordered list of named steps over the root data type `TData`.
///
/// `Err` is what handlers return; it must absorb `PipelineError` so the runner can
/// report its own failures (such as a missing handler) through the same channel.
pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  pub(crate) steps: Vec<StepDef>,
  pub(crate) on: HashMap<String, Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  /// Creates a pipeline from `(name, optional)` pairs, run in the given order.
  pub fn new(step_defs: &[(&str, bool)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(name, optional)| StepDef {
        name: (*name).to_string(),
        optional: *optional,
      })
      .collect();

    Self {
      steps,
      on: HashMap::new(),
    }
  }

  pub fn steps(&self) -> &[StepDef] {
    &self.steps
  }

  /// Panics when `step_name` is not part of the definition; a typo here is a setup bug.
  fn ensure_step_exists(&self, step_name: &str) {
    if !self.steps.iter().any(|s| s.name == step_name) {
      panic!("Pipeline setup error: step '{}' not found in pipeline definition.", step_name);
    }
  }

  /// Registers a handler for `step_name`. Several handlers on one step run in
  /// registration order.
  pub fn on_root<F, HandlerErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<PipelineControl, HandlerErr>> + Send + 'static,
    HandlerErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler: Handler<TData, Err> = Box::new(move |ctx_data| {
      let fut = handler_fn(ctx_data);
      Box::pin(async move { fut.await.map_err(Into::into) })
    });
    self.on.entry(step_name.to_string()).or_default().push(handler);
  }
}
