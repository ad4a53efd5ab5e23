// warehouse/src/pipeline/execution.rs

//! `Pipeline::run()`: walks the steps in order and invokes their handlers.

use super::context_data::ContextData;
use super::control::{PipelineControl, PipelineResult};
use super::definition::Pipeline;
use crate::error::PipelineError;
use tracing::{event, instrument, span, Level};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  /// Executes every step against `ctx_data`.
  ///
  /// Stops at the first handler error and returns it unchanged. A non-optional step
  /// with no registered handler fails with `PipelineError::HandlerMissing`.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      pipeline_context_data_type = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = span!(
        Level::INFO,
        "pipeline_step",
        step_name = step_name,
        step_index = step_idx,
        optional = step_def.optional
      );

      let handlers = match self.on.get(step_name) {
        Some(handlers) if !handlers.is_empty() => handlers,
        _ if step_def.optional => {
          step_span.in_scope(|| event!(Level::DEBUG, "Optional step has no handlers, skipping."));
          continue;
        }
        _ => {
          step_span.in_scope(|| event!(Level::ERROR, "Non-optional step has no handlers."));
          return Err(Err::from(PipelineError::HandlerMissing {
            step_name: step_def.name.clone(),
          }));
        }
      };

      for (handler_idx, handler_fn) in handlers.iter().enumerate() {
        // Handlers await; the span is attached to the future rather than entered.
        let outcome = tracing::Instrument::instrument(
          handler_fn(ctx_data.clone()),
          span!(parent: &step_span, Level::DEBUG, "on_handler", handler_index = handler_idx),
        )
        .await;

        match outcome {
          Ok(PipelineControl::Continue) => {}
          Ok(PipelineControl::Stop) => {
            step_span.in_scope(|| event!(Level::INFO, "Pipeline stopped by a handler."));
            return Ok(PipelineResult::Stopped);
          }
          Err(e) => {
            step_span.in_scope(|| event!(Level::DEBUG, error = %e, "Handler failed."));
            return Err(e);
          }
        }
      }
      step_span.in_scope(|| event!(Level::DEBUG, "Step finished."));
    }

    event!(Level::DEBUG, "Pipeline execution completed.");
    Ok(PipelineResult::Completed)
  }
}
