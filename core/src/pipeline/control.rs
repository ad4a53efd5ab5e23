// warehouse/src/pipeline/control.rs

//! Signals for controlling pipeline flow and the outcome of a pipeline run.

/// Returned by a handler to say whether the pipeline should go on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineControl {
  Continue,
  /// Halt immediately; no later handler or step runs.
  Stop,
}

/// Outcome of a full pipeline execution that did not error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult {
  /// Every step ran.
  Completed,
  /// A handler returned `PipelineControl::Stop`.
  Stopped,
}
