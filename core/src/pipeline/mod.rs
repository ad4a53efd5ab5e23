// warehouse/src/pipeline/mod.rs

//! A small step pipeline: ordered, named async steps sharing one lockable context.
//!
//! Order placement is expressed as a `Pipeline<PlacementCtx, WarehouseError>`; the runner
//! is generic so other multi-stage operations can be added the same way.

pub mod context_data;
pub mod control;
pub mod definition;
pub mod execution;
pub mod step;

pub use context_data::ContextData;
pub use control::{PipelineControl, PipelineResult};
pub use definition::Pipeline;
pub use step::{Handler, StepDef};
