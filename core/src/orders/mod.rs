// warehouse/src/orders/mod.rs

//! Order placement and status management.

pub mod engine;
pub mod placement;

pub use engine::OrderEngine;
pub use placement::PlacementCtx;
