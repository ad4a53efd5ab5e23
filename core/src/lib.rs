// src/lib.rs

//! Warehouse: inventory records and all-or-nothing order placement.
//!
//!  - `models`: Product, Order, OrderItem and the closed OrderStatus enumeration.
//!  - `store`: the `RecordStore` / `StoreTransaction` contract the engine consumes,
//!    plus `MemoryStore`, an in-process implementation.
//!  - `orders`: the `OrderEngine`, which checks and decrements stock and persists
//!    an order with its items inside one store transaction.
//!  - `catalog`: product CRUD.
//!  - `wire`: request, response and failure shapes shared with transports.
//!
//! Order placement runs as a named step pipeline (`pipeline`) over a shared,
//! lockable context, so each stage logs under its own span and any failure
//! short-circuits the remaining stages before the engine rolls back.

pub mod catalog;
pub mod error;
pub mod models;
pub mod orders;
pub mod pipeline;
pub mod store;
pub mod wire;

// --- Re-exports for the Public API ---

pub use crate::catalog::ProductCatalog;
pub use crate::error::{PipelineError, Result, StoreError, StoreResult, WarehouseError};
pub use crate::models::{NewProduct, Order, OrderItem, OrderLine, OrderStatus, Product, ProductChanges};
pub use crate::orders::OrderEngine;
pub use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineResult};
pub use crate::store::{DeleteOutcome, MemoryStore, RecordStore, StoreTransaction};

/*
    Placement flow:
    1. Build an `OrderEngine` around an `Arc<dyn RecordStore>` once, at startup.
    2. Call `engine.place_order(status, lines)`.
       - `validate_request` rejects empty or non-positive lines before touching the store.
       - `begin_transaction` opens a store transaction and parks it in the context.
       - `create_order_shell` inserts the order row to obtain its id.
       - `reserve_stock` walks the lines in order: lock product, check, decrement, add item.
       - `commit_transaction` makes everything durable.
    3. On any error the engine takes the transaction back out of the context and rolls it back.
*/
