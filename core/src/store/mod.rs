// warehouse/src/store/mod.rs

//! The storage contract the engine and catalog consume.
//!
//! `RecordStore` is the long-lived, shared handle created at startup. Anything that must
//! be atomic across rows goes through a `StoreTransaction`, an owned value obtained from
//! `begin()`: `commit` and `rollback` consume it, and dropping it unfinished discards
//! every staged write.

pub mod memory;

pub use memory::MemoryStore;

use crate::error::StoreResult;
use crate::models::{NewProduct, Order, OrderItem, OrderStatus, Product};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Result of `RecordStore::delete_product`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
  Deleted,
  NotFound,
  /// At least one order item points at the product; nothing was deleted.
  Referenced,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
  /// Opens a transaction. Reads through it observe its own staged writes.
  async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>>;

  async fn list_products(&self) -> StoreResult<Vec<Product>>;

  async fn get_product(&self, id: i64) -> StoreResult<Option<Product>>;

  async fn insert_product(&self, product: NewProduct) -> StoreResult<Product>;

  async fn delete_product(&self, id: i64) -> StoreResult<DeleteOutcome>;

  /// All orders, ascending by id, each with its items.
  async fn list_orders(&self) -> StoreResult<Vec<Order>>;

  async fn get_order(&self, id: i64) -> StoreResult<Option<Order>>;

  /// Returns the updated order, or `None` when it does not exist.
  async fn set_order_status(&self, id: i64, status: OrderStatus) -> StoreResult<Option<Order>>;
}

#[async_trait]
pub trait StoreTransaction: Send {
  /// Reads a product and holds it against concurrent writers until the transaction ends.
  ///
  /// Locks are taken in the order products are read, which for placement is request
  /// order. Two transactions touching the same products in opposite order can deadlock
  /// on a database backend; the database aborts one of them, which surfaces as a
  /// retryable `StoreError` and is safe to retry since nothing was committed.
  async fn get_product(&mut self, id: i64) -> StoreResult<Option<Product>>;

  /// Stages an update of an existing product row.
  async fn save_product(&mut self, product: &Product) -> StoreResult<()>;

  /// Stages a new order with no items and returns it with its assigned id.
  async fn insert_order(&mut self, status: OrderStatus, created_at: DateTime<Utc>) -> StoreResult<Order>;

  async fn insert_order_item(&mut self, order_id: i64, product_id: i64, quantity: i32) -> StoreResult<OrderItem>;

  async fn commit(self: Box<Self>) -> StoreResult<()>;

  async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
