// tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every helper.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::Level;
use warehouse::{
  ContextData, DeleteOutcome, MemoryStore, NewProduct, Order, OrderItem, OrderStatus, PipelineControl, PipelineError,
  Product, RecordStore, StoreError, StoreResult, StoreTransaction,
};

// --- Tracing ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Fixtures ---
pub fn new_product(name: &str, quantity: i32) -> NewProduct {
  NewProduct {
    name: name.to_string(),
    description: None,
    price: Decimal::new(999, 2),
    quantity,
  }
}

pub async fn seed(store: &dyn RecordStore, name: &str, quantity: i32) -> Product {
  store
    .insert_product(new_product(name, quantity))
    .await
    .expect("seeding a product into the memory store")
}

pub async fn stock_of(store: &dyn RecordStore, product_id: i64) -> i32 {
  store
    .get_product(product_id)
    .await
    .unwrap()
    .map(|p| p.quantity)
    .expect("product should exist")
}

// --- Pipeline runner fixtures ---
#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub should_stop_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Pipeline framework error: {0}")]
  Pipeline(String),

  #[error("Test handler failed: {0}")]
  Handler(String),
}

impl From<PipelineError> for TestError {
  fn from(pe: PipelineError) -> Self {
    TestError::Pipeline(format!("{:?}", pe))
  }
}

pub fn create_simple_handler(
  step_name: &'static str,
  message_to_append: &'static str,
) -> impl Fn(
  ContextData<TestContext>,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<PipelineControl, TestError>> + Send>>
     + Send
     + Sync
     + 'static {
  move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.message.push_str(message_to_append);
      guard.steps_executed.push(step_name.to_string());
      if guard.should_stop_at.as_deref() == Some(step_name) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  }
}

pub fn create_failing_handler(
  step_name: &'static str,
  error_message: &'static str,
) -> impl Fn(
  ContextData<TestContext>,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<PipelineControl, TestError>> + Send>>
     + Send
     + Sync
     + 'static {
  move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      Err(TestError::Handler(error_message.to_string()))
    })
  }
}

// --- Failure-injecting store ---

/// Which transactional operation the `FlakyStore` should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
  InsertOrder,
  /// Fails the item insert after `after` successful ones.
  InsertOrderItem { after: usize },
  SaveProduct,
  Commit,
  /// Rollback itself errors (the staged writes are still discarded on drop).
  Rollback,
}

fn injected() -> StoreError {
  StoreError::backend(std::io::Error::new(std::io::ErrorKind::Other, "injected storage failure"))
}

/// Wraps a `MemoryStore` and fails one chosen transactional operation.
#[derive(Clone)]
pub struct FlakyStore {
  pub inner: MemoryStore,
  fail_point: FailPoint,
  pub rollbacks: Arc<AtomicUsize>,
  pub commits: Arc<AtomicUsize>,
}

impl FlakyStore {
  pub fn new(inner: MemoryStore, fail_point: FailPoint) -> Self {
    Self {
      inner,
      fail_point,
      rollbacks: Arc::new(AtomicUsize::new(0)),
      commits: Arc::new(AtomicUsize::new(0)),
    }
  }

  pub fn rollback_count(&self) -> usize {
    self.rollbacks.load(Ordering::SeqCst)
  }

  pub fn commit_count(&self) -> usize {
    self.commits.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl RecordStore for FlakyStore {
  async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
    Ok(Box::new(FlakyTransaction {
      inner: self.inner.begin().await?,
      fail_point: self.fail_point,
      items_inserted: 0,
      rollbacks: self.rollbacks.clone(),
      commits: self.commits.clone(),
    }))
  }

  async fn list_products(&self) -> StoreResult<Vec<Product>> {
    self.inner.list_products().await
  }

  async fn get_product(&self, id: i64) -> StoreResult<Option<Product>> {
    self.inner.get_product(id).await
  }

  async fn insert_product(&self, product: NewProduct) -> StoreResult<Product> {
    self.inner.insert_product(product).await
  }

  async fn delete_product(&self, id: i64) -> StoreResult<DeleteOutcome> {
    self.inner.delete_product(id).await
  }

  async fn list_orders(&self) -> StoreResult<Vec<Order>> {
    self.inner.list_orders().await
  }

  async fn get_order(&self, id: i64) -> StoreResult<Option<Order>> {
    self.inner.get_order(id).await
  }

  async fn set_order_status(&self, id: i64, status: OrderStatus) -> StoreResult<Option<Order>> {
    self.inner.set_order_status(id, status).await
  }
}

struct FlakyTransaction {
  inner: Box<dyn StoreTransaction>,
  fail_point: FailPoint,
  items_inserted: usize,
  rollbacks: Arc<AtomicUsize>,
  commits: Arc<AtomicUsize>,
}

#[async_trait]
impl StoreTransaction for FlakyTransaction {
  async fn get_product(&mut self, id: i64) -> StoreResult<Option<Product>> {
    self.inner.get_product(id).await
  }

  async fn save_product(&mut self, product: &Product) -> StoreResult<()> {
    if self.fail_point == FailPoint::SaveProduct {
      return Err(injected());
    }
    self.inner.save_product(product).await
  }

  async fn insert_order(&mut self, status: OrderStatus, created_at: DateTime<Utc>) -> StoreResult<Order> {
    if self.fail_point == FailPoint::InsertOrder {
      return Err(injected());
    }
    self.inner.insert_order(status, created_at).await
  }

  async fn insert_order_item(&mut self, order_id: i64, product_id: i64, quantity: i32) -> StoreResult<OrderItem> {
    if let FailPoint::InsertOrderItem { after } = self.fail_point {
      if self.items_inserted >= after {
        return Err(injected());
      }
    }
    self.items_inserted += 1;
    self.inner.insert_order_item(order_id, product_id, quantity).await
  }

  async fn commit(self: Box<Self>) -> StoreResult<()> {
    if self.fail_point == FailPoint::Commit {
      // Dropping `inner` discards the staged writes, as a failed database commit would.
      return Err(injected());
    }
    self.commits.fetch_add(1, Ordering::SeqCst);
    self.inner.commit().await
  }

  async fn rollback(self: Box<Self>) -> StoreResult<()> {
    self.rollbacks.fetch_add(1, Ordering::SeqCst);
    if self.fail_point == FailPoint::Rollback {
      return Err(injected());
    }
    self.inner.rollback().await
  }
}
