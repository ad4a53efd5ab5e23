// warehouse/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Failures raised by a `RecordStore` or `StoreTransaction` implementation.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("Storage backend failure: {0}")]
  Backend(#[source] AnyhowError),

  #[error("Row {id} in '{table}' vanished while it was being written")]
  MissingRow { table: &'static str, id: i64 },

  #[error("Stored value could not be decoded: {0}")]
  Corrupt(String),
}

impl StoreError {
  /// Wraps any driver error as a backend failure.
  pub fn backend<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    StoreError::Backend(AnyhowError::new(err))
  }
}

/// Errors produced by the step pipeline runner itself rather than by its handlers.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Step '{step_name}' expected an open store transaction but none was held")]
  TransactionUnavailable { step_name: String },

  #[error("Internal pipeline error: {0}")]
  Internal(String),
}

/// Every failure an order or catalog operation can return.
///
/// Domain rejections (`Validation`, `ProductNotFound`, `InsufficientStock`, `InvalidStatus`,
/// `OrderNotFound`, `ProductInUse`) are terminal; retrying without changing the input
/// cannot succeed. `Storage` is the only retryable variant.
#[derive(Debug, Error)]
pub enum WarehouseError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Product {product_id} not found")]
  ProductNotFound { product_id: i64 },

  #[error("Insufficient stock for product {product_id} ('{product_name}'): {available} available, {requested} requested")]
  InsufficientStock {
    product_id: i64,
    product_name: String,
    available: i32,
    requested: i32,
  },

  #[error("Invalid order status: '{0}'")]
  InvalidStatus(String),

  #[error("Order {order_id} not found")]
  OrderNotFound { order_id: i64 },

  #[error("Product {product_id} is referenced by existing orders")]
  ProductInUse { product_id: i64 },

  #[error("Storage Error: {0}")]
  Storage(#[from] StoreError),

  #[error("Workflow Error: {0}")]
  Workflow(#[from] PipelineError),
}

impl WarehouseError {
  /// Machine-readable kind used in failure bodies.
  pub fn kind(&self) -> &'static str {
    match self {
      WarehouseError::Validation(_) => "validation_error",
      WarehouseError::ProductNotFound { .. } => "product_not_found",
      WarehouseError::InsufficientStock { .. } => "insufficient_stock",
      WarehouseError::InvalidStatus(_) => "invalid_status",
      WarehouseError::OrderNotFound { .. } => "order_not_found",
      WarehouseError::ProductInUse { .. } => "product_in_use",
      WarehouseError::Storage(_) => "storage_error",
      WarehouseError::Workflow(_) => "internal_error",
    }
  }

  pub fn is_retryable(&self) -> bool {
    matches!(self, WarehouseError::Storage(_))
  }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub type Result<T, E = WarehouseError> = std::result::Result<T, E>;
