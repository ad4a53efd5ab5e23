// warehouse/src/orders/placement.rs

//! The order placement pipeline.
//!
//! Steps share a `ContextData<PlacementCtx>`. The open store transaction lives in the
//! context between steps; a step that needs it takes it out, releases the lock, does its
//! awaits, and puts it back before reporting its result. That way the transaction is
//! still in the context when a step fails, and the engine can roll it back.

use crate::error::{PipelineError, Result, WarehouseError};
use crate::models::{Order, OrderItem, OrderLine, OrderStatus};
use crate::pipeline::{ContextData, Pipeline, PipelineControl};
use crate::store::{RecordStore, StoreTransaction};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub(crate) const VALIDATE_REQUEST: &str = "validate_request";
pub(crate) const BEGIN_TRANSACTION: &str = "begin_transaction";
pub(crate) const CREATE_ORDER_SHELL: &str = "create_order_shell";
pub(crate) const RESERVE_STOCK: &str = "reserve_stock";
pub(crate) const COMMIT_TRANSACTION: &str = "commit_transaction";

/// State for one `place_order` call.
pub struct PlacementCtx {
  pub store: Arc<dyn RecordStore>,
  pub status: OrderStatus,
  pub lines: Vec<OrderLine>,
  /// The open transaction, between `begin_transaction` and `commit_transaction`.
  /// Behind a mutex because a store transaction is `Send` but not `Sync`.
  tx: Mutex<Option<Box<dyn StoreTransaction>>>,
  /// Staged order; only durable once `committed` is set.
  pub order: Option<Order>,
  pub committed: bool,
}

impl PlacementCtx {
  pub fn new(store: Arc<dyn RecordStore>, status: OrderStatus, lines: Vec<OrderLine>) -> Self {
    Self {
      store,
      status,
      lines,
      tx: Mutex::new(None),
      order: None,
      committed: false,
    }
  }

  pub(crate) fn take_transaction(&self) -> Option<Box<dyn StoreTransaction>> {
    self.tx.lock().take()
  }

  fn park_transaction(&self, tx: Box<dyn StoreTransaction>) {
    *self.tx.lock() = Some(tx);
  }
}

fn checkout_transaction(ctx: &ContextData<PlacementCtx>, step_name: &str) -> Result<Box<dyn StoreTransaction>> {
  ctx.read().take_transaction().ok_or_else(|| {
    WarehouseError::Workflow(PipelineError::TransactionUnavailable {
      step_name: step_name.to_string(),
    })
  })
}

/// Checks that the request is worth opening a transaction for.
fn validate_lines(lines: &[OrderLine]) -> Result<()> {
  if lines.is_empty() {
    return Err(WarehouseError::Validation("An order needs at least one item.".to_string()));
  }
  if let Some(line) = lines.iter().find(|line| line.quantity <= 0) {
    return Err(WarehouseError::Validation(format!(
      "Quantity for product {} must be positive, got {}.",
      line.product_id, line.quantity
    )));
  }
  Ok(())
}

/// Locks, checks and decrements each product in request order, staging one item per line.
///
/// A product listed twice is read back from the transaction the second time, so its
/// check sees the decrement made for the first occurrence.
async fn reserve_lines(tx: &mut dyn StoreTransaction, order_id: i64, lines: &[OrderLine]) -> Result<Vec<OrderItem>> {
  let mut items = Vec::with_capacity(lines.len());
  for line in lines {
    let mut product = tx
      .get_product(line.product_id)
      .await?
      .ok_or(WarehouseError::ProductNotFound {
        product_id: line.product_id,
      })?;

    if !product.has_stock_for(line.quantity) {
      return Err(WarehouseError::InsufficientStock {
        product_id: product.id,
        product_name: product.name,
        available: product.quantity,
        requested: line.quantity,
      });
    }

    product.quantity -= line.quantity;
    tx.save_product(&product).await?;
    let item = tx.insert_order_item(order_id, product.id, line.quantity).await?;
    debug!(
      order_id,
      product_id = product.id,
      quantity = line.quantity,
      remaining = product.quantity,
      "Stock reserved."
    );
    items.push(item);
  }
  Ok(items)
}

/// Builds the placement pipeline. Built once per engine and reused for every call.
pub(crate) fn build_placement_pipeline() -> Pipeline<PlacementCtx, WarehouseError> {
  let mut p = Pipeline::<PlacementCtx, WarehouseError>::new(&[
    (VALIDATE_REQUEST, false),
    (BEGIN_TRANSACTION, false),
    (CREATE_ORDER_SHELL, false),
    (RESERVE_STOCK, false),
    (COMMIT_TRANSACTION, false),
  ]);

  // Step 1: reject malformed requests before the store is touched.
  p.on_root(VALIDATE_REQUEST, |ctx_data: ContextData<PlacementCtx>| {
    Box::pin(async move {
      let verdict = {
        let guard = ctx_data.read();
        validate_lines(&guard.lines).map(|_| guard.lines.len())
      };
      match verdict {
        Ok(line_count) => {
          debug!(lines = line_count, "Placement request validated.");
          Ok::<_, WarehouseError>(PipelineControl::Continue)
        }
        Err(e) => {
          warn!("Placement rejected before opening a transaction: {}", e);
          Err(e)
        }
      }
    })
  });

  // Step 2: open the transaction and park it in the context.
  p.on_root(BEGIN_TRANSACTION, |ctx_data: ContextData<PlacementCtx>| {
    Box::pin(async move {
      let store = { ctx_data.read().store.clone() };
      let tx = store.begin().await?;
      ctx_data.read().park_transaction(tx);
      Ok::<_, WarehouseError>(PipelineControl::Continue)
    })
  });

  // Step 3: insert the order row to obtain its id.
  p.on_root(CREATE_ORDER_SHELL, |ctx_data: ContextData<PlacementCtx>| {
    Box::pin(async move {
      let status = { ctx_data.read().status };
      let mut tx = checkout_transaction(&ctx_data, CREATE_ORDER_SHELL)?;
      let outcome = tx.insert_order(status, Utc::now()).await;
      ctx_data.read().park_transaction(tx);

      let order = outcome?;
      debug!(order_id = order.id, status = %order.status, "Order shell staged.");
      ctx_data.write().order = Some(order);
      Ok::<_, WarehouseError>(PipelineControl::Continue)
    })
  });

  // Step 4: check and decrement stock for every line.
  p.on_root(RESERVE_STOCK, |ctx_data: ContextData<PlacementCtx>| {
    Box::pin(async move {
      let (order_id, lines) = {
        let guard = ctx_data.read();
        let order_id = guard.order.as_ref().map(|o| o.id).ok_or_else(|| {
          WarehouseError::Workflow(PipelineError::Internal(
            "reserve_stock ran before an order shell was staged".to_string(),
          ))
        })?;
        (order_id, guard.lines.clone())
      };

      let mut tx = checkout_transaction(&ctx_data, RESERVE_STOCK)?;
      let outcome = reserve_lines(tx.as_mut(), order_id, &lines).await;
      ctx_data.read().park_transaction(tx);

      match outcome {
        Ok(items) => {
          if let Some(order) = ctx_data.write().order.as_mut() {
            order.items = items;
          }
          Ok::<_, WarehouseError>(PipelineControl::Continue)
        }
        Err(e) => {
          warn!(order_id, "Stock reservation failed: {}", e);
          Err(e)
        }
      }
    })
  });

  // Step 5: make it durable. A failed commit leaves nothing behind.
  p.on_root(COMMIT_TRANSACTION, |ctx_data: ContextData<PlacementCtx>| {
    Box::pin(async move {
      let tx = checkout_transaction(&ctx_data, COMMIT_TRANSACTION)?;
      tx.commit().await?;
      let mut guard = ctx_data.write();
      guard.committed = true;
      if let Some(order) = guard.order.as_ref() {
        info!(order_id = order.id, items = order.items.len(), "Order committed.");
      }
      Ok::<_, WarehouseError>(PipelineControl::Continue)
    })
  });

  p
}
