// warehouse/src/orders/engine.rs

use super::placement::{build_placement_pipeline, PlacementCtx};
use crate::error::{PipelineError, Result, WarehouseError};
use crate::models::{Order, OrderLine, OrderStatus};
use crate::pipeline::{ContextData, Pipeline, PipelineResult};
use crate::store::RecordStore;
use crate::wire::PlaceOrderRequest;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Places orders and manages their status on top of an injected `RecordStore`.
pub struct OrderEngine {
  store: Arc<dyn RecordStore>,
  placement: Pipeline<PlacementCtx, WarehouseError>,
}

impl OrderEngine {
  pub fn new(store: Arc<dyn RecordStore>) -> Self {
    Self {
      store,
      placement: build_placement_pipeline(),
    }
  }

  /// Validates, decrements stock and persists the order with its items, all or nothing.
  ///
  /// On any failure every staged change (order shell, earlier decrements, earlier items)
  /// is rolled back before the error is returned.
  #[instrument(name = "OrderEngine::place_order", skip(self, lines), fields(status = %status, lines = lines.len()))]
  pub async fn place_order(&self, status: OrderStatus, lines: Vec<OrderLine>) -> Result<Order> {
    let ctx_data = ContextData::new(PlacementCtx::new(self.store.clone(), status, lines));

    let outcome = self.placement.run(ctx_data.clone()).await;
    let failure = match outcome {
      Ok(PipelineResult::Completed) => {
        let mut guard = ctx_data.write();
        match (guard.committed, guard.order.take()) {
          (true, Some(order)) => return Ok(order),
          _ => WarehouseError::Workflow(PipelineError::Internal(
            "placement completed without a committed order".to_string(),
          )),
        }
      }
      Ok(PipelineResult::Stopped) => WarehouseError::Workflow(PipelineError::Internal(
        "placement pipeline stopped before commit".to_string(),
      )),
      Err(e) => e,
    };

    Self::abort(&ctx_data).await;
    Err(failure)
  }

  /// Parses the wire request (status defaults to `processing`) and places the order.
  pub async fn place_order_request(&self, request: PlaceOrderRequest) -> Result<Order> {
    let status = match request.status.as_deref() {
      Some(raw) => raw.parse::<OrderStatus>()?,
      None => OrderStatus::default(),
    };
    let lines = request.items.into_iter().map(Into::into).collect();
    self.place_order(status, lines).await
  }

  /// Rolls back whatever transaction the placement context still holds.
  async fn abort(ctx_data: &ContextData<PlacementCtx>) {
    let open_tx = { ctx_data.read().take_transaction() };
    if let Some(tx) = open_tx {
      match tx.rollback().await {
        Ok(()) => info!("Placement rolled back."),
        // The placement error is what the caller gets; this one is only logged.
        Err(e) => error!(error = %e, "Rollback after failed placement also failed."),
      }
    }
  }

  #[instrument(name = "OrderEngine::get_order", skip(self))]
  pub async fn get_order(&self, order_id: i64) -> Result<Order> {
    self
      .store
      .get_order(order_id)
      .await?
      .ok_or(WarehouseError::OrderNotFound { order_id })
  }

  #[instrument(name = "OrderEngine::list_orders", skip(self))]
  pub async fn list_orders(&self) -> Result<Vec<Order>> {
    Ok(self.store.list_orders().await?)
  }

  /// Sets any member of the status enumeration; the current status does not restrict it.
  /// An unknown value is rejected before the store is touched.
  #[instrument(name = "OrderEngine::update_status", skip(self))]
  pub async fn update_status(&self, order_id: i64, status: &str) -> Result<Order> {
    let status = status.parse::<OrderStatus>().map_err(|e| {
      warn!("Rejected status update for order {}: {}", order_id, e);
      e
    })?;

    match self.store.set_order_status(order_id, status).await? {
      Some(order) => {
        info!(order_id, status = %order.status, "Order status updated.");
        Ok(order)
      }
      None => Err(WarehouseError::OrderNotFound { order_id }),
    }
  }
}
