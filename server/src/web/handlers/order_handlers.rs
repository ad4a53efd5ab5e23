// warehouse_app/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::{info, instrument};
use warehouse::wire::{OrderRecord, PlaceOrderRequest, UpdateStatusRequest};

use crate::errors::AppError;
use crate::state::AppState;

/// Places the order; the core decides every failure and the error maps to its status.
#[instrument(name = "handler::place_order", skip(app_state, body), fields(items = body.items.len()))]
pub async fn place_order_handler(
  app_state: web::Data<AppState>,
  body: web::Json<PlaceOrderRequest>,
) -> Result<HttpResponse, AppError> {
  let order = app_state.orders.place_order_request(body.into_inner()).await?;
  info!(order_id = order.id, "Order placed.");
  Ok(HttpResponse::Created().json(OrderRecord::from(order)))
}

#[instrument(name = "handler::list_orders", skip(app_state))]
pub async fn list_orders_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let orders: Vec<OrderRecord> = app_state
    .orders
    .list_orders()
    .await?
    .into_iter()
    .map(OrderRecord::from)
    .collect();
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(name = "handler::get_order", skip(app_state, path), fields(order_id = %path.as_ref()))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let order = app_state.orders.get_order(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(OrderRecord::from(order)))
}

#[instrument(name = "handler::update_order_status", skip(app_state, path, body), fields(order_id = %path.as_ref()))]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
  body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
  let order = app_state
    .orders
    .update_status(path.into_inner(), &body.status)
    .await?;
  Ok(HttpResponse::Ok().json(OrderRecord::from(order)))
}
