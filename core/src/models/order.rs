// warehouse/src/models/order.rs

use crate::error::WarehouseError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of order states. Any member may be set at any time after creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  #[default]
  Processing,
  Shipped,
  Delivered,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 3] = [OrderStatus::Processing, OrderStatus::Shipped, OrderStatus::Delivered];

  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Processing => "processing",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Delivered => "delivered",
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = WarehouseError;

  /// Exact, lowercase match only; anything else is `InvalidStatus` carrying the raw value.
  fn from_str(value: &str) -> Result<Self, Self::Err> {
    OrderStatus::ALL
      .into_iter()
      .find(|status| status.as_str() == value)
      .ok_or_else(|| WarehouseError::InvalidStatus(value.to_string()))
  }
}

/// One requested line of a new order, before anything is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
  pub product_id: i64,
  pub quantity: i32,
}

impl OrderLine {
  pub fn new(product_id: i64, quantity: i32) -> Self {
    Self { product_id, quantity }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
  pub id: i64,
  pub order_id: i64,
  pub product_id: i64,
  pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
  pub id: i64,
  pub created_at: DateTime<Utc>,
  pub status: OrderStatus,
  pub items: Vec<OrderItem>,
}
