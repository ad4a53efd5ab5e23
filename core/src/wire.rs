// warehouse/src/wire.rs

//! Transport-independent request, response and failure shapes.

use crate::error::WarehouseError;
use crate::models::{Order, OrderLine, OrderStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRequest {
  pub product_id: i64,
  pub quantity: i32,
}

impl From<OrderLineRequest> for OrderLine {
  fn from(line: OrderLineRequest) -> Self {
    OrderLine::new(line.product_id, line.quantity)
  }
}

/// `status` stays a raw string so an unknown value can be reported as `invalid_status`
/// rather than as a generic decoding error. Omitted means `processing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
  #[serde(default)]
  pub status: Option<String>,
  pub items: Vec<OrderLineRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
  pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRecord {
  pub product_id: i64,
  pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
  pub id: i64,
  pub created_at: DateTime<Utc>,
  pub status: OrderStatus,
  pub items: Vec<OrderLineRecord>,
}

impl From<Order> for OrderRecord {
  fn from(order: Order) -> Self {
    Self {
      id: order.id,
      created_at: order.created_at,
      status: order.status,
      items: order
        .items
        .into_iter()
        .map(|item| OrderLineRecord {
          product_id: item.product_id,
          quantity: item.quantity,
        })
        .collect(),
    }
  }
}

/// Failure body, tagged by `kind`. `error` always carries the human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureBody {
  ValidationError {
    error: String,
  },
  ProductNotFound {
    product_id: i64,
    error: String,
  },
  InsufficientStock {
    product_id: i64,
    product_name: String,
    available: i32,
    requested: i32,
    error: String,
  },
  InvalidStatus {
    value: String,
    error: String,
  },
  OrderNotFound {
    order_id: i64,
    error: String,
  },
  ProductInUse {
    product_id: i64,
    error: String,
  },
  StorageError {
    error: String,
  },
  InternalError {
    error: String,
  },
}

impl From<&WarehouseError> for FailureBody {
  fn from(err: &WarehouseError) -> Self {
    let error = err.to_string();
    match err {
      WarehouseError::Validation(_) => FailureBody::ValidationError { error },
      WarehouseError::ProductNotFound { product_id } => FailureBody::ProductNotFound {
        product_id: *product_id,
        error,
      },
      WarehouseError::InsufficientStock {
        product_id,
        product_name,
        available,
        requested,
      } => FailureBody::InsufficientStock {
        product_id: *product_id,
        product_name: product_name.clone(),
        available: *available,
        requested: *requested,
        error,
      },
      WarehouseError::InvalidStatus(value) => FailureBody::InvalidStatus {
        value: value.clone(),
        error,
      },
      WarehouseError::OrderNotFound { order_id } => FailureBody::OrderNotFound {
        order_id: *order_id,
        error,
      },
      WarehouseError::ProductInUse { product_id } => FailureBody::ProductInUse {
        product_id: *product_id,
        error,
      },
      // Driver details stay in the logs.
      WarehouseError::Storage(_) => FailureBody::StorageError {
        error: "Storage operation failed; the request may be retried.".to_string(),
      },
      WarehouseError::Workflow(_) => FailureBody::InternalError {
        error: "An internal error occurred.".to_string(),
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::StoreError;
  use crate::models::OrderItem;
  use serde_json::json;

  #[test]
  fn insufficient_stock_body_names_the_product() {
    let err = WarehouseError::InsufficientStock {
      product_id: 1,
      product_name: "Crate".to_string(),
      available: 7,
      requested: 8,
    };
    let body = serde_json::to_value(FailureBody::from(&err)).unwrap();
    assert_eq!(body["kind"], "insufficient_stock");
    assert_eq!(body["product_id"], 1);
    assert_eq!(body["product_name"], "Crate");
    assert_eq!(body["available"], 7);
    assert_eq!(body["requested"], 8);
  }

  #[test]
  fn storage_body_hides_driver_details() {
    let err = WarehouseError::from(StoreError::Corrupt("status 'lost' in row 4".to_string()));
    let body = serde_json::to_value(FailureBody::from(&err)).unwrap();
    assert_eq!(body["kind"], "storage_error");
    assert!(!body["error"].as_str().unwrap().contains("lost"));
  }

  #[test]
  fn place_order_request_status_is_optional() {
    let request: PlaceOrderRequest =
      serde_json::from_value(json!({"items": [{"product_id": 1, "quantity": 3}]})).unwrap();
    assert_eq!(request.status, None);
    assert_eq!(OrderLine::from(request.items[0].clone()), OrderLine::new(1, 3));
  }

  #[test]
  fn order_record_keeps_only_product_and_quantity() {
    let order = Order {
      id: 9,
      created_at: Utc::now(),
      status: OrderStatus::Shipped,
      items: vec![OrderItem {
        id: 40,
        order_id: 9,
        product_id: 1,
        quantity: 3,
      }],
    };
    let value = serde_json::to_value(OrderRecord::from(order)).unwrap();
    assert_eq!(value["status"], "shipped");
    assert_eq!(value["items"], json!([{"product_id": 1, "quantity": 3}]));
  }
}
