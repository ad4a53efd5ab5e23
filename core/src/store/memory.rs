// warehouse/src/store/memory.rs

//! In-process `RecordStore`.
//!
//! A transaction takes the table lock for its whole lifetime and works on a copy of the
//! tables; commit swaps the copy in, rollback (or drop) throws it away. Transactions are
//! therefore fully serialised, which is the strongest isolation the engine can ask for.

use super::{DeleteOutcome, RecordStore, StoreTransaction};
use crate::error::{StoreError, StoreResult};
use crate::models::{NewProduct, Order, OrderItem, OrderStatus, Product};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Default)]
struct Tables {
  products: BTreeMap<i64, Product>,
  orders: BTreeMap<i64, Order>,
  last_product_id: i64,
  last_order_id: i64,
  last_item_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
  *counter += 1;
  *counter
}

impl Tables {
  fn product_is_referenced(&self, product_id: i64) -> bool {
    self
      .orders
      .values()
      .flat_map(|order| order.items.iter())
      .any(|item| item.product_id == product_id)
  }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl RecordStore for MemoryStore {
  #[instrument(name = "MemoryStore::begin", skip(self))]
  async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
    let guard = Arc::clone(&self.tables).lock_owned().await;
    let staged = guard.clone();
    debug!("Memory transaction opened.");
    Ok(Box::new(MemoryTransaction { guard, staged }))
  }

  async fn list_products(&self) -> StoreResult<Vec<Product>> {
    Ok(self.tables.lock().await.products.values().cloned().collect())
  }

  async fn get_product(&self, id: i64) -> StoreResult<Option<Product>> {
    Ok(self.tables.lock().await.products.get(&id).cloned())
  }

  async fn insert_product(&self, product: NewProduct) -> StoreResult<Product> {
    let mut tables = self.tables.lock().await;
    let id = next_id(&mut tables.last_product_id);
    let stored = Product {
      id,
      name: product.name,
      description: product.description,
      price: product.price,
      quantity: product.quantity,
    };
    tables.products.insert(id, stored.clone());
    Ok(stored)
  }

  async fn delete_product(&self, id: i64) -> StoreResult<DeleteOutcome> {
    let mut tables = self.tables.lock().await;
    if !tables.products.contains_key(&id) {
      return Ok(DeleteOutcome::NotFound);
    }
    if tables.product_is_referenced(id) {
      return Ok(DeleteOutcome::Referenced);
    }
    tables.products.remove(&id);
    Ok(DeleteOutcome::Deleted)
  }

  async fn list_orders(&self) -> StoreResult<Vec<Order>> {
    Ok(self.tables.lock().await.orders.values().cloned().collect())
  }

  async fn get_order(&self, id: i64) -> StoreResult<Option<Order>> {
    Ok(self.tables.lock().await.orders.get(&id).cloned())
  }

  async fn set_order_status(&self, id: i64, status: OrderStatus) -> StoreResult<Option<Order>> {
    let mut tables = self.tables.lock().await;
    Ok(tables.orders.get_mut(&id).map(|order| {
      order.status = status;
      order.clone()
    }))
  }
}

/// Holds the table lock until it is committed, rolled back or dropped.
pub struct MemoryTransaction {
  guard: OwnedMutexGuard<Tables>,
  staged: Tables,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
  async fn get_product(&mut self, id: i64) -> StoreResult<Option<Product>> {
    Ok(self.staged.products.get(&id).cloned())
  }

  async fn save_product(&mut self, product: &Product) -> StoreResult<()> {
    match self.staged.products.get_mut(&product.id) {
      Some(row) => {
        *row = product.clone();
        Ok(())
      }
      None => Err(StoreError::MissingRow {
        table: "products",
        id: product.id,
      }),
    }
  }

  async fn insert_order(&mut self, status: OrderStatus, created_at: DateTime<Utc>) -> StoreResult<Order> {
    let id = next_id(&mut self.staged.last_order_id);
    let order = Order {
      id,
      created_at,
      status,
      items: Vec::new(),
    };
    self.staged.orders.insert(id, order.clone());
    Ok(order)
  }

  async fn insert_order_item(&mut self, order_id: i64, product_id: i64, quantity: i32) -> StoreResult<OrderItem> {
    if !self.staged.products.contains_key(&product_id) {
      return Err(StoreError::MissingRow {
        table: "products",
        id: product_id,
      });
    }
    let id = next_id(&mut self.staged.last_item_id);
    let order = self.staged.orders.get_mut(&order_id).ok_or(StoreError::MissingRow {
      table: "orders",
      id: order_id,
    })?;
    let item = OrderItem {
      id,
      order_id,
      product_id,
      quantity,
    };
    order.items.push(item.clone());
    Ok(item)
  }

  async fn commit(self: Box<Self>) -> StoreResult<()> {
    let MemoryTransaction { mut guard, staged } = *self;
    *guard = staged;
    debug!("Memory transaction committed.");
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> StoreResult<()> {
    debug!("Memory transaction rolled back.");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal::Decimal;

  fn widget(quantity: i32) -> NewProduct {
    NewProduct {
      name: "Widget".to_string(),
      description: None,
      price: Decimal::new(300, 2),
      quantity,
    }
  }

  #[tokio::test]
  async fn rollback_discards_staged_writes() {
    let store = MemoryStore::new();
    let product = store.insert_product(widget(10)).await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let mut staged = tx.get_product(product.id).await.unwrap().unwrap();
    staged.quantity = 4;
    tx.save_product(&staged).await.unwrap();
    let order = tx.insert_order(OrderStatus::Processing, Utc::now()).await.unwrap();
    tx.insert_order_item(order.id, product.id, 6).await.unwrap();
    assert_eq!(tx.get_product(product.id).await.unwrap().unwrap().quantity, 4);
    tx.rollback().await.unwrap();

    assert_eq!(store.get_product(product.id).await.unwrap().unwrap().quantity, 10);
    assert!(store.list_orders().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn dropping_an_open_transaction_discards_it_and_releases_the_lock() {
    let store = MemoryStore::new();
    let product = store.insert_product(widget(2)).await.unwrap();
    {
      let mut tx = store.begin().await.unwrap();
      let mut staged = tx.get_product(product.id).await.unwrap().unwrap();
      staged.quantity = 0;
      tx.save_product(&staged).await.unwrap();
    }
    assert_eq!(store.get_product(product.id).await.unwrap().unwrap().quantity, 2);
  }

  #[tokio::test]
  async fn referenced_products_are_not_deleted() {
    let store = MemoryStore::new();
    let product = store.insert_product(widget(5)).await.unwrap();
    let mut tx = store.begin().await.unwrap();
    let order = tx.insert_order(OrderStatus::Shipped, Utc::now()).await.unwrap();
    tx.insert_order_item(order.id, product.id, 1).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(store.delete_product(product.id).await.unwrap(), DeleteOutcome::Referenced);
    assert_eq!(store.delete_product(999).await.unwrap(), DeleteOutcome::NotFound);
  }
}
