// warehouse_app/src/store/postgres.rs

//! PostgreSQL `RecordStore` over a `sqlx::PgPool`, using runtime-checked queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{FromRow, Postgres, Transaction};
use std::collections::HashMap;
use tracing::{debug, instrument};
use warehouse::{
  DeleteOutcome, NewProduct, Order, OrderItem, OrderStatus, Product, RecordStore, StoreError, StoreResult,
  StoreTransaction,
};

use crate::config::AppConfig;

const PRODUCT_COLUMNS: &str = "id, name, description, price, quantity";
const ORDER_COLUMNS: &str = "id, created_at, status";
const ITEM_COLUMNS: &str = "id, order_id, product_id, quantity";

#[derive(Debug, FromRow)]
struct ProductRow {
  id: i64,
  name: String,
  description: Option<String>,
  price: Decimal,
  quantity: i32,
}

impl From<ProductRow> for Product {
  fn from(row: ProductRow) -> Self {
    Product {
      id: row.id,
      name: row.name,
      description: row.description,
      price: row.price,
      quantity: row.quantity,
    }
  }
}

#[derive(Debug, FromRow)]
struct OrderRow {
  id: i64,
  created_at: DateTime<Utc>,
  status: String,
}

impl OrderRow {
  fn into_order(self, items: Vec<OrderItem>) -> StoreResult<Order> {
    let status = self
      .status
      .parse::<OrderStatus>()
      .map_err(|_| StoreError::Corrupt(format!("order {} has status '{}'", self.id, self.status)))?;
    Ok(Order {
      id: self.id,
      created_at: self.created_at,
      status,
      items,
    })
  }
}

#[derive(Debug, FromRow)]
struct OrderItemRow {
  id: i64,
  order_id: i64,
  product_id: i64,
  quantity: i32,
}

impl From<OrderItemRow> for OrderItem {
  fn from(row: OrderItemRow) -> Self {
    OrderItem {
      id: row.id,
      order_id: row.order_id,
      product_id: row.product_id,
      quantity: row.quantity,
    }
  }
}

#[derive(Debug, Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  /// Opens a pool sized and timed from the application config.
  pub async fn connect(config: &AppConfig) -> Result<Self, sqlx::Error> {
    let pool = PgPoolOptions::new()
      .max_connections(config.database_max_connections)
      .acquire_timeout(config.database_acquire_timeout)
      .connect(&config.database_url)
      .await?;
    Ok(Self::new(pool))
  }

  pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(&self.pool).await
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }

  pub async fn close(&self) {
    self.pool.close().await;
  }

  async fn items_for(&self, order_ids: &[i64]) -> StoreResult<HashMap<i64, Vec<OrderItem>>> {
    let rows: Vec<OrderItemRow> = sqlx::query_as(&format!(
      "SELECT {} FROM order_items WHERE order_id = ANY($1) ORDER BY id ASC",
      ITEM_COLUMNS
    ))
    .bind(order_ids)
    .fetch_all(&self.pool)
    .await
    .map_err(StoreError::backend)?;

    let mut grouped: HashMap<i64, Vec<OrderItem>> = HashMap::new();
    for row in rows {
      grouped.entry(row.order_id).or_default().push(row.into());
    }
    Ok(grouped)
  }

  async fn hydrate(&self, rows: Vec<OrderRow>) -> StoreResult<Vec<Order>> {
    let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
    let mut items = self.items_for(&ids).await?;
    rows
      .into_iter()
      .map(|row| {
        let order_items = items.remove(&row.id).unwrap_or_default();
        row.into_order(order_items)
      })
      .collect()
  }
}

#[async_trait]
impl RecordStore for PgStore {
  #[instrument(name = "PgStore::begin", skip(self))]
  async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
    let tx = self.pool.begin().await.map_err(StoreError::backend)?;
    debug!("Database transaction opened.");
    Ok(Box::new(PgTransaction { tx }))
  }

  async fn list_products(&self) -> StoreResult<Vec<Product>> {
    let rows: Vec<ProductRow> = sqlx::query_as(&format!("SELECT {} FROM products ORDER BY id ASC", PRODUCT_COLUMNS))
      .fetch_all(&self.pool)
      .await
      .map_err(StoreError::backend)?;
    Ok(rows.into_iter().map(Product::from).collect())
  }

  async fn get_product(&self, id: i64) -> StoreResult<Option<Product>> {
    let row: Option<ProductRow> = sqlx::query_as(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(StoreError::backend)?;
    Ok(row.map(Product::from))
  }

  async fn insert_product(&self, product: NewProduct) -> StoreResult<Product> {
    let row: ProductRow = sqlx::query_as(&format!(
      "INSERT INTO products (name, description, price, quantity) VALUES ($1, $2, $3, $4) RETURNING {}",
      PRODUCT_COLUMNS
    ))
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.quantity)
    .fetch_one(&self.pool)
    .await
    .map_err(StoreError::backend)?;
    Ok(row.into())
  }

  /// Locks the product row first, so a placement cannot attach an item to it between the
  /// reference check and the delete.
  async fn delete_product(&self, id: i64) -> StoreResult<DeleteOutcome> {
    let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;

    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1 FOR UPDATE")
      .bind(id)
      .fetch_optional(&mut *tx)
      .await
      .map_err(StoreError::backend)?;
    if exists.is_none() {
      tx.rollback().await.map_err(StoreError::backend)?;
      return Ok(DeleteOutcome::NotFound);
    }

    let (referenced,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM order_items WHERE product_id = $1)")
      .bind(id)
      .fetch_one(&mut *tx)
      .await
      .map_err(StoreError::backend)?;
    if referenced {
      tx.rollback().await.map_err(StoreError::backend)?;
      return Ok(DeleteOutcome::Referenced);
    }

    sqlx::query("DELETE FROM products WHERE id = $1")
      .bind(id)
      .execute(&mut *tx)
      .await
      .map_err(StoreError::backend)?;
    tx.commit().await.map_err(StoreError::backend)?;
    Ok(DeleteOutcome::Deleted)
  }

  async fn list_orders(&self) -> StoreResult<Vec<Order>> {
    let rows: Vec<OrderRow> = sqlx::query_as(&format!("SELECT {} FROM orders ORDER BY id ASC", ORDER_COLUMNS))
      .fetch_all(&self.pool)
      .await
      .map_err(StoreError::backend)?;
    self.hydrate(rows).await
  }

  async fn get_order(&self, id: i64) -> StoreResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(StoreError::backend)?;
    match row {
      Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
      None => Ok(None),
    }
  }

  async fn set_order_status(&self, id: i64, status: OrderStatus) -> StoreResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!(
      "UPDATE orders SET status = $2 WHERE id = $1 RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(id)
    .bind(status.as_str())
    .fetch_optional(&self.pool)
    .await
    .map_err(StoreError::backend)?;
    match row {
      Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
      None => Ok(None),
    }
  }
}

/// One database transaction. Dropping it without `commit` rolls it back.
pub struct PgTransaction {
  tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgTransaction {
  async fn get_product(&mut self, id: i64) -> StoreResult<Option<Product>> {
    let row: Option<ProductRow> = sqlx::query_as(&format!(
      "SELECT {} FROM products WHERE id = $1 FOR UPDATE",
      PRODUCT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *self.tx)
    .await
    .map_err(StoreError::backend)?;
    Ok(row.map(Product::from))
  }

  async fn save_product(&mut self, product: &Product) -> StoreResult<()> {
    let result =
      sqlx::query("UPDATE products SET name = $2, description = $3, price = $4, quantity = $5 WHERE id = $1")
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.quantity)
        .execute(&mut *self.tx)
        .await
        .map_err(StoreError::backend)?;
    if result.rows_affected() == 0 {
      return Err(StoreError::MissingRow {
        table: "products",
        id: product.id,
      });
    }
    Ok(())
  }

  async fn insert_order(&mut self, status: OrderStatus, created_at: DateTime<Utc>) -> StoreResult<Order> {
    let row: OrderRow = sqlx::query_as(&format!(
      "INSERT INTO orders (status, created_at) VALUES ($1, $2) RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(status.as_str())
    .bind(created_at)
    .fetch_one(&mut *self.tx)
    .await
    .map_err(StoreError::backend)?;
    row.into_order(Vec::new())
  }

  async fn insert_order_item(&mut self, order_id: i64, product_id: i64, quantity: i32) -> StoreResult<OrderItem> {
    let row: OrderItemRow = sqlx::query_as(&format!(
      "INSERT INTO order_items (order_id, product_id, quantity) VALUES ($1, $2, $3) RETURNING {}",
      ITEM_COLUMNS
    ))
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(&mut *self.tx)
    .await
    .map_err(StoreError::backend)?;
    Ok(row.into())
  }

  async fn commit(self: Box<Self>) -> StoreResult<()> {
    self.tx.commit().await.map_err(StoreError::backend)?;
    debug!("Database transaction committed.");
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> StoreResult<()> {
    self.tx.rollback().await.map_err(StoreError::backend)?;
    debug!("Database transaction rolled back.");
    Ok(())
  }
}
