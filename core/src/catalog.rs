// warehouse/src/catalog.rs

//! Product CRUD on top of the record store.

use crate::error::{Result, WarehouseError};
use crate::models::{NewProduct, Product, ProductChanges};
use crate::store::{DeleteOutcome, RecordStore};
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct ProductCatalog {
  store: Arc<dyn RecordStore>,
}

impl ProductCatalog {
  pub fn new(store: Arc<dyn RecordStore>) -> Self {
    Self { store }
  }

  #[instrument(name = "ProductCatalog::create", skip(self, product), fields(name = %product.name))]
  pub async fn create(&self, product: NewProduct) -> Result<Product> {
    let product = product.validated()?;
    let stored = self.store.insert_product(product).await?;
    info!(product_id = stored.id, quantity = stored.quantity, "Product created.");
    Ok(stored)
  }

  #[instrument(name = "ProductCatalog::list", skip(self))]
  pub async fn list(&self) -> Result<Vec<Product>> {
    Ok(self.store.list_products().await?)
  }

  #[instrument(name = "ProductCatalog::get", skip(self))]
  pub async fn get(&self, product_id: i64) -> Result<Product> {
    self
      .store
      .get_product(product_id)
      .await?
      .ok_or(WarehouseError::ProductNotFound { product_id })
  }

  /// Read-modify-write under the row lock, so it cannot interleave with an order
  /// decrementing the same product.
  #[instrument(name = "ProductCatalog::update", skip(self, changes))]
  pub async fn update(&self, product_id: i64, changes: ProductChanges) -> Result<Product> {
    let mut tx = self.store.begin().await?;
    let mut product = match tx.get_product(product_id).await? {
      Some(product) => product,
      None => {
        tx.rollback().await?;
        return Err(WarehouseError::ProductNotFound { product_id });
      }
    };

    if let Err(e) = product.apply_changes(changes) {
      warn!(product_id, "Rejected product update: {}", e);
      tx.rollback().await?;
      return Err(e);
    }

    tx.save_product(&product).await?;
    tx.commit().await?;
    info!(product_id, "Product updated.");
    Ok(product)
  }

  #[instrument(name = "ProductCatalog::delete", skip(self))]
  pub async fn delete(&self, product_id: i64) -> Result<()> {
    match self.store.delete_product(product_id).await? {
      DeleteOutcome::Deleted => {
        info!(product_id, "Product deleted.");
        Ok(())
      }
      DeleteOutcome::NotFound => Err(WarehouseError::ProductNotFound { product_id }),
      DeleteOutcome::Referenced => Err(WarehouseError::ProductInUse { product_id }),
    }
  }
}
