// tests/catalog_tests.rs
mod common;

use common::*;
use rust_decimal::Decimal;
use serial_test::serial;
use std::sync::Arc;
use warehouse::{MemoryStore, OrderEngine, OrderLine, OrderStatus, ProductCatalog, ProductChanges, WarehouseError};

fn catalog_over(store: &MemoryStore) -> ProductCatalog {
  ProductCatalog::new(Arc::new(store.clone()))
}

#[tokio::test]
#[serial]
async fn test_create_assigns_ids_and_normalises_name() {
  setup_tracing();
  let store = MemoryStore::new();
  let catalog = catalog_over(&store);

  let first = catalog.create(new_product("  Shelf  ", 3)).await.unwrap();
  let second = catalog.create(new_product("Bin", 0)).await.unwrap();

  assert_eq!(first.name, "Shelf");
  assert!(second.id > first.id);
  assert_eq!(catalog.list().await.unwrap(), vec![first.clone(), second]);
  assert_eq!(catalog.get(first.id).await.unwrap(), first);
}

#[tokio::test]
#[serial]
async fn test_create_rejects_invalid_fields() {
  setup_tracing();
  let catalog = catalog_over(&MemoryStore::new());

  let mut negative = new_product("Negative", 1);
  negative.quantity = -2;
  assert!(matches!(catalog.create(negative).await, Err(WarehouseError::Validation(_))));

  let mut free = new_product("Free", 1);
  free.price = Decimal::ZERO;
  assert!(matches!(catalog.create(free).await, Err(WarehouseError::Validation(_))));

  assert!(catalog.list().await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_update_changes_only_present_fields() {
  setup_tracing();
  let store = MemoryStore::new();
  let catalog = catalog_over(&store);
  let product = catalog.create(new_product("Crate", 8)).await.unwrap();

  let updated = catalog
    .update(
      product.id,
      ProductChanges {
        quantity: Some(20),
        ..Default::default()
      },
    )
    .await
    .unwrap();

  assert_eq!(updated.quantity, 20);
  assert_eq!(updated.name, "Crate");
  assert_eq!(updated.price, product.price);
  assert_eq!(catalog.get(product.id).await.unwrap(), updated);
}

#[tokio::test]
#[serial]
async fn test_rejected_update_changes_nothing() {
  setup_tracing();
  let store = MemoryStore::new();
  let catalog = catalog_over(&store);
  let product = catalog.create(new_product("Crate", 8)).await.unwrap();

  let err = catalog
    .update(
      product.id,
      ProductChanges {
        name: Some("Renamed".to_string()),
        price: Some(Decimal::new(-1, 0)),
        ..Default::default()
      },
    )
    .await
    .unwrap_err();

  assert!(matches!(err, WarehouseError::Validation(_)));
  assert_eq!(catalog.get(product.id).await.unwrap(), product);

  let missing = catalog.update(777, ProductChanges::default()).await.unwrap_err();
  assert!(matches!(missing, WarehouseError::ProductNotFound { product_id: 777 }));
}

#[tokio::test]
#[serial]
async fn test_delete_missing_and_referenced_products() {
  setup_tracing();
  let store = MemoryStore::new();
  let catalog = catalog_over(&store);
  let ordered = catalog.create(new_product("Ordered", 5)).await.unwrap();
  let spare = catalog.create(new_product("Spare", 5)).await.unwrap();

  OrderEngine::new(Arc::new(store.clone()))
    .place_order(OrderStatus::Processing, vec![OrderLine::new(ordered.id, 1)])
    .await
    .unwrap();

  assert!(matches!(
    catalog.delete(ordered.id).await,
    Err(WarehouseError::ProductInUse { .. })
  ));
  catalog.delete(spare.id).await.unwrap();
  assert!(matches!(
    catalog.delete(spare.id).await,
    Err(WarehouseError::ProductNotFound { .. })
  ));
  assert!(matches!(
    catalog.get(spare.id).await,
    Err(WarehouseError::ProductNotFound { .. })
  ));
  assert_eq!(catalog.list().await.unwrap().len(), 1);
}
