// warehouse_app/src/seed.rs

use crate::errors::Result;
use rust_decimal::Decimal;
use tracing::{info, instrument};
use warehouse::{NewProduct, ProductCatalog};

fn sample_products() -> Vec<NewProduct> {
  vec![
    NewProduct {
      name: "Pallet crate".to_string(),
      description: Some("Pine crate, fits a standard euro pallet".to_string()),
      price: Decimal::new(4_250, 2),
      quantity: 40,
    },
    NewProduct {
      name: "Stretch wrap".to_string(),
      description: Some("500 mm x 300 m roll".to_string()),
      price: Decimal::new(1_899, 2),
      quantity: 120,
    },
    NewProduct {
      name: "Shelf bin".to_string(),
      description: None,
      price: Decimal::new(675, 2),
      quantity: 250,
    },
    NewProduct {
      name: "Hand truck".to_string(),
      description: Some("Two-wheel, 250 kg rated".to_string()),
      price: Decimal::new(12_900, 2),
      quantity: 6,
    },
  ]
}

/// Inserts the sample products when the catalog is empty. Returns how many were created.
#[instrument(name = "seed::seed_catalog", skip(catalog))]
pub async fn seed_catalog(catalog: &ProductCatalog) -> Result<usize> {
  if !catalog.list().await?.is_empty() {
    info!("Catalog already has products; skipping seed.");
    return Ok(0);
  }

  let samples = sample_products();
  let count = samples.len();
  for product in samples {
    catalog.create(product).await?;
  }
  info!(count, "Seeded sample products.");
  Ok(count)
}
