// warehouse/src/models/product.rs

use crate::error::{Result, WarehouseError};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub id: i64,
  pub name: String,
  pub description: Option<String>,
  pub price: Decimal,
  /// Quantity on hand. Never negative.
  pub quantity: i32,
}

/// Fields for a product that does not exist yet; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  pub price: Decimal,
  pub quantity: i32,
}

/// A partial update. Absent fields are left as they are.
///
/// `description` has three states: absent (keep), `null` (clear), a string (replace).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductChanges {
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default, deserialize_with = "present_or_null")]
  pub description: Option<Option<String>>,
  #[serde(default)]
  pub price: Option<Decimal>,
  #[serde(default)]
  pub quantity: Option<i32>,
}

fn present_or_null<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) fn validate_name(name: &str) -> Result<String> {
  let trimmed = name.trim();
  if trimmed.is_empty() {
    return Err(WarehouseError::Validation("Product name must not be empty.".to_string()));
  }
  Ok(trimmed.to_string())
}

/// Prices are stored as `NUMERIC(12, 2)`.
const PRICE_SCALE: u32 = 2;
const PRICE_INTEGER_DIGITS: u32 = 10;

pub(crate) fn validate_price(price: Decimal) -> Result<Decimal> {
  if price <= Decimal::ZERO {
    return Err(WarehouseError::Validation(format!(
      "Product price must be positive, got {}.",
      price
    )));
  }
  let normalized = price.normalize();
  if normalized.scale() > PRICE_SCALE {
    return Err(WarehouseError::Validation(format!(
      "Product price allows at most {} decimal places, got {}.",
      PRICE_SCALE, price
    )));
  }
  if normalized >= Decimal::from(10i64.pow(PRICE_INTEGER_DIGITS)) {
    return Err(WarehouseError::Validation(format!(
      "Product price must be below 10^{}, got {}.",
      PRICE_INTEGER_DIGITS, price
    )));
  }
  Ok(normalized)
}

pub(crate) fn validate_quantity(quantity: i32) -> Result<i32> {
  if quantity < 0 {
    return Err(WarehouseError::Validation(format!(
      "Product quantity must not be negative, got {}.",
      quantity
    )));
  }
  Ok(quantity)
}

impl NewProduct {
  /// Returns a normalised copy (trimmed name) or the first failing field.
  pub fn validated(self) -> Result<Self> {
    Ok(Self {
      name: validate_name(&self.name)?,
      description: self.description,
      price: validate_price(self.price)?,
      quantity: validate_quantity(self.quantity)?,
    })
  }
}

impl Product {
  /// Applies `changes` field by field. Every present field is validated before any is
  /// written, so a rejected update leaves the product untouched.
  pub fn apply_changes(&mut self, changes: ProductChanges) -> Result<()> {
    let name = changes.name.as_deref().map(validate_name).transpose()?;
    let price = changes.price.map(validate_price).transpose()?;
    let quantity = changes.quantity.map(validate_quantity).transpose()?;

    if let Some(name) = name {
      self.name = name;
    }
    if let Some(description) = changes.description {
      self.description = description;
    }
    if let Some(price) = price {
      self.price = price;
    }
    if let Some(quantity) = quantity {
      self.quantity = quantity;
    }
    Ok(())
  }

  pub fn has_stock_for(&self, requested: i32) -> bool {
    self.quantity >= requested
  }
}
