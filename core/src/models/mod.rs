// warehouse/src/models/mod.rs

//! Records held by the store.

pub mod order;
pub mod product;

pub use order::{Order, OrderItem, OrderLine, OrderStatus};
pub use product::{NewProduct, Product, ProductChanges};
