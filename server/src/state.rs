// warehouse_app/src/state.rs
use crate::config::AppConfig;
use std::sync::Arc;
use warehouse::{OrderEngine, ProductCatalog, RecordStore};

#[derive(Clone)]
pub struct AppState {
  pub catalog: ProductCatalog,
  pub orders: Arc<OrderEngine>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Wires the catalog and the order engine to one shared store.
  pub fn new(store: Arc<dyn RecordStore>, config: Arc<AppConfig>) -> Self {
    Self {
      catalog: ProductCatalog::new(store.clone()),
      orders: Arc::new(OrderEngine::new(store)),
      config,
    }
  }
}
