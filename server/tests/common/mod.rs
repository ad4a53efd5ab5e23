// tests/common/mod.rs
#![allow(dead_code)]

use std::sync::Arc;
use warehouse::{MemoryStore, RecordStore};
use warehouse_app::{AppConfig, AppState};

pub fn test_config() -> AppConfig {
  AppConfig::from_lookup(|name| match name {
    "DATABASE_URL" => Some("postgres://unused/warehouse_test".to_string()),
    _ => None,
  })
  .expect("test config")
}

/// App state over a fresh in-memory store; the store is returned for direct assertions.
pub fn memory_state() -> (AppState, Arc<MemoryStore>) {
  let store = Arc::new(MemoryStore::new());
  let shared: Arc<dyn RecordStore> = store.clone();
  (AppState::new(shared, Arc::new(test_config())), store)
}

/// Builds the real route table over the given state.
macro_rules! init_app {
  ($state:expr) => {
    actix_web::test::init_service(
      actix_web::App::new()
        .app_data(actix_web::web::Data::new($state))
        .configure(warehouse_app::web::configure_app_routes),
    )
    .await
  };
}
