// warehouse_app/src/lib.rs

//! HTTP surface and PostgreSQL storage for the `warehouse` core.

pub mod config;
pub mod errors;
pub mod seed;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod web;

pub use config::{AppConfig, LogFormat};
pub use errors::{AppError, Result};
pub use state::AppState;
pub use store::PgStore;
