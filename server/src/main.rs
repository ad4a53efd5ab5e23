// warehouse_app/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use std::sync::Arc;
use warehouse_app::config::AppConfig;
use warehouse_app::seed::seed_catalog;
use warehouse_app::state::AppState;
use warehouse_app::store::PgStore;
use warehouse_app::{telemetry, web, AppError};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      // No subscriber yet; the log format is part of the config that failed.
      telemetry::init_tracing(Default::default());
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(e.into());
    }
  };
  telemetry::init_tracing(app_config.log_format);
  tracing::info!("Starting warehouse server...");

  let store = PgStore::connect(&app_config).await.map_err(|e| {
    tracing::error!(error = %e, "Failed to connect to the database.");
    AppError::Sqlx(e)
  })?;
  tracing::info!(
    max_connections = app_config.database_max_connections,
    "Successfully connected to the database."
  );

  if app_config.run_migrations {
    store.migrate().await.map_err(AppError::Migration)?;
    tracing::info!("Database migrations applied.");
  }

  let app_state = AppState::new(Arc::new(store.clone()), app_config.clone());

  if app_config.seed_db {
    seed_catalog(&app_state.catalog).await?;
  }

  let server_address = app_config.bind_address();
  tracing::info!("Binding server to {}...", server_address);

  let server_state = app_state.clone();
  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(server_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await?;

  tracing::info!("Server stopped; closing database pool.");
  store.close().await;
  Ok(())
}
