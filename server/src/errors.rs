// warehouse_app/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;
use warehouse::wire::FailureBody;
use warehouse::WarehouseError;

#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Warehouse(#[from] WarehouseError),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Migration Error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),
}

impl AppError {
  /// A malformed request (bad JSON body, non-numeric path id) rejected before the core runs.
  pub fn validation(message: impl Into<String>) -> Self {
    AppError::Warehouse(WarehouseError::Validation(message.into()))
  }

  fn failure_body(&self) -> FailureBody {
    match self {
      AppError::Warehouse(e) => FailureBody::from(e),
      AppError::Sqlx(_) | AppError::Migration(_) => FailureBody::StorageError {
        error: "Database operation failed".to_string(),
      },
      AppError::Config(_) => FailureBody::InternalError {
        error: "An internal error occurred".to_string(),
      },
    }
  }
}

fn status_for(err: &WarehouseError) -> StatusCode {
  match err {
    WarehouseError::Validation(_) | WarehouseError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
    WarehouseError::ProductNotFound { .. } | WarehouseError::OrderNotFound { .. } => StatusCode::NOT_FOUND,
    WarehouseError::InsufficientStock { .. } | WarehouseError::ProductInUse { .. } => StatusCode::CONFLICT,
    WarehouseError::Storage(_) | WarehouseError::Workflow(_) => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Warehouse(e) => status_for(e),
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, "Rejecting request");
    }
    HttpResponse::build(status).json(self.failure_body())
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
