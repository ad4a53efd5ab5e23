// warehouse_app/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
  #[default]
  Pretty,
  Json,
}

impl FromStr for LogFormat {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "pretty" => Ok(LogFormat::Pretty),
      "json" => Ok(LogFormat::Json),
      other => Err(AppError::Config(format!(
        "Invalid LOG_FORMAT '{}': expected 'pretty' or 'json'",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub database_max_connections: u32,
  pub database_acquire_timeout: Duration,
  pub run_migrations: bool,
  pub seed_db: bool,
  pub log_format: LogFormat,
}

impl AppConfig {
  /// Loads `.env` if present, then reads the process environment.
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from any variable source. `from_env` passes the process env.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let database_url = lookup("DATABASE_URL")
      .filter(|v| !v.trim().is_empty())
      .ok_or_else(|| AppError::Config("Missing environment variable 'DATABASE_URL'".to_string()))?;

    let server_host = lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = parse_or(&lookup, "SERVER_PORT", 8080u16)?;
    let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5u32)?;
    if database_max_connections == 0 {
      return Err(AppError::Config("DATABASE_MAX_CONNECTIONS must be at least 1".to_string()));
    }
    let acquire_timeout_secs = parse_or(&lookup, "DATABASE_ACQUIRE_TIMEOUT_SECS", 5u64)?;
    let run_migrations = parse_or(&lookup, "RUN_MIGRATIONS", true)?;
    let seed_db = parse_or(&lookup, "SEED_DB", false)?;
    let log_format = parse_or(&lookup, "LOG_FORMAT", LogFormat::Pretty)?;

    Ok(Self {
      server_host,
      server_port,
      database_url,
      database_max_connections,
      database_acquire_timeout: Duration::from_secs(acquire_timeout_secs),
      run_migrations,
      seed_db,
      log_format,
    })
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, var_name: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match lookup(var_name) {
    None => Ok(default),
    Some(raw) => raw
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", var_name, raw, e))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |name: &str| vars.get(name).cloned()
  }

  #[test]
  fn defaults_apply_when_only_database_url_is_set() {
    let config = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/warehouse")])).unwrap();
    assert_eq!(config.bind_address(), "127.0.0.1:8080");
    assert_eq!(config.database_max_connections, 5);
    assert_eq!(config.database_acquire_timeout, Duration::from_secs(5));
    assert!(config.run_migrations);
    assert!(!config.seed_db);
    assert_eq!(config.log_format, LogFormat::Pretty);
  }

  #[test]
  fn missing_database_url_is_a_config_error() {
    let err = AppConfig::from_lookup(lookup_from(&[("SERVER_PORT", "9000")])).unwrap_err();
    assert!(matches!(err, AppError::Config(ref m) if m.contains("DATABASE_URL")));
  }

  #[test]
  fn overrides_are_parsed() {
    let config = AppConfig::from_lookup(lookup_from(&[
      ("DATABASE_URL", "postgres://db/warehouse"),
      ("SERVER_HOST", "0.0.0.0"),
      ("SERVER_PORT", "9090"),
      ("DATABASE_MAX_CONNECTIONS", "12"),
      ("RUN_MIGRATIONS", "false"),
      ("SEED_DB", "true"),
      ("LOG_FORMAT", "JSON"),
    ]))
    .unwrap();
    assert_eq!(config.bind_address(), "0.0.0.0:9090");
    assert_eq!(config.database_max_connections, 12);
    assert!(!config.run_migrations);
    assert!(config.seed_db);
    assert_eq!(config.log_format, LogFormat::Json);
  }

  #[test]
  fn malformed_values_name_the_variable() {
    let err = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://db/w"), ("SERVER_PORT", "eighty")]))
      .unwrap_err();
    assert!(matches!(err, AppError::Config(ref m) if m.contains("SERVER_PORT")));

    let err = AppConfig::from_lookup(lookup_from(&[
      ("DATABASE_URL", "postgres://db/w"),
      ("DATABASE_MAX_CONNECTIONS", "0"),
    ]))
    .unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
  }
}
