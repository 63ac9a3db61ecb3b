use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cache::QueryCache;
use crate::db::DbConfig;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub database: DatabaseConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  /// Default tracing filter (e.g. "info", "rowcache=debug")
  pub log_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
  #[serde(default = "default_host")]
  pub host: String,
  #[serde(default = "default_port")]
  pub port: u16,
  #[serde(default = "default_user")]
  pub user: String,
  /// Prefer ROWCACHE_DB_PASSWORD over storing this in the file
  pub password: Option<String>,
  #[serde(default = "default_user")]
  pub dbname: String,
  #[serde(default = "default_schema")]
  pub schema: String,
}

fn default_host() -> String {
  "localhost".to_string()
}

fn default_port() -> u16 {
  5432
}

fn default_user() -> String {
  "postgres".to_string()
}

fn default_schema() -> String {
  "public".to_string()
}

impl Default for DatabaseConfig {
  fn default() -> Self {
    Self {
      host: default_host(),
      port: default_port(),
      user: default_user(),
      password: None,
      dbname: default_user(),
      schema: default_schema(),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CacheConfig {
  /// Seconds before a cached read is refetched; unset keeps entries until a
  /// write invalidates them
  pub stale_seconds: Option<u64>,
}

impl CacheConfig {
  pub fn build(&self) -> QueryCache {
    match self.stale_seconds {
      Some(secs) => {
        QueryCache::new().with_stale_time(chrono::Duration::seconds(secs as i64))
      }
      None => QueryCache::new(),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./rowcache.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/rowcache/config.yaml
  ///
  /// With no file found, the defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("rowcache.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("rowcache").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    // An empty file is a valid, all-defaults configuration.
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  /// Get the database password from environment variables.
  ///
  /// Checks ROWCACHE_DB_PASSWORD first, then PGPASSWORD as fallback.
  pub fn get_password() -> Option<String> {
    std::env::var("ROWCACHE_DB_PASSWORD")
      .or_else(|_| std::env::var("PGPASSWORD"))
      .ok()
  }

  /// Connection parameters for the client. A password in the file wins over
  /// the environment.
  pub fn db_config(&self) -> DbConfig {
    let db = &self.database;
    DbConfig {
      host: db.host.clone(),
      port: db.port,
      user: db.user.clone(),
      password: db.password.clone().or_else(Self::get_password),
      dbname: db.dbname.clone(),
      schema: db.schema.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_config_uses_defaults() {
    let config = Config::parse("").unwrap();
    assert_eq!(config.database.host, "localhost");
    assert_eq!(config.database.port, 5432);
    assert_eq!(config.database.schema, "public");
    assert!(config.cache.stale_seconds.is_none());
    assert!(config.log_level.is_none());
  }

  #[test]
  fn test_partial_database_section() {
    let config = Config::parse(
      "database:\n  host: db.internal\n  dbname: inventory\n  schema: app\ncache:\n  stale_seconds: 30\nlog_level: debug\n",
    )
    .unwrap();
    assert_eq!(config.database.host, "db.internal");
    assert_eq!(config.database.port, 5432);
    assert_eq!(config.database.user, "postgres");
    assert_eq!(config.database.dbname, "inventory");
    assert_eq!(config.cache.stale_seconds, Some(30));
    assert_eq!(config.log_level.as_deref(), Some("debug"));
  }

  #[test]
  fn test_db_config_prefers_file_password() {
    let config = Config::parse("database:\n  password: secret\n  schema: app\n").unwrap();
    let db = config.db_config();
    assert_eq!(db.password.as_deref(), Some("secret"));
    assert_eq!(db.schema, "app");
    assert_eq!(db.port, 5432);
  }

  #[test]
  fn test_missing_explicit_path_is_an_error() {
    let err = Config::load(Some(Path::new("/nonexistent/rowcache.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }

  #[test]
  fn test_invalid_yaml_is_rejected() {
    assert!(Config::parse("database: [1, 2").is_err());
  }
}
