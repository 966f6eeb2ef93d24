//! Server configuration.

use std::path::PathBuf;

use coffer_core::{engine::EngineConfig, rights::Rights};
use serde::Deserialize;

/// Runtime server configuration, deserialised from `config.toml` and
/// `COFFER_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:           String,
  pub port:           u16,
  /// Directory holding the database file. `~` is expanded.
  pub data_dir:       PathBuf,
  /// Database name; the file is `<data_dir>/<database>.sqlite3`.
  pub database:       String,
  /// Enables `/admin/database`.
  pub debug:          bool,
  /// Lets requests without `x-user-login` run unscoped.
  pub allow_unscoped: bool,
  /// Bit positions of the default rights mask.
  pub default_rights: Option<Vec<u32>>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:           "127.0.0.1".to_owned(),
      port:           8080,
      data_dir:       PathBuf::from("data"),
      database:       "coffer".to_owned(),
      debug:          false,
      allow_unscoped: false,
      default_rights: None,
    }
  }
}

impl ServerConfig {
  pub fn database_path(&self) -> PathBuf {
    expand_tilde(&self.data_dir).join(format!("{}.sqlite3", self.database))
  }

  pub fn engine_config(&self) -> EngineConfig {
    EngineConfig {
      debug:          self.debug,
      default_rights: self
        .default_rights
        .as_deref()
        .map_or(Rights::DEFAULT, Rights::from_positions),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &std::path::Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults() {
    let cfg = ServerConfig::default();
    assert_eq!(cfg.database_path(), PathBuf::from("data/coffer.sqlite3"));
    let engine = cfg.engine_config();
    assert!(!engine.debug);
    assert!(!cfg.allow_unscoped);
    assert_eq!(engine.default_rights, Rights::DEFAULT);
  }

  #[test]
  fn rights_from_positions() {
    let cfg = ServerConfig {
      default_rights: Some(vec![1, 4]),
      debug: true,
      ..ServerConfig::default()
    };
    let engine = cfg.engine_config();
    assert!(engine.debug);
    assert_eq!(engine.default_rights, Rights::new(0b10010));
  }

  #[test]
  fn deserialises_partial_config() {
    let settings = config::Config::builder()
      .add_source(config::File::from_str(
        "port = 9000\ndatabase = \"work\"\n",
        config::FileFormat::Toml,
      ))
      .build()
      .unwrap();
    let cfg: ServerConfig = settings.try_deserialize().unwrap();
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.database_path(), PathBuf::from("data/work.sqlite3"));
  }
}
