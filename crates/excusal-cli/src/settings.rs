//! Layered configuration: defaults, then `excusal.toml`, then `EXCUSAL_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use excusal_api::ServerConfig;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "excusal.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// JSON file holding every partition, the session and the logs.
  #[serde(default = "default_data_path")]
  pub data_path: PathBuf,
  #[serde(default = "default_host")]
  pub host:      String,
  #[serde(default = "default_port")]
  pub port:      u16,
}

fn default_data_path() -> PathBuf { PathBuf::from("excusal-data.json") }

fn default_host() -> String { ServerConfig::default().host }

fn default_port() -> u16 { ServerConfig::default().port }

impl Settings {
  /// Read `path` (optional on disk) and overlay the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("EXCUSAL"))
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?
      .try_deserialize()
      .context("failed to deserialise settings")
  }

  pub fn server(&self) -> ServerConfig {
    ServerConfig {
      host: self.host.clone(),
      port: self.port,
    }
  }
}
