use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::checksum::HashKind;

/// Global defaults loaded from `~/.config/cachestatus/config.toml`.
/// CLI flags and HTTP query parameters override these per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// How many concurrent probe workers to run.
    pub workers: usize,
    /// Default hash function for checksum runs.
    pub hash: HashKind,
    /// Per-probe connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Per-probe total timeout in seconds.
    pub timeout_secs: u64,
    /// Optional override for the manifest writer queue capacity.
    #[serde(default)]
    pub manifest_queue: Option<usize>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workers: 6,
            hash: HashKind::Sha256,
            connect_timeout_secs: 15,
            timeout_secs: 60,
            manifest_queue: None,
        }
    }
}

impl AppConfig {
    pub fn probe_timeouts(&self) -> crate::probe::ProbeTimeouts {
        crate::probe::ProbeTimeouts {
            connect: std::time::Duration::from_secs(self.connect_timeout_secs),
            total: std::time::Duration::from_secs(self.timeout_secs),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("cachestatus")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<AppConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = AppConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: AppConfig = toml::from_str(&data)?;
    Ok(cfg)
}
