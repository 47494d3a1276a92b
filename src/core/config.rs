use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_ENDPOINT_PATH: &str = "/run/cputemp/cputemp.sock";
pub const DEFAULT_ALIAS_PATH: &str = "/run/cputemp.sock";
pub const DEFAULT_SOCKET_MODE: u32 = 0o600;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Where the privileged service binds its socket
    #[serde(default = "default_endpoint_path")]
    pub endpoint_path: PathBuf,
    /// Stable public name clients open (symlink to the endpoint)
    #[serde(default = "default_alias_path")]
    pub alias_path: PathBuf,
    /// Permission bits applied to the endpoint socket
    #[serde(default = "default_socket_mode")]
    pub socket_mode: u32,
    /// Logical CPU whose MSR node is read
    #[serde(default)]
    pub msr_cpu: u32,
    /// Run each vendor readout under its own lock
    #[serde(default = "default_serialize")]
    pub serialize_hardware_access: bool,
}

fn default_endpoint_path() -> PathBuf {
    PathBuf::from(DEFAULT_ENDPOINT_PATH)
}

fn default_alias_path() -> PathBuf {
    PathBuf::from(DEFAULT_ALIAS_PATH)
}

fn default_socket_mode() -> u32 {
    DEFAULT_SOCKET_MODE
}

fn default_serialize() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint_path: default_endpoint_path(),
            alias_path: default_alias_path(),
            socket_mode: default_socket_mode(),
            msr_cpu: 0,
            serialize_hardware_access: default_serialize(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let data = fs::read(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        // If the file is empty or corrupted, return default config
        if data.is_empty() {
            return Ok(Config::default());
        }

        Ok(serde_json::from_slice(&data).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable config {:?}: {}", config_path, e);
            Config::default()
        }))
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data = serde_json::to_vec_pretty(self).with_context(|| "Failed to serialize config")?;

        fs::write(config_path, data)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().with_context(|| "Could not determine config directory")?;

        Ok(config_dir.join("cputemp").join("config.json"))
    }

    /// Path clients should open: the alias if configured, else the endpoint.
    pub fn client_path(&self) -> &Path {
        if self.alias_path.as_os_str().is_empty() {
            &self.endpoint_path
        } else {
            &self.alias_path
        }
    }
}
