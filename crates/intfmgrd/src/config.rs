//! Configuration file support for intfmgrd
//!
//! Loads and validates intfmgrd configuration from TOML files.
//! Default location: /etc/gnmi/intfmgrd.toml

use gnmi_cfgmgr_common::{CfgMgrError, CfgMgrResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::tables::{AttrGroup, PathTable};
use crate::types::InterfaceSpec;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/gnmi/intfmgrd.toml";

/// Device session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// gNMI target, `host:port`
    #[serde(default = "default_address")]
    pub address: String,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Use TLS for the session
    #[serde(default = "default_tls")]
    pub tls: bool,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Complete intfmgrd configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntfMgrConfig {
    /// Device session
    #[serde(default)]
    pub device: DeviceConfig,

    /// Path template overrides keyed by attribute group
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub paths: BTreeMap<String, String>,

    /// Declared interfaces
    #[serde(default)]
    pub interfaces: Vec<InterfaceSpec>,
}

// Default functions
fn default_address() -> String {
    "127.0.0.1:6030".to_string()
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_tls() -> bool {
    true
}

fn default_timeout() -> u64 {
    10
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            username: default_username(),
            password: String::new(),
            tls: default_tls(),
            timeout_secs: default_timeout(),
        }
    }
}

impl IntfMgrConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> CfgMgrResult<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content).map_err(|e| {
                CfgMgrError::config(format!(
                    "Failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(CfgMgrError::Io(e)),
        }
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> CfgMgrResult<Self> {
        toml::from_str(content).map_err(|e| CfgMgrError::config(e.to_string()))
    }

    /// Get the per-call timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.device.timeout_secs)
    }

    /// Build the path table, applying any overrides
    ///
    /// Overrides may name any subset of groups; the rest keep their
    /// OpenConfig templates.
    pub fn path_table(&self) -> CfgMgrResult<PathTable> {
        if self.paths.is_empty() {
            return Ok(PathTable::openconfig());
        }

        let mut templates: BTreeMap<AttrGroup, String> = AttrGroup::ALL
            .into_iter()
            .map(|g| (g, PathTable::openconfig().template(g).to_string()))
            .collect();
        for (key, template) in &self.paths {
            templates.insert(key.parse()?, template.clone());
        }
        PathTable::from_templates(templates)
    }

    /// Validate configuration
    pub fn validate(&self) -> CfgMgrResult<()> {
        if self.device.address.is_empty() {
            return Err(CfgMgrError::config("device.address must not be empty"));
        }

        if self.device.timeout_secs == 0 {
            return Err(CfgMgrError::config("device.timeout_secs must be > 0"));
        }

        self.path_table()?;

        let mut seen = HashSet::new();
        for intf in &self.interfaces {
            intf.validate()?;
            if !seen.insert(intf.name.as_str()) {
                return Err(CfgMgrError::config(format!(
                    "interface {} declared more than once",
                    intf.name
                )));
            }
        }

        Ok(())
    }
}
