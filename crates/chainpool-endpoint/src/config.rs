//! Pool configuration.
//!
//! ```yaml
//! http_timeout_seconds: 10
//! networks:
//!   ethereum:
//!     - https://rpc.ankr.com/eth
//!     - https://rpc.flashbots.net
//!   polygon: "https://polygon-rpc.com, /var/run/bor.ipc"
//! log:
//!   level: info
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::logging::LogConfig;

// ─── Address lists ────────────────────────────────────────────────────────────

/// Ordered connection addresses of one network.
///
/// Accepts either a YAML sequence or a single comma-separated string. Entries
/// are trimmed in both forms and blank entries are kept: a blank address
/// selects the local node at `http://localhost:8545/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawAddressList", into = "Vec<String>")]
pub struct AddressList(Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAddressList {
    Many(Vec<String>),
    Joined(String),
}

impl From<RawAddressList> for AddressList {
    fn from(raw: RawAddressList) -> Self {
        match raw {
            RawAddressList::Many(list) => Self(list.into_iter().map(|a| a.trim().to_string()).collect()),
            RawAddressList::Joined(joined) => Self(joined.split(',').map(|a| a.trim().to_string()).collect()),
        }
    }
}

impl From<AddressList> for Vec<String> {
    fn from(list: AddressList) -> Self {
        list.0
    }
}

impl<S: Into<String>> FromIterator<S> for AddressList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl std::ops::Deref for AddressList {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// ─── Top-level config ─────────────────────────────────────────────────────────

/// Everything needed to build a [`NetworkPool`](chainpool_core::NetworkPool).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Transport timeout in seconds; absent or 0 keeps transport defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_timeout_seconds: Option<u64>,
    /// network name → addresses. Sorted, so startup order is deterministic.
    #[serde(default)]
    pub networks: BTreeMap<String, AddressList>,
    #[serde(default)]
    pub log: LogConfig,
}

impl PoolConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate the YAML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Reject configurations that cannot produce a complete pool.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.networks.is_empty() {
            return Err(ConfigError::NoNetworks);
        }
        for (network, addresses) in &self.networks {
            if network.trim().is_empty() {
                return Err(ConfigError::EmptyNetworkName);
            }
            if addresses.is_empty() {
                return Err(ConfigError::NoAddresses {
                    network: network.clone(),
                });
            }
        }
        Ok(())
    }

    /// The transport timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.http_timeout_seconds
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Add or replace a network (builder style, mostly for tests and tools).
    pub fn with_network<I, S>(mut self, network: impl Into<String>, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.networks.insert(network.into(), addresses.into_iter().collect());
        self
    }
}
