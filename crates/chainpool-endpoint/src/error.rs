//! Startup / configuration errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that make a pool unusable. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid YAML for [`PoolConfig`](crate::PoolConfig).
    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// No networks configured at all.
    #[error("no networks configured: client addresses must not be empty")]
    NoNetworks,

    /// A network key is empty or whitespace.
    #[error("network names must not be empty")]
    EmptyNetworkName,

    /// A network has no addresses.
    #[error("network '{network}' has no client addresses")]
    NoAddresses { network: String },

    /// Every address of a network failed endpoint construction.
    #[error("network '{network}' has no usable connections")]
    NoConnections { network: String },

    /// The tracing subscriber could not be installed.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
