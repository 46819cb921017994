//! Startup assembly: [`PoolConfig`] → [`NetworkPool`].
//!
//! Each address becomes one [`NetworkConnection`]. An address whose transport
//! cannot be built is logged and skipped; a network left with no connection
//! at all aborts startup.

use std::sync::Arc;
use std::time::Duration;

use chainpool_core::{NetworkConnection, NetworkPool, RpcTransport, TransportError};

use crate::config::PoolConfig;
use crate::endpoint::build_transport;
use crate::error::ConfigError;

/// Build one connection per address, skipping addresses that fail.
pub fn build_connections(addresses: &[String], timeout: Option<Duration>) -> Vec<NetworkConnection> {
    build_connections_with(addresses, timeout, build_transport)
}

/// [`build_connections`] with a custom transport factory.
pub fn build_connections_with<F>(
    addresses: &[String],
    timeout: Option<Duration>,
    mut factory: F,
) -> Vec<NetworkConnection>
where
    F: FnMut(Option<&str>, Option<Duration>) -> Result<Arc<dyn RpcTransport>, TransportError>,
{
    let timeout_secs = timeout.map(|t| t.as_secs());
    addresses
        .iter()
        .filter_map(|address| match factory(Some(address.as_str()), timeout) {
            Ok(transport) => Some(NetworkConnection::new(transport, timeout_secs)),
            Err(e) => {
                tracing::error!(address = %address, error = %e, "failed to build endpoint, skipping");
                None
            }
        })
        .collect()
}

/// Validate `config` and build the pool it describes.
pub fn build_pool(config: &PoolConfig) -> Result<NetworkPool, ConfigError> {
    build_pool_with(config, build_transport)
}

/// [`build_pool`] with a custom transport factory.
pub fn build_pool_with<F>(config: &PoolConfig, mut factory: F) -> Result<NetworkPool, ConfigError>
where
    F: FnMut(Option<&str>, Option<Duration>) -> Result<Arc<dyn RpcTransport>, TransportError>,
{
    config.validate()?;
    let timeout = config.timeout();

    let mut builder = NetworkPool::builder();
    for (network, addresses) in &config.networks {
        tracing::info!(network = %network, addresses = addresses.len(), "initialising network");
        let connections = build_connections_with(addresses, timeout, &mut factory);
        if connections.is_empty() {
            return Err(ConfigError::NoConnections {
                network: network.clone(),
            });
        }
        builder = builder.register(connections, network.as_str());
    }

    let pool = builder.finish();
    tracing::info!(networks = pool.len(), "network pool ready");
    Ok(pool)
}
