//! chainpool-endpoint: from configuration to a ready [`NetworkPool`].
//!
//! - [`endpoint`]: decides HTTP vs. IPC for an address and builds the transport
//! - [`config`]: YAML configuration (network → addresses, timeout, logging)
//! - [`autoconfig`]: startup assembly of the pool, fail-fast per network
//! - [`logging`]: `tracing-subscriber` initialisation
//!
//! # Quick start
//! ```rust,no_run
//! use chainpool_endpoint::{autoconfig, PoolConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PoolConfig::load("chainpool.yaml")?;
//! let pool = autoconfig::build_pool(&config)?;
//! if let Some(conn) = pool.next_connection_for("ethereum") {
//!     println!("chain id {}", conn.chain_id().await?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`NetworkPool`]: chainpool_core::NetworkPool

pub mod autoconfig;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod logging;

pub use config::{AddressList, PoolConfig};
pub use endpoint::{build_transport, EndpointKind, HostOs};
pub use error::ConfigError;
pub use logging::{init_tracing, LogConfig};
