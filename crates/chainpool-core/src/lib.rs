//! chainpool-core: foundation types for ChainPool.
//!
//! # Overview
//!
//! ChainPool gives a process access to several blockchain networks, each
//! reachable through a list of redundant JSON-RPC endpoints. The core crate
//! defines:
//!
//! - [`RpcTransport`]: the async trait every transport (HTTP, IPC) implements
//! - [`JsonRpcRequest`] / [`JsonRpcResponse`]: wire types
//! - [`TransportError`]: structured error type
//! - [`NetworkConnection`]: one endpoint binding with a lazily cached chain id
//! - [`NetworkPool`] / [`NetworkPoolBuilder`]: the network registry with
//!   random and round-robin selection

pub mod connection;
pub mod error;
pub mod pool;
pub mod request;
pub mod transport;

pub use connection::{NetworkConnection, DEFAULT_TIMEOUT_SECS};
pub use error::TransportError;
pub use pool::{NetworkPool, NetworkPoolBuilder};
pub use request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcId, RpcParam};
pub use transport::{RpcTransport, TransportKind};
