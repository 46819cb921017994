//! A single network connection: one transport plus a lazily resolved chain id.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::TransportError;
use crate::request::{parse_quantity, JsonRpcRequest, JsonRpcResponse, RpcParam};
use crate::transport::{RpcTransport, TransportKind};

/// Advisory request timeout used when the caller supplies none.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// One live binding to a single RPC endpoint of a network.
///
/// Created once per configured address and shared read-mostly by every caller
/// of that network. RPC traffic is forwarded opaquely to the transport; the
/// connection only interprets `eth_chainId`, whose result it caches.
pub struct NetworkConnection {
    transport: Arc<dyn RpcTransport>,
    timeout: Duration,
    next_id: AtomicU64,
    chain_id: OnceLock<u64>,
    chain_id_lock: Mutex<()>,
}

impl NetworkConnection {
    /// Wrap `transport`. `timeout_secs` is used when positive, otherwise
    /// [`DEFAULT_TIMEOUT_SECS`].
    pub fn new(transport: Arc<dyn RpcTransport>, timeout_secs: Option<u64>) -> Self {
        let secs = match timeout_secs {
            Some(secs) if secs > 0 => secs,
            _ => DEFAULT_TIMEOUT_SECS,
        };
        Self {
            transport,
            timeout: Duration::from_secs(secs),
            next_id: AtomicU64::new(1),
            chain_id: OnceLock::new(),
            chain_id_lock: Mutex::new(()),
        }
    }

    /// Advisory request timeout; enforcement happens inside the transport.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The underlying transport.
    pub fn transport(&self) -> &Arc<dyn RpcTransport> {
        &self.transport
    }

    /// Chain id if it has already been resolved. Never performs I/O.
    pub fn cached_chain_id(&self) -> Option<u64> {
        self.chain_id.get().copied()
    }

    /// The network's chain id, resolved with `eth_chainId` on first use.
    ///
    /// At most one successful resolution request is ever issued per
    /// connection: concurrent callers wait on the connection's lock and then
    /// read the cached value. A failed resolution leaves the cache empty so
    /// a later call can retry.
    pub async fn chain_id(&self) -> Result<u64, TransportError> {
        if let Some(id) = self.chain_id.get() {
            return Ok(*id);
        }

        let _guard = self.chain_id_lock.lock().await;
        // Another caller may have resolved it while we waited.
        if let Some(id) = self.chain_id.get() {
            return Ok(*id);
        }

        let raw: String = self.call("eth_chainId", vec![]).await?;
        let id = parse_quantity(&raw)?;
        // Only the lock holder writes the slot, so this cannot already be set.
        let _ = self.chain_id.set(id);
        tracing::info!(endpoint = %self.endpoint(), chain_id = id, "resolved chain id");
        Ok(id)
    }

    /// Call `method` with a fresh request id and deserialize the result.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<RpcParam>,
    ) -> Result<T, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let req = JsonRpcRequest::new(id, method, params);
        let resp = self.transport.send(req).await?;
        let result = resp.into_result().map_err(TransportError::Rpc)?;
        serde_json::from_value(result).map_err(TransportError::Deserialization)
    }

    /// Untyped variant of [`call`](Self::call).
    pub async fn call_raw(&self, method: &str, params: Vec<RpcParam>) -> Result<Value, TransportError> {
        self.call(method, params).await
    }
}

impl std::fmt::Debug for NetworkConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkConnection")
            .field("endpoint", &self.transport.endpoint())
            .field("kind", &self.transport.kind())
            .field("timeout", &self.timeout)
            .field("chain_id", &self.chain_id.get())
            .finish()
    }
}

#[async_trait]
impl RpcTransport for NetworkConnection {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        self.transport.send(req).await
    }

    async fn send_batch(
        &self,
        reqs: Vec<JsonRpcRequest>,
    ) -> Result<Vec<JsonRpcResponse>, TransportError> {
        self.transport.send_batch(reqs).await
    }

    fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    fn kind(&self) -> TransportKind {
        self.transport.kind()
    }
}
