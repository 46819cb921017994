//! The `RpcTransport` trait: the seam between the pool and the wire.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::request::{JsonRpcRequest, JsonRpcResponse};

/// Which kind of channel a transport speaks over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// JSON-RPC over HTTP(S).
    Http,
    /// JSON-RPC over a Unix domain socket (geth-style `.ipc` file).
    UnixSocket,
    /// JSON-RPC over a Windows named pipe (`\\.\pipe\geth.ipc`).
    NamedPipe,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::UnixSocket => write!(f, "unix-socket"),
            Self::NamedPipe => write!(f, "named-pipe"),
        }
    }
}

/// The central async trait every RPC transport must implement.
///
/// Constructing a transport must not perform I/O; connection establishment
/// happens on the first `send`.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` so one transport can be shared by
/// every caller of a network.
///
/// # Object Safety
/// The trait is object-safe and stored as `Arc<dyn RpcTransport>`.
#[async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    /// Send a single JSON-RPC request and return the response.
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError>;

    /// Send a batch of JSON-RPC requests.
    ///
    /// Default implementation sends them sequentially; override for true batching.
    async fn send_batch(
        &self,
        reqs: Vec<JsonRpcRequest>,
    ) -> Result<Vec<JsonRpcResponse>, TransportError> {
        let mut responses = Vec::with_capacity(reqs.len());
        for req in reqs {
            responses.push(self.send(req).await?);
        }
        Ok(responses)
    }

    /// The address this transport talks to (URL, socket path or pipe name).
    fn endpoint(&self) -> &str;

    /// The channel kind, decided when the transport was built.
    fn kind(&self) -> TransportKind;
}
