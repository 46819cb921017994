//! IPC JSON-RPC transport over a Unix domain socket or a Windows named pipe.
//!
//! The stream is opened on the first request and reopened after any I/O
//! failure. Requests on one transport are serialised: a request is written
//! and its response read before the next request may use the stream.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use chainpool_core::error::TransportError;
use chainpool_core::request::{JsonRpcRequest, JsonRpcResponse};
use chainpool_core::transport::{RpcTransport, TransportKind};

use crate::framing::FrameBuffer;

const READ_CHUNK: usize = 8 * 1024;

/// Where an IPC transport connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpcEndpoint {
    /// Filesystem path of a Unix domain socket.
    UnixSocket(PathBuf),
    /// Windows named pipe name, e.g. `\\.\pipe\geth.ipc`.
    NamedPipe(String),
}

impl IpcEndpoint {
    pub fn kind(&self) -> TransportKind {
        match self {
            Self::UnixSocket(_) => TransportKind::UnixSocket,
            Self::NamedPipe(_) => TransportKind::NamedPipe,
        }
    }
}

trait IpcStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> IpcStream for T {}

#[derive(Default)]
struct IpcState {
    stream: Option<Box<dyn IpcStream>>,
    frames: FrameBuffer,
}

/// JSON-RPC transport over local IPC.
pub struct IpcTransport {
    endpoint: IpcEndpoint,
    label: String,
    timeout: Option<Duration>,
    state: Mutex<IpcState>,
}

impl IpcTransport {
    /// Transport for the Unix domain socket at `path`. Does not connect.
    pub fn unix(path: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self::new(IpcEndpoint::UnixSocket(path.into()), timeout)
    }

    /// Transport for the Windows named pipe `name`. Does not connect.
    pub fn named_pipe(name: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self::new(IpcEndpoint::NamedPipe(name.into()), timeout)
    }

    pub fn new(endpoint: IpcEndpoint, timeout: Option<Duration>) -> Self {
        let label = match &endpoint {
            IpcEndpoint::UnixSocket(path) => path.display().to_string(),
            IpcEndpoint::NamedPipe(name) => name.clone(),
        };
        Self {
            endpoint,
            label,
            timeout,
            state: Mutex::new(IpcState::default()),
        }
    }

    /// Write one JSON document and read one back, bounded by the timeout.
    async fn exchange<Req, Resp>(&self, payload: &Req) -> Result<Resp, TransportError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let bytes = serde_json::to_vec(payload)?;
        let mut state = self.state.lock().await;

        let outcome = match self.timeout {
            Some(t) => tokio::time::timeout(t, self.round_trip(&mut state, &bytes))
                .await
                .unwrap_or_else(|_| {
                    Err(TransportError::Timeout {
                        ms: t.as_millis() as u64,
                    })
                }),
            None => self.round_trip(&mut state, &bytes).await,
        };

        if let Err(e) = &outcome {
            // A half-read response would poison the next exchange.
            tracing::warn!(endpoint = %self.label, error = %e, "dropping IPC stream");
            state.stream = None;
            state.frames.clear();
        }
        outcome
    }

    async fn round_trip<Resp: DeserializeOwned>(
        &self,
        state: &mut IpcState,
        bytes: &[u8],
    ) -> Result<Resp, TransportError> {
        if state.stream.is_none() {
            state.stream = Some(self.connect().await?);
        }
        let IpcState { stream, frames } = state;
        let Some(stream) = stream.as_mut() else {
            return Err(TransportError::ipc(&self.label, "stream not connected"));
        };

        stream
            .write_all(bytes)
            .await
            .map_err(|e| TransportError::ipc(&self.label, e))?;
        stream
            .flush()
            .await
            .map_err(|e| TransportError::ipc(&self.label, e))?;

        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            if let Some(resp) = frames.next_frame::<Resp>()? {
                if !frames.is_empty() {
                    tracing::debug!(endpoint = %self.label, "unread bytes after response");
                }
                return Ok(resp);
            }
            let n = stream
                .read(&mut chunk)
                .await
                .map_err(|e| TransportError::ipc(&self.label, e))?;
            if n == 0 {
                return Err(TransportError::ipc(&self.label, "connection closed by node"));
            }
            frames.extend(&chunk[..n]);
        }
    }

    async fn connect(&self) -> Result<Box<dyn IpcStream>, TransportError> {
        tracing::debug!(endpoint = %self.label, kind = %self.endpoint.kind(), "opening IPC stream");
        match &self.endpoint {
            IpcEndpoint::UnixSocket(path) => connect_unix(path, &self.label).await,
            IpcEndpoint::NamedPipe(name) => connect_named_pipe(name, &self.label).await,
        }
    }
}

#[cfg(unix)]
async fn connect_unix(path: &std::path::Path, label: &str) -> Result<Box<dyn IpcStream>, TransportError> {
    let stream = tokio::net::UnixStream::connect(path)
        .await
        .map_err(|e| TransportError::ipc(label, e))?;
    Ok(Box::new(stream))
}

#[cfg(not(unix))]
async fn connect_unix(_path: &std::path::Path, label: &str) -> Result<Box<dyn IpcStream>, TransportError> {
    Err(TransportError::Unsupported {
        kind: TransportKind::UnixSocket.to_string(),
        endpoint: label.to_string(),
    })
}

#[cfg(windows)]
async fn connect_named_pipe(name: &str, label: &str) -> Result<Box<dyn IpcStream>, TransportError> {
    let client = tokio::net::windows::named_pipe::ClientOptions::new()
        .open(name)
        .map_err(|e| TransportError::ipc(label, e))?;
    Ok(Box::new(client))
}

#[cfg(not(windows))]
async fn connect_named_pipe(_name: &str, label: &str) -> Result<Box<dyn IpcStream>, TransportError> {
    Err(TransportError::Unsupported {
        kind: TransportKind::NamedPipe.to_string(),
        endpoint: label.to_string(),
    })
}

#[async_trait]
impl RpcTransport for IpcTransport {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        self.exchange(&req).await
    }

    /// Batches go out as one JSON array, like HTTP batches.
    async fn send_batch(
        &self,
        reqs: Vec<JsonRpcRequest>,
    ) -> Result<Vec<JsonRpcResponse>, TransportError> {
        if reqs.is_empty() {
            return Ok(vec![]);
        }
        self.exchange(&reqs).await
    }

    fn endpoint(&self) -> &str {
        &self.label
    }

    fn kind(&self) -> TransportKind {
        self.endpoint.kind()
    }
}
