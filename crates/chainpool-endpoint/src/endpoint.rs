//! Endpoint builder: address string → transport.
//!
//! | address                    | transport                         |
//! |----------------------------|-----------------------------------|
//! | empty / absent             | HTTP at `http://localhost:8545/`  |
//! | starts with `http`         | HTTP at the address               |
//! | anything else, on Windows  | named pipe                        |
//! | anything else, elsewhere   | Unix domain socket                |

use std::sync::Arc;
use std::time::Duration;

use chainpool_core::error::TransportError;
use chainpool_core::transport::{RpcTransport, TransportKind};
use chainpool_http::HttpTransport;
use chainpool_ipc::IpcTransport;

/// Operating system family, as far as transport selection cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    Unix,
}

impl HostOs {
    /// The OS this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Unix
        }
    }
}

/// Transport variant chosen for an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// No address given: HTTP to the local default endpoint.
    DefaultHttp,
    Http,
    NamedPipe,
    UnixSocket,
}

impl EndpointKind {
    /// Classify `address` for a given host. Pure; performs no I/O.
    pub fn classify(address: Option<&str>, host: HostOs) -> Self {
        match address {
            None | Some("") => Self::DefaultHttp,
            Some(addr) if addr.starts_with("http") => Self::Http,
            Some(_) if host == HostOs::Windows => Self::NamedPipe,
            Some(_) => Self::UnixSocket,
        }
    }

    /// The wire-level kind the resulting transport reports.
    pub fn transport_kind(self) -> TransportKind {
        match self {
            Self::DefaultHttp | Self::Http => TransportKind::Http,
            Self::NamedPipe => TransportKind::NamedPipe,
            Self::UnixSocket => TransportKind::UnixSocket,
        }
    }
}

/// Build the transport for `address` on the current host.
///
/// No connection is attempted. The only construction failure is the HTTP
/// client itself failing to initialise; bad URLs and paths surface on first
/// use.
pub fn build_transport(
    address: Option<&str>,
    timeout: Option<Duration>,
) -> Result<Arc<dyn RpcTransport>, TransportError> {
    build_transport_for(address, timeout, HostOs::current())
}

/// [`build_transport`] with an explicit host OS.
pub fn build_transport_for(
    address: Option<&str>,
    timeout: Option<Duration>,
    host: HostOs,
) -> Result<Arc<dyn RpcTransport>, TransportError> {
    let kind = EndpointKind::classify(address, host);
    let address = address.unwrap_or_default();
    tracing::debug!(address, ?kind, ?timeout, "building transport");

    let transport: Arc<dyn RpcTransport> = match kind {
        EndpointKind::DefaultHttp => Arc::new(HttpTransport::local(timeout)?),
        EndpointKind::Http => Arc::new(HttpTransport::new(address, timeout)?),
        EndpointKind::NamedPipe => Arc::new(IpcTransport::named_pipe(address, timeout)),
        EndpointKind::UnixSocket => Arc::new(IpcTransport::unix(address, timeout)),
    };
    debug_assert_eq!(transport.kind(), kind.transport_kind());
    Ok(transport)
}
