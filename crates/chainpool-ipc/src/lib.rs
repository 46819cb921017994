//! chainpool-ipc: JSON-RPC over local IPC.
//!
//! # Features
//! - Unix domain sockets (geth / reth / erigon `.ipc` files)
//! - Windows named pipes (`\\.\pipe\geth.ipc`)
//! - Lazy connect on first request, reconnect after a broken stream
//! - Unframed JSON stream decoding (nodes do not delimit IPC messages)

pub mod client;
pub mod framing;

pub use client::{IpcEndpoint, IpcTransport};
pub use framing::FrameBuffer;
