//! chainpool-http: JSON-RPC over HTTP(S), backed by `reqwest`.

pub mod client;

pub use client::{HttpTransport, DEFAULT_HTTP_ENDPOINT};
