//! HTTP JSON-RPC transport.
//!
//! One `reqwest::Client` per endpoint. Building the client performs no I/O;
//! the first TCP/TLS connection is made by the first request. When `DEBUG`
//! logging is enabled at construction time every request and response body is
//! logged.

use std::time::Duration;

use async_trait::async_trait;

use chainpool_core::error::TransportError;
use chainpool_core::request::{JsonRpcRequest, JsonRpcResponse};
use chainpool_core::transport::{RpcTransport, TransportKind};

/// Endpoint used when an address is empty or absent (a local node).
pub const DEFAULT_HTTP_ENDPOINT: &str = "http://localhost:8545/";

/// JSON-RPC transport over HTTP(S).
pub struct HttpTransport {
    url: String,
    http: reqwest::Client,
    timeout: Option<Duration>,
    log_bodies: bool,
}

impl HttpTransport {
    /// Build a transport for `url`.
    ///
    /// `timeout` is applied to connecting, to each read and to the whole
    /// request; `None` keeps reqwest's defaults.
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder
                .connect_timeout(timeout)
                .read_timeout(timeout)
                .timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| TransportError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            http,
            timeout,
            log_bodies: tracing::enabled!(tracing::Level::DEBUG),
        })
    }

    /// Transport for [`DEFAULT_HTTP_ENDPOINT`].
    pub fn local(timeout: Option<Duration>) -> Result<Self, TransportError> {
        Self::new(DEFAULT_HTTP_ENDPOINT, timeout)
    }

    /// Configured timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether request/response bodies are logged.
    pub fn logs_bodies(&self) -> bool {
        self.log_bodies
    }

    fn map_send_error(&self, e: reqwest::Error) -> TransportError {
        match self.timeout {
            Some(t) if e.is_timeout() => TransportError::Timeout {
                ms: t.as_millis() as u64,
            },
            _ => TransportError::Http(e.to_string()),
        }
    }

    /// POST `body` and return the raw response text of a 2xx answer.
    async fn post(&self, body: String) -> Result<String, TransportError> {
        if self.log_bodies {
            tracing::debug!(url = %self.url, body = %body, "--> rpc request");
        }

        let resp = self
            .http
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.map_send_error(e))?;

        if self.log_bodies {
            tracing::debug!(url = %self.url, status = status.as_u16(), body = %text, "<-- rpc response");
        }

        if !status.is_success() {
            return Err(TransportError::Http(format!(
                "HTTP {}: {text}",
                status.as_u16()
            )));
        }
        Ok(text)
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        let body = serde_json::to_string(&req)?;
        let text = self.post(body).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// True HTTP batch: send all requests as a JSON array in one HTTP call.
    async fn send_batch(
        &self,
        reqs: Vec<JsonRpcRequest>,
    ) -> Result<Vec<JsonRpcResponse>, TransportError> {
        if reqs.is_empty() {
            return Ok(vec![]);
        }
        let body = serde_json::to_string(&reqs)?;
        let text = self.post(body).await?;
        Ok(serde_json::from_str(&text)?)
    }

    fn endpoint(&self) -> &str {
        &self.url
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Http
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainpool_core::request::RpcId;

    #[test]
    fn construction_does_not_connect() {
        // nothing listens on this port; building must still succeed
        let t = HttpTransport::new("http://127.0.0.1:9", Some(Duration::from_secs(1))).unwrap();
        assert_eq!(t.endpoint(), "http://127.0.0.1:9");
        assert_eq!(t.kind(), TransportKind::Http);
        assert_eq!(t.timeout(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn body_logging_follows_debug_level() {
        let debug = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let t = tracing::subscriber::with_default(debug, || HttpTransport::new("http://x", None).unwrap());
        assert!(t.logs_bodies());

        let info = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .finish();
        let t = tracing::subscriber::with_default(info, || HttpTransport::new("http://x", None).unwrap());
        assert!(!t.logs_bodies());
    }

    #[tokio::test]
    async fn stalled_server_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // accept and never answer
            let (_sock, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let t = HttpTransport::new(format!("http://{addr}"), Some(Duration::from_millis(200))).unwrap();
        let err = t
            .send(JsonRpcRequest::new(1, "eth_chainId", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Timeout { ms: 200 }), "{err:?}");
        assert!(err.is_transient());
    }

    #[test]
    fn local_transport_uses_default_endpoint() {
        let t = HttpTransport::local(None).unwrap();
        assert_eq!(t.endpoint(), DEFAULT_HTTP_ENDPOINT);
        assert_eq!(t.timeout(), None);
    }

    #[tokio::test]
    async fn send_posts_json_rpc() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"method":"eth_chainId"}"#.to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x89"}"#)
            .create_async()
            .await;

        let t = HttpTransport::new(server.url(), Some(Duration::from_secs(5))).unwrap();
        let resp = t
            .send(JsonRpcRequest::new(1, "eth_chainId", vec![]))
            .await
            .unwrap();
        assert_eq!(resp.id, RpcId::Number(1));
        assert_eq!(resp.into_result().unwrap(), serde_json::json!("0x89"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_http_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let t = HttpTransport::new(server.url(), None).unwrap();
        let err = t
            .send(JsonRpcRequest::new(1, "eth_chainId", vec![]))
            .await
            .unwrap_err();
        match err {
            TransportError::Http(msg) => assert!(msg.contains("503")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn batch_is_one_http_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(
                r#"[{"jsonrpc":"2.0","id":1,"result":"0x1"},{"jsonrpc":"2.0","id":2,"result":"0x10"}]"#,
            )
            .expect(1)
            .create_async()
            .await;

        let t = HttpTransport::new(server.url(), None).unwrap();
        let out = t
            .send_batch(vec![
                JsonRpcRequest::new(1, "eth_chainId", vec![]),
                JsonRpcRequest::new(2, "eth_blockNumber", vec![]),
            ])
            .await
            .unwrap();
        assert_eq!(out.len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_batch_skips_the_network() {
        let t = HttpTransport::new("http://127.0.0.1:9", None).unwrap();
        assert!(t.send_batch(vec![]).await.unwrap().is_empty());
    }
}
