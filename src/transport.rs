//! The HTTP client capability consumed by the dispatcher.
//!
//! This module defines the seam between the dispatch logic and the actual
//! HTTP transport: a [`Transport`] opens one reusable [`Connection`] per
//! destination, and a [`Connection`] issues GET requests whose status is
//! observable before the body is read. The default implementation,
//! [`ReqwestTransport`], is backed by one keep-alive `reqwest` client per
//! destination; tests substitute their own implementations.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;
use url::Url;

use crate::registry::HostKey;
use crate::types::Result;
use crate::ErrorKind;

/// Default timeout in seconds before a request is deemed as failed, 20.
pub const DEFAULT_TIMEOUT_SECS: usize = 20;
/// Default user agent, `volley-<PKG_VERSION>`.
pub const DEFAULT_USER_AGENT: &str = concat!("volley/", env!("CARGO_PKG_VERSION"));

// Constants currently not configurable by the user.
/// A timeout for only the connect phase of a request.
const CONNECT_TIMEOUT: u64 = 10;
/// TCP keepalive
/// See <https://tldp.org/HOWTO/TCP-Keepalive-HOWTO/overview.html> for more info
const TCP_KEEPALIVE: u64 = 60;

/// Opens connection contexts for destinations.
///
/// `open` is deliberately synchronous: the registry calls it while holding
/// its map entry guard, which guarantees that checking for and inserting a
/// new destination is one uninterrupted step.
pub trait Transport: Send + Sync + fmt::Debug {
    /// Open a reusable connection context for the given destination
    ///
    /// # Errors
    ///
    /// Returns an error if no context can be opened; the registry surfaces
    /// this as a per-destination `OpenConnection` failure.
    fn open(&self, key: &HostKey) -> Result<Arc<dyn Connection>>;
}

/// A reusable session to one destination, shared by every request targeting
/// it within a run
#[async_trait]
pub trait Connection: Send + Sync {
    /// Issue a GET request over this connection
    async fn get(&self, url: &Url) -> Result<Box<dyn ResponseHandle>>;

    /// Close the session. Called exactly once per context, at run teardown.
    async fn close(&self);
}

/// An in-flight response whose status can be inspected before the body is
/// consumed
#[async_trait]
pub trait ResponseHandle: Send {
    /// The HTTP status code of the response
    fn status(&self) -> StatusCode;

    /// Read the full response body
    async fn text(self: Box<Self>) -> Result<String>;
}

/// The default [`Transport`], backed by `reqwest`.
///
/// Each destination gets its own client with its own keep-alive connection
/// pool, so repeated requests to one destination reuse sockets while
/// destinations stay isolated from each other.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    user_agent: String,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    /// Create a transport with the given user agent and per-request timeout
    #[must_use]
    pub const fn new(user_agent: String, timeout: Option<Duration>) -> Self {
        ReqwestTransport {
            user_agent,
            timeout,
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        ReqwestTransport::new(
            DEFAULT_USER_AGENT.to_string(),
            Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS as u64)),
        )
    }
}

impl Transport for ReqwestTransport {
    fn open(&self, key: &HostKey) -> Result<Arc<dyn Connection>> {
        let builder = reqwest::ClientBuilder::new()
            .gzip(true)
            .user_agent(&self.user_agent)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT))
            .tcp_keepalive(Duration::from_secs(TCP_KEEPALIVE));

        let client = (match self.timeout {
            Some(t) => builder.timeout(t),
            None => builder,
        })
        .build()
        .map_err(ErrorKind::BuildHttpClient)?;

        log::debug!("Opened reqwest client for {key}");
        Ok(Arc::new(ReqwestConnection { client }))
    }
}

struct ReqwestConnection {
    client: reqwest::Client,
}

#[async_trait]
impl Connection for ReqwestConnection {
    async fn get(&self, url: &Url) -> Result<Box<dyn ResponseHandle>> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(ErrorKind::NetworkRequest)?;
        Ok(Box::new(ReqwestResponse { response }))
    }

    async fn close(&self) {
        // Dropping the client closes its idle pooled connections; there is
        // nothing else to flush for plain GET traffic.
    }
}

struct ReqwestResponse {
    response: reqwest::Response,
}

#[async_trait]
impl ResponseHandle for ReqwestResponse {
    fn status(&self) -> StatusCode {
        self.response.status()
    }

    async fn text(self: Box<Self>) -> Result<String> {
        self.response
            .text()
            .await
            .map_err(ErrorKind::ReadResponseBody)
    }
}

#[cfg(test)]
mod tests {
    use crate::mock_server;

    use super::*;

    #[test]
    fn test_open_builds_a_client() {
        let transport = ReqwestTransport::default();
        assert!(transport.open(&HostKey::from("test1.hell:8100")).is_ok());
    }

    #[tokio::test]
    async fn test_get_against_mock_server() {
        let mock_server = mock_server!(StatusCode::OK, set_body_string("hello"));
        let url = Url::parse(&mock_server.uri()).unwrap();

        let transport = ReqwestTransport::default();
        let connection = transport.open(&HostKey::try_from(&url).unwrap()).unwrap();

        let response = connection.get(&url).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "hello");

        connection.close().await;
    }
}
