//! The transport collaborator: executes a fully resolved request.
//!
//! The pipeline never performs I/O itself. It builds a
//! [`TransportDescriptor`], hands it to a [`Transport`], and gets back a
//! [`RawResponse`] or a [`TransportError`]. [`ReqwestTransport`] is the
//! production implementation; tests and special environments can supply
//! their own.

use crate::config::TransportOptions;
use crate::error::TransportError;
use crate::{Error, Result};
use http::{HeaderMap, Method};
use std::future::Future;
use std::time::Duration;
use url::Url;

/// A request with nothing left to merge or encode.
#[derive(Debug, Clone)]
pub struct TransportDescriptor {
    pub method: Method,

    /// Absolute URL, including the query string for GET requests.
    pub url: Url,

    pub headers: HeaderMap,

    /// Encoded parameters for every verb except GET.
    pub body: Option<String>,

    /// Overall request timeout. Enforced by the transport.
    pub timeout: Duration,

    /// The client's transport options. The fields above take precedence over
    /// anything in here.
    pub options: TransportOptions,
}

/// Status code and body as returned by the transport.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    /// The HTTP status code, `0` when the transport could not determine one.
    pub status: u16,

    pub headers: HeaderMap,

    /// The response body, `None` when the transport produced no payload.
    pub body: Option<String>,
}

impl RawResponse {
    /// Creates a response with the given status and body and no headers.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Some(body.into()),
        }
    }

    /// Returns `true` when the response carries usable data: a 2xx status
    /// and a body.
    pub fn is_usable(&self) -> bool {
        (200..300).contains(&self.status) && self.body.is_some()
    }
}

/// Executes transport descriptors.
///
/// Implementations report connection-level failures (refused connections,
/// DNS errors, timeouts) as [`TransportError`]. Any response the server sends,
/// whatever its status, is a successful execution.
///
/// # Examples
///
/// ```
/// use apibase::{RawResponse, Transport, TransportDescriptor, TransportError};
///
/// /// Answers every request with the same canned body.
/// struct Canned(&'static str);
///
/// impl Transport for Canned {
///     async fn execute(
///         &self,
///         _descriptor: TransportDescriptor,
///     ) -> Result<RawResponse, TransportError> {
///         Ok(RawResponse::new(200, self.0))
///     }
/// }
/// ```
pub trait Transport: Send + Sync {
    /// Executes one request.
    fn execute(
        &self,
        descriptor: TransportDescriptor,
    ) -> impl Future<Output = std::result::Result<RawResponse, TransportError>> + Send;
}

/// [`Transport`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a transport honoring the TLS, connect timeout and user agent
    /// settings of `options`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(options: &TransportOptions) -> Result<Self> {
        let mut builder =
            reqwest::Client::builder().danger_accept_invalid_certs(!options.verify_tls);

        if let Some(timeout) = options.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(agent) = &options.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        let client = builder.build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self { client })
    }

    /// Wraps an already configured `reqwest` client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    async fn execute(
        &self,
        descriptor: TransportDescriptor,
    ) -> std::result::Result<RawResponse, TransportError> {
        let mut request = self
            .client
            .request(descriptor.method, descriptor.url)
            .headers(descriptor.headers)
            .timeout(descriptor.timeout);

        if let Some(body) = descriptor.body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await?;

        Ok(RawResponse {
            status,
            headers,
            body: Some(body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usable_only_with_2xx_and_body() {
        assert!(RawResponse::new(200, "{}").is_usable());
        assert!(RawResponse::new(204, "").is_usable());
        assert!(!RawResponse::new(404, "{}").is_usable());
        assert!(!RawResponse::new(301, "").is_usable());
        assert!(!RawResponse::new(500, "{}").is_usable());
        assert!(!RawResponse::new(0, "{}").is_usable());
        assert!(!RawResponse::new(101, "").is_usable());

        let no_body = RawResponse {
            status: 200,
            ..RawResponse::default()
        };
        assert!(!no_body.is_usable());
    }

    #[test]
    fn reqwest_transport_builds_with_options() {
        let options = TransportOptions {
            verify_tls: false,
            connect_timeout: Some(Duration::from_secs(2)),
            user_agent: Some("apibase-test".to_string()),
            ..TransportOptions::default()
        };
        assert!(ReqwestTransport::new(&options).is_ok());
    }
}
