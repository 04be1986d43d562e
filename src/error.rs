//! Error types for the request/response pipeline.
//!
//! Every stage of a call reports failure through [`Error`]: configuration
//! validation, request building, transport execution, outcome classification
//! and body decoding. Variants preserve the raw response text when one exists
//! so callers can inspect exactly what the server sent.

use std::fmt;

/// The main error type for API client calls.
///
/// # Examples
///
/// ```no_run
/// use apibase::{ApiClient, Error, RequestSpec};
///
/// # async fn example() -> Result<(), Error> {
/// let client = ApiClient::builder().base_url("api.example.com").build()?;
///
/// match client.send_request_and_get_body(RequestSpec::get("/status")).await {
///     Ok(response) => println!("Success: {:?}", response.data),
///     Err(e) if e.is_no_data() => println!("No data (status {:?})", e.status()),
///     Err(Error::DeserializationFailed { raw_response, serde_error, .. }) => {
///         eprintln!("Failed to decode. Raw response: {}", raw_response);
///         eprintln!("Decoder error: {}", serde_error);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The client configuration is missing a field or holds an invalid value.
    ///
    /// The message always names the offending configuration key.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The target URL could not be composed from protocol, base URL and path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The request parameters could not be encoded with the configured
    /// request body format. No request is sent.
    #[error("Failed to encode request body: {0}")]
    Encoding(String),

    /// The transport failed before a response was received (connection
    /// refused, DNS failure, timeout, ...).
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered, but the response carries no usable data.
    ///
    /// This is raised when the status code is missing, the body is absent,
    /// the status is outside the 2xx class, or the response codec finds no
    /// payload in the body (an empty JSON body). It is a normal "no data" outcome
    /// rather than a fault, so it is never recorded as the client's last
    /// error.
    #[error("Unsuccessful response (status {status})")]
    UnsuccessfulResponse {
        /// The HTTP status code, `0` when none was reported
        status: u16,
        /// The raw response body, if any
        raw_response: Option<String>,
    },

    /// The response body could not be decoded with the configured response
    /// format.
    #[error("Failed to decode response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to decode
        raw_response: String,
        /// The decoder error message
        serde_error: String,
        /// The HTTP status code
        status: u16,
    },
}

impl Error {
    /// Returns `true` for the "no data" outcome of a structurally valid but
    /// unsuccessful response.
    ///
    /// # Examples
    ///
    /// ```
    /// use apibase::Error;
    ///
    /// let err = Error::UnsuccessfulResponse { status: 404, raw_response: None };
    /// assert!(err.is_no_data());
    ///
    /// let err = Error::ConfigurationError("url is required".to_string());
    /// assert!(!err.is_no_data());
    /// ```
    pub fn is_no_data(&self) -> bool {
        matches!(self, Error::UnsuccessfulResponse { .. })
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::UnsuccessfulResponse { status, .. } => Some(*status),
            Error::DeserializationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::UnsuccessfulResponse { raw_response, .. } => raw_response.as_deref(),
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// The diagnostic text recorded by [`ApiClient::last_error`].
    ///
    /// Transport failures report the collaborator's own message unchanged;
    /// every other variant reports its display form.
    ///
    /// [`ApiClient::last_error`]: crate::ApiClient::last_error
    pub(crate) fn diagnostic(&self) -> String {
        match self {
            Error::Transport(e) => e.message().to_string(),
            other => other.to_string(),
        }
    }
}

/// What went wrong inside the transport collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The connection could not be established.
    Connect,
    /// The request exceeded its timeout.
    Timeout,
    /// Any other transport-level failure.
    Other,
}

/// A transport-level failure reported by a [`Transport`](crate::Transport).
///
/// Custom transports construct these directly; the reqwest transport converts
/// its own errors through `From<reqwest::Error>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
}

impl TransportError {
    /// Creates a transport error of the given kind.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for a [`TransportErrorKind::Connect`] error.
    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connect, message)
    }

    /// Shorthand for a [`TransportErrorKind::Timeout`] error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout, message)
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    /// The transport's own error text.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == TransportErrorKind::Timeout
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            TransportErrorKind::Timeout
        } else if e.is_connect() {
            TransportErrorKind::Connect
        } else {
            TransportErrorKind::Other
        };
        Self::new(kind, e.to_string())
    }
}

/// A specialized `Result` type for API client calls.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_diagnostic_is_the_transport_message() {
        let err = Error::from(TransportError::connect("connection refused"));
        assert_eq!(err.diagnostic(), "connection refused");
        assert_eq!(err.to_string(), "Transport error: connection refused");
    }

    #[test]
    fn status_and_raw_response_accessors() {
        let err = Error::DeserializationFailed {
            raw_response: "not json".to_string(),
            serde_error: "expected value".to_string(),
            status: 200,
        };
        assert_eq!(err.status(), Some(200));
        assert_eq!(err.raw_response(), Some("not json"));
        assert!(!err.is_no_data());

        let err = Error::UnsuccessfulResponse {
            status: 0,
            raw_response: None,
        };
        assert_eq!(err.status(), Some(0));
        assert_eq!(err.raw_response(), None);
    }

    #[test]
    fn timeout_kind() {
        let err = TransportError::timeout("operation timed out");
        assert!(err.is_timeout());
        assert_eq!(err.kind(), TransportErrorKind::Timeout);
    }
}
