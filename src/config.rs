//! Client configuration and its validation.
//!
//! A [`ClientConfig`] can be assembled in code or read from a loose JSON
//! mapping with [`ClientConfig::from_value`]. Either way it is validated
//! before a client is built, and an invalid configuration never yields a
//! client.
//!
//! The loose form recognizes these keys, all optional except `url`:
//!
//! | key                  | type                       | default |
//! |----------------------|----------------------------|---------|
//! | `url`                | non-empty string           | -       |
//! | `protocol`           | `"http"` or `"https"`      | https   |
//! | `params`             | mapping                    | empty   |
//! | `maxTimeout`         | integer seconds, > 0       | 60      |
//! | `baseHeaders`        | mapping of strings         | empty   |
//! | `requestDataFormat`  | `"json"` or `"string"`     | json    |
//! | `responseDataFormat` | `"json"` or `"string"`     | json    |
//! | `options`            | mapping                    | empty   |

use crate::codec::{BodyCodec, BodyFormat};
use crate::request::Params;
use crate::{Error, Result};
use http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Default request timeout, in seconds.
pub const DEFAULT_MAX_TIMEOUT_SECS: u64 = 60;

/// URL scheme used to reach the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    #[default]
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            other => Err(Error::ConfigurationError(format!(
                "`protocol` must be one of http, https (got `{}`)",
                other
            ))),
        }
    }
}

/// Settings handed to the transport.
///
/// The typed fields cover the common needs. Anything else a custom transport
/// understands can travel in `extra`, which this crate never interprets.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportOptions {
    /// Verify the server's TLS certificate.
    pub verify_tls: bool,

    /// Upper bound for establishing a connection.
    pub connect_timeout: Option<Duration>,

    /// `User-Agent` sent with every request.
    pub user_agent: Option<String>,

    /// Headers with the lowest precedence: base and call headers override
    /// them.
    pub headers: Vec<(String, String)>,

    /// Opaque, transport-specific settings.
    pub extra: Map<String, Value>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            verify_tls: true,
            connect_timeout: None,
            user_agent: None,
            headers: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl TransportOptions {
    /// Reads the `options` mapping, merging it over the defaults.
    fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let mut options = Self::default();

        for (key, value) in map {
            match key.as_str() {
                "verifyTls" => {
                    options.verify_tls = value.as_bool().ok_or_else(|| {
                        Error::ConfigurationError(
                            "`options.verifyTls` must be a boolean".to_string(),
                        )
                    })?;
                }
                "connectTimeout" => {
                    let secs = value.as_u64().ok_or_else(|| {
                        Error::ConfigurationError(
                            "`options.connectTimeout` must be a non-negative integer".to_string(),
                        )
                    })?;
                    options.connect_timeout = Some(Duration::from_secs(secs));
                }
                "userAgent" => {
                    let agent = value.as_str().ok_or_else(|| {
                        Error::ConfigurationError(
                            "`options.userAgent` must be a string".to_string(),
                        )
                    })?;
                    options.user_agent = Some(agent.to_string());
                }
                "headers" => {
                    options.headers = string_pairs("options.headers", value)?;
                }
                _ => {
                    options.extra.insert(key.clone(), value.clone());
                }
            }
        }

        Ok(options)
    }
}

/// Configuration for an [`ApiClient`](crate::ApiClient).
///
/// # Examples
///
/// ```
/// use apibase::{BodyFormat, ClientConfig, Protocol};
/// use serde_json::json;
///
/// let config = ClientConfig::from_value(&json!({
///     "url": "api.example.com/v1",
///     "protocol": "http",
///     "requestDataFormat": "string"
/// }))
/// .unwrap();
///
/// assert_eq!(config.protocol, Protocol::Http);
/// assert_eq!(config.request_format, BodyFormat::String);
/// assert_eq!(config.response_format, BodyFormat::Json);
/// assert_eq!(config.max_timeout_secs, 60);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Host and optional base path, without the scheme.
    pub base_url: String,
    pub protocol: Protocol,
    /// Parameters sent with every request.
    pub base_params: Params,
    pub max_timeout_secs: u64,
    /// Headers sent with every request.
    pub base_headers: Vec<(String, String)>,
    pub request_format: BodyFormat,
    pub response_format: BodyFormat,
    pub transport_options: TransportOptions,
}

impl ClientConfig {
    /// Creates a configuration with default settings for `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            protocol: Protocol::default(),
            base_params: Params::new(),
            max_timeout_secs: DEFAULT_MAX_TIMEOUT_SECS,
            base_headers: Vec::new(),
            request_format: BodyFormat::default(),
            response_format: BodyFormat::default(),
            transport_options: TransportOptions::default(),
        }
    }

    /// Validates a loose configuration mapping.
    ///
    /// Rules are checked in a fixed order and the first failure is returned.
    /// `null` values count as absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] naming the offending key.
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| {
            Error::ConfigurationError("configuration must be a mapping".to_string())
        })?;
        let field = |key: &str| map.get(key).filter(|v| !v.is_null());

        let base_url = match field("url") {
            None => {
                return Err(Error::ConfigurationError(
                    "`url` is required".to_string(),
                ))
            }
            Some(Value::String(url)) if url.is_empty() => {
                return Err(Error::ConfigurationError(
                    "`url` must not be empty".to_string(),
                ))
            }
            Some(Value::String(url)) => url.clone(),
            Some(_) => {
                return Err(Error::ConfigurationError(
                    "`url` must be a string".to_string(),
                ))
            }
        };

        let mut config = Self::new(base_url);

        if let Some(params) = field("params") {
            config.base_params = params
                .as_object()
                .cloned()
                .ok_or_else(|| {
                    Error::ConfigurationError("`params` must be a mapping".to_string())
                })?;
        }

        if let Some(protocol) = field("protocol") {
            config.protocol = match protocol {
                Value::String(s) => s.parse()?,
                _ => {
                    return Err(Error::ConfigurationError(
                        "`protocol` must be one of http, https".to_string(),
                    ))
                }
            };
        }

        if let Some(timeout) = field("maxTimeout") {
            let secs = match (timeout.as_u64(), timeout.as_i64()) {
                (Some(secs), _) if secs > 0 => secs,
                (Some(_), _) | (None, Some(_)) => {
                    return Err(Error::ConfigurationError(
                        "`maxTimeout` must be greater than zero".to_string(),
                    ))
                }
                (None, None) => {
                    return Err(Error::ConfigurationError(
                        "`maxTimeout` must be an integer".to_string(),
                    ))
                }
            };
            config.max_timeout_secs = secs;
        }

        if let Some(headers) = field("baseHeaders") {
            config.base_headers = string_pairs("baseHeaders", headers)?;
        }

        if let Some(format) = field("requestDataFormat") {
            config.request_format = body_format("requestDataFormat", format)?;
        }

        if let Some(format) = field("responseDataFormat") {
            config.response_format = body_format("responseDataFormat", format)?;
        }

        if let Some(options) = field("options") {
            let options = options.as_object().ok_or_else(|| {
                Error::ConfigurationError("`options` must be a mapping".to_string())
            })?;
            config.transport_options = TransportOptions::from_map(options)?;
        }

        Ok(config)
    }

    /// Checks the invariants that typed construction cannot enforce.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if the base URL is empty or the
    /// timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::ConfigurationError(
                "`url` must not be empty".to_string(),
            ));
        }
        if self.max_timeout_secs == 0 {
            return Err(Error::ConfigurationError(
                "`maxTimeout` must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Validates the configuration and resolves it into client state.
    pub(crate) fn into_state(
        self,
        request_codec: Option<Arc<dyn BodyCodec>>,
        response_codec: Option<Arc<dyn BodyCodec>>,
    ) -> Result<ClientState> {
        self.validate()?;

        let option_headers = header_map("options.headers", &self.transport_options.headers)?;
        let base_headers = header_map("baseHeaders", &self.base_headers)?;

        Ok(ClientState {
            request_codec: request_codec.unwrap_or_else(|| self.request_format.codec()),
            response_codec: response_codec.unwrap_or_else(|| self.response_format.codec()),
            option_headers,
            base_headers,
            config: self,
        })
    }
}

/// The validated configuration held by a client. Never changes after the
/// client is built.
#[derive(Debug)]
pub struct ClientState {
    config: ClientConfig,
    option_headers: HeaderMap,
    base_headers: HeaderMap,
    request_codec: Arc<dyn BodyCodec>,
    response_codec: Arc<dyn BodyCodec>,
}

impl ClientState {
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn protocol(&self) -> Protocol {
        self.config.protocol
    }

    pub fn base_params(&self) -> &Params {
        &self.config.base_params
    }

    pub fn max_timeout(&self) -> Duration {
        Duration::from_secs(self.config.max_timeout_secs)
    }

    pub fn request_format(&self) -> BodyFormat {
        self.config.request_format
    }

    pub fn response_format(&self) -> BodyFormat {
        self.config.response_format
    }

    pub fn transport_options(&self) -> &TransportOptions {
        &self.config.transport_options
    }

    /// Transport option headers with base headers merged over them.
    pub(crate) fn default_headers(&self) -> HeaderMap {
        let mut headers = self.option_headers.clone();
        for (name, value) in &self.base_headers {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }

    pub fn request_codec(&self) -> &dyn BodyCodec {
        self.request_codec.as_ref()
    }

    pub fn response_codec(&self) -> &dyn BodyCodec {
        self.response_codec.as_ref()
    }
}

fn body_format(key: &str, value: &Value) -> Result<BodyFormat> {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::ConfigurationError(format!("`{}` must be one of json, string", key)))
}

/// Reads a mapping of header-like values; numbers and booleans are
/// stringified.
fn string_pairs(key: &str, value: &Value) -> Result<Vec<(String, String)>> {
    let map = value
        .as_object()
        .ok_or_else(|| Error::ConfigurationError(format!("`{}` must be a mapping", key)))?;

    map.iter()
        .map(|(name, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(Error::ConfigurationError(format!(
                        "`{}.{}` must be a string",
                        key, name
                    )))
                }
            };
            Ok((name.clone(), value))
        })
        .collect()
}

pub(crate) fn header_map(key: &str, pairs: &[(String, String)]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(pairs.len());
    for (name, value) in pairs {
        let name = HeaderName::try_from(name.as_str()).map_err(|e| {
            Error::ConfigurationError(format!("`{}`: invalid header name: {}", key, e))
        })?;
        let value = HeaderValue::try_from(value.as_str()).map_err(|e| {
            Error::ConfigurationError(format!("`{}`: invalid header value: {}", key, e))
        })?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config_error(value: Value) -> String {
        match ClientConfig::from_value(&value) {
            Err(Error::ConfigurationError(msg)) => msg,
            other => panic!("Expected ConfigurationError, got {:?}", other),
        }
    }

    #[test]
    fn defaults_for_url_only() {
        let config = ClientConfig::from_value(&json!({"url": "example.com"})).unwrap();
        assert_eq!(config.base_url, "example.com");
        assert_eq!(config.protocol, Protocol::Https);
        assert_eq!(config.request_format, BodyFormat::Json);
        assert_eq!(config.response_format, BodyFormat::Json);
        assert_eq!(config.max_timeout_secs, 60);
        assert!(config.base_params.is_empty());
        assert!(config.base_headers.is_empty());
        assert_eq!(config.transport_options, TransportOptions::default());
    }

    #[test]
    fn every_field_overrides_its_default() {
        let config = ClientConfig::from_value(&json!({
            "url": "api.test",
            "protocol": "http",
            "params": {"key": "abc"},
            "maxTimeout": 5,
            "baseHeaders": {"X-Version": 2},
            "requestDataFormat": "string",
            "responseDataFormat": "string",
            "options": {"verifyTls": false, "connectTimeout": 3, "custom": [1]}
        }))
        .unwrap();

        assert_eq!(config.protocol, Protocol::Http);
        assert_eq!(config.base_params.get("key"), Some(&json!("abc")));
        assert_eq!(config.max_timeout_secs, 5);
        assert_eq!(
            config.base_headers,
            vec![("X-Version".to_string(), "2".to_string())]
        );
        assert_eq!(config.request_format, BodyFormat::String);
        assert_eq!(config.response_format, BodyFormat::String);
        assert!(!config.transport_options.verify_tls);
        assert_eq!(
            config.transport_options.connect_timeout,
            Some(Duration::from_secs(3))
        );
        assert_eq!(config.transport_options.extra.get("custom"), Some(&json!([1])));
        assert_eq!(config.transport_options.user_agent, None);
    }

    #[test]
    fn invalid_fields_name_the_key() {
        let cases = [
            (json!({}), "url"),
            (json!({"url": ""}), "url"),
            (json!({"url": 42}), "url"),
            (json!({"url": "a", "params": "x"}), "params"),
            (json!({"url": "a", "protocol": "ftp"}), "protocol"),
            (json!({"url": "a", "protocol": 1}), "protocol"),
            (json!({"url": "a", "maxTimeout": "60"}), "maxTimeout"),
            (json!({"url": "a", "maxTimeout": 1.5}), "maxTimeout"),
            (json!({"url": "a", "maxTimeout": 0}), "maxTimeout"),
            (json!({"url": "a", "baseHeaders": ["x"]}), "baseHeaders"),
            (json!({"url": "a", "baseHeaders": {"x": {}}}), "baseHeaders"),
            (json!({"url": "a", "requestDataFormat": "xml"}), "requestDataFormat"),
            (json!({"url": "a", "responseDataFormat": "xml"}), "responseDataFormat"),
            (json!({"url": "a", "options": 3}), "options"),
            (json!({"url": "a", "options": {"verifyTls": "no"}}), "options"),
        ];

        for (value, key) in cases {
            let msg = config_error(value.clone());
            assert!(msg.contains(key), "{:?}: message `{}` lacks `{}`", value, msg, key);
        }
    }

    #[test]
    fn max_timeout_accepts_the_full_unsigned_range() {
        let config =
            ClientConfig::from_value(&json!({"url": "a", "maxTimeout": u64::MAX})).unwrap();
        assert_eq!(config.max_timeout_secs, u64::MAX);

        let msg = config_error(json!({"url": "a", "maxTimeout": -5}));
        assert!(msg.contains("greater than zero"), "{}", msg);

        let msg = config_error(json!({"url": "a", "maxTimeout": 2.5}));
        assert!(msg.contains("must be an integer"), "{}", msg);
    }

    #[test]
    fn protocol_value_is_checked_not_url() {
        let config =
            ClientConfig::from_value(&json!({"url": "example.com", "protocol": "http"})).unwrap();
        assert_eq!(config.protocol, Protocol::Http);
    }

    #[test]
    fn first_failure_wins() {
        let msg = config_error(json!({"url": "a", "params": 1, "protocol": "ftp"}));
        assert!(msg.contains("params"));
    }

    #[test]
    fn null_counts_as_absent() {
        let config =
            ClientConfig::from_value(&json!({"url": "a", "protocol": null, "params": null}))
                .unwrap();
        assert_eq!(config.protocol, Protocol::Https);
    }

    #[test]
    fn non_mapping_config_is_rejected() {
        let msg = config_error(json!("example.com"));
        assert!(msg.contains("configuration"));
    }

    #[test]
    fn state_rejects_invalid_header_names() {
        let mut config = ClientConfig::new("example.com");
        config.base_headers.push(("bad header".to_string(), "x".to_string()));
        let err = config.into_state(None, None).unwrap_err();
        assert!(err.to_string().contains("baseHeaders"));
    }

    #[test]
    fn base_headers_win_over_option_headers() {
        let mut config = ClientConfig::new("example.com");
        config.transport_options.headers = vec![
            ("accept".to_string(), "text/plain".to_string()),
            ("x-trace".to_string(), "1".to_string()),
        ];
        config.base_headers = vec![("Accept".to_string(), "application/json".to_string())];

        let headers = config.into_state(None, None).unwrap().default_headers();
        assert_eq!(headers.get("accept").unwrap(), "application/json");
        assert_eq!(headers.get("x-trace").unwrap(), "1");
    }

    #[test]
    fn validate_rejects_empty_url_and_zero_timeout() {
        assert!(ClientConfig::new("  ").validate().is_err());

        let mut config = ClientConfig::new("example.com");
        config.max_timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
