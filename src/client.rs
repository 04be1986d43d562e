//! The base API client: request building, transport invocation, outcome
//! classification and response decoding.
//!
//! Concrete API clients wrap an [`ApiClient`] and add business methods that
//! supply endpoint paths and parameters. Use [`ClientBuilder`] to configure and
//! create clients, or implement [`ApiDefinition`] to declare the configuration
//! of a concrete API once.

use crate::codec::{BodyCodec, BodyFormat};
use crate::config::{ClientConfig, ClientState, Protocol, TransportOptions};
use crate::descriptor::build_descriptor;
use crate::request::{Params, RequestSpec};
use crate::response::{Response, ResponseBody};
use crate::transport::{RawResponse, ReqwestTransport, Transport, TransportDescriptor};
use crate::{Error, Result};
use http::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Declares the configuration of a concrete API.
///
/// # Examples
///
/// ```no_run
/// use apibase::{ApiClient, ApiDefinition, ClientConfig, Params, Response, ResponseBody};
/// use serde_json::json;
///
/// struct WeatherApi;
///
/// impl ApiDefinition for WeatherApi {
///     fn config(&self) -> apibase::Result<ClientConfig> {
///         ClientConfig::from_value(&json!({
///             "url": "weather.example.com/v2",
///             "params": {"units": "metric"}
///         }))
///     }
/// }
///
/// # async fn example() -> apibase::Result<()> {
/// let client = ApiClient::for_api(&WeatherApi)?;
/// let mut params = Params::new();
/// params.insert("city".to_string(), json!("Oslo"));
/// let forecast: Response<ResponseBody> = client.get("/forecast", params).await?;
/// println!("{:?}", forecast.data);
/// # Ok(())
/// # }
/// ```
pub trait ApiDefinition {
    /// The configuration every client of this API starts from.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    fn config(&self) -> Result<ClientConfig>;
}

/// A configured API client.
///
/// The client is cheap to clone; clones share configuration, transport and
/// the diagnostic last-error slot. Every call reports its own outcome through
/// the returned [`Result`].
///
/// # Examples
///
/// ```no_run
/// use apibase::{ApiClient, RequestSpec};
///
/// # async fn example() -> Result<(), apibase::Error> {
/// let client = ApiClient::builder()
///     .base_url("api.example.com")
///     .base_header("Accept", "application/json")
///     .build()?;
///
/// let spec = RequestSpec::post("/users").with_param("name", "Ann");
/// let created = client.send_request_and_get_body(spec).await?;
/// println!("Created: {:?} in {:?}", created.data, created.latency);
/// # Ok(())
/// # }
/// ```
pub struct ApiClient<T = ReqwestTransport> {
    inner: Arc<ClientInner<T>>,
}

struct ClientInner<T> {
    state: ClientState,
    transport: T,
    last_error: Mutex<String>,
}

impl<T> Clone for ApiClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl ApiClient<ReqwestTransport> {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates a client from a configuration, using the reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if the configuration is invalid.
    pub fn new(config: ClientConfig) -> Result<Self> {
        ClientBuilder::from_config(config).build()
    }

    /// Creates a client for a concrete API.
    ///
    /// # Errors
    ///
    /// Returns an error if the API's configuration is invalid.
    pub fn for_api<A: ApiDefinition>(api: &A) -> Result<Self> {
        Self::new(api.config()?)
    }
}

impl<T: Transport> ApiClient<T> {
    /// Creates a client that executes requests through `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if the configuration is invalid.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        ClientBuilder::from_config(config).build_with_transport(transport)
    }

    /// The validated configuration this client runs with.
    pub fn state(&self) -> &ClientState {
        &self.inner.state
    }

    /// The message of the most recent recorded failure, or an empty string.
    ///
    /// Transport failures record the transport's own error text. Unsuccessful
    /// responses are not failures and are never recorded.
    ///
    /// The slot is shared by every clone of this client and overwritten by
    /// each failure, so it only describes the latest failing call. Prefer the
    /// error returned by the call itself.
    pub fn last_error(&self) -> String {
        self.inner
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record<V>(&self, result: Result<V>) -> Result<V> {
        if let Err(e) = &result {
            if !e.is_no_data() {
                *self
                    .inner
                    .last_error
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = e.diagnostic();
            }
        }
        result
    }

    /// Builds the transport descriptor for a call without executing it.
    ///
    /// # Errors
    ///
    /// See [`build_descriptor`](crate::build_descriptor).
    pub fn build_descriptor(&self, spec: &RequestSpec) -> Result<TransportDescriptor> {
        self.record(build_descriptor(&self.inner.state, spec))
    }

    /// Sends a request and returns the raw status and body.
    ///
    /// Any response the server sends is returned, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built or the transport
    /// fails.
    pub async fn send_request(&self, spec: RequestSpec) -> Result<RawResponse> {
        self.execute(&spec).await.map(|(raw, _)| raw)
    }

    /// Executes a single request, measuring its latency.
    async fn execute(&self, spec: &RequestSpec) -> Result<(RawResponse, Duration)> {
        let descriptor = self.build_descriptor(spec)?;

        tracing::debug!(
            method = %descriptor.method,
            url = %descriptor.url,
            timeout_secs = descriptor.timeout.as_secs(),
            "Executing HTTP request"
        );

        let start_time = Instant::now();
        match self.inner.transport.execute(descriptor).await {
            Ok(raw) => {
                let latency = start_time.elapsed();
                tracing::info!(
                    status = raw.status,
                    latency_ms = latency.as_millis(),
                    "Received HTTP response"
                );
                Ok((raw, latency))
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    method = %spec.method,
                    path = %spec.path,
                    "Request failed"
                );
                self.record(Err(Error::Transport(e)))
            }
        }
    }

    /// Sends a request, classifies the outcome and decodes the body with the
    /// configured response format.
    ///
    /// # Errors
    ///
    /// * the errors of [`send_request`](Self::send_request)
    /// * [`Error::UnsuccessfulResponse`] when the response has no usable data
    /// * [`Error::DeserializationFailed`] when the body cannot be decoded
    pub async fn send_request_and_get_body(
        &self,
        spec: RequestSpec,
    ) -> Result<Response<ResponseBody>> {
        let (raw, latency) = self.execute(&spec).await?;

        let (status, headers, raw_body) = classify(raw).inspect_err(|e| {
            tracing::warn!(
                status = e.status().unwrap_or_default(),
                method = %spec.method,
                path = %spec.path,
                "Response carries no data"
            );
        })?;

        let data = self.decode(status, &raw_body)?;
        Ok(Response::new(data, raw_body, status, headers, latency))
    }

    /// Like [`send_request_and_get_body`](Self::send_request_and_get_body),
    /// then converts the body into `R`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeserializationFailed`] if the body does not match `R`,
    /// plus the errors of `send_request_and_get_body`.
    pub async fn send_request_as<R>(&self, spec: RequestSpec) -> Result<Response<R>>
    where
        R: DeserializeOwned,
    {
        let Response {
            data,
            raw_body,
            status,
            headers,
            latency,
        } = self.send_request_and_get_body(spec).await?;

        match data.deserialize::<R>() {
            Ok(data) => Ok(Response::new(data, raw_body, status, headers, latency)),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    raw_response = %raw_body,
                    "Failed to deserialize response"
                );
                self.record(Err(Error::DeserializationFailed {
                    raw_response: raw_body,
                    serde_error: e.to_string(),
                    status,
                }))
            }
        }
    }

    /// Decodes a usable response body with the configured response codec.
    ///
    /// A body the codec finds no payload in is the "no data" outcome.
    fn decode(&self, status: u16, raw_body: &str) -> Result<ResponseBody> {
        let codec = self.inner.state.response_codec();
        let result = match codec.decode(raw_body) {
            Ok(Some(data)) => Ok(data),
            Ok(None) => {
                tracing::warn!(
                    status,
                    response_format = codec.name(),
                    "Response body carries no payload"
                );
                Err(Error::UnsuccessfulResponse {
                    status,
                    raw_response: Some(raw_body.to_string()),
                })
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    response_format = codec.name(),
                    raw_response = %raw_body,
                    "Failed to decode response"
                );
                Err(Error::DeserializationFailed {
                    raw_response: raw_body.to_string(),
                    serde_error: e.to_string(),
                    status,
                })
            }
        };
        self.record(result)
    }

    /// Makes a GET request with `params` in the query string.
    pub async fn get(
        &self,
        path: impl Into<String>,
        params: Params,
    ) -> Result<Response<ResponseBody>> {
        self.send_request_and_get_body(RequestSpec::get(path).with_params(params))
            .await
    }

    /// Makes a POST request with `params` encoded as the body.
    pub async fn post(
        &self,
        path: impl Into<String>,
        params: Params,
    ) -> Result<Response<ResponseBody>> {
        self.send_request_and_get_body(RequestSpec::post(path).with_params(params))
            .await
    }

    /// Makes a PUT request with `params` encoded as the body.
    pub async fn put(
        &self,
        path: impl Into<String>,
        params: Params,
    ) -> Result<Response<ResponseBody>> {
        self.send_request_and_get_body(RequestSpec::put(path).with_params(params))
            .await
    }

    /// Makes a DELETE request with `params` encoded as the body.
    pub async fn delete(
        &self,
        path: impl Into<String>,
        params: Params,
    ) -> Result<Response<ResponseBody>> {
        self.send_request_and_get_body(RequestSpec::delete(path).with_params(params))
            .await
    }
}

/// Splits a raw response into status, headers and body if it carries usable
/// data.
///
/// A response is usable when it has a 2xx status and a body. Anything else
/// (no status, no body, 1xx/3xx/4xx/5xx) is the "no data" outcome.
///
/// # Errors
///
/// Returns [`Error::UnsuccessfulResponse`] for unusable responses.
///
/// # Examples
///
/// ```
/// use apibase::{classify, RawResponse};
///
/// let (status, _, body) = classify(RawResponse::new(200, "{}")).unwrap();
/// assert_eq!((status, body.as_str()), (200, "{}"));
///
/// let err = classify(RawResponse::new(404, "missing")).unwrap_err();
/// assert!(err.is_no_data());
/// ```
pub fn classify(raw: RawResponse) -> Result<(u16, HeaderMap, String)> {
    if !raw.is_usable() {
        return Err(Error::UnsuccessfulResponse {
            status: raw.status,
            raw_response: raw.body,
        });
    }

    let RawResponse {
        status,
        headers,
        body,
    } = raw;
    Ok((status, headers, body.unwrap_or_default()))
}

/// Builder for configuring and creating an [`ApiClient`].
///
/// Nothing is validated until [`build`](Self::build), which rejects invalid
/// configuration instead of falling back to defaults.
///
/// # Examples
///
/// ```no_run
/// use apibase::{BodyFormat, ClientBuilder, Protocol};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), apibase::Error> {
/// let client = ClientBuilder::new()
///     .base_url("api.example.com/v1")
///     .protocol(Protocol::Https)
///     .max_timeout(Duration::from_secs(30))
///     .request_format(BodyFormat::String)
///     .base_param("api_key", "abc123")
///     .base_header("User-Agent", "my-app/1.0")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    config: ClientConfig,
    request_codec: Option<Arc<dyn BodyCodec>>,
    response_codec: Option<Arc<dyn BodyCodec>>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings and no base URL.
    pub fn new() -> Self {
        Self::from_config(ClientConfig::new(""))
    }

    /// Starts from an existing configuration.
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            request_codec: None,
            response_codec: None,
        }
    }

    /// Sets the host and optional base path, without the scheme.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.config.protocol = protocol;
        self
    }

    /// Adds a parameter sent with every request.
    pub fn base_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.base_params.insert(key.into(), value.into());
        self
    }

    /// Adds parameters sent with every request.
    pub fn base_params(mut self, params: Params) -> Self {
        self.config.base_params.extend(params);
        self
    }

    /// Sets the request timeout. Sub-second precision is dropped.
    pub fn max_timeout(mut self, timeout: Duration) -> Self {
        self.config.max_timeout_secs = timeout.as_secs();
        self
    }

    /// Adds a header sent with every request.
    pub fn base_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.base_headers.push((name.into(), value.into()));
        self
    }

    pub fn request_format(mut self, format: BodyFormat) -> Self {
        self.config.request_format = format;
        self
    }

    pub fn response_format(mut self, format: BodyFormat) -> Self {
        self.config.response_format = format;
        self
    }

    pub fn transport_options(mut self, options: TransportOptions) -> Self {
        self.config.transport_options = options;
        self
    }

    /// Encodes request bodies with a custom codec instead of the configured
    /// request format.
    pub fn request_codec(mut self, codec: Arc<dyn BodyCodec>) -> Self {
        self.request_codec = Some(codec);
        self
    }

    /// Decodes response bodies with a custom codec instead of the configured
    /// response format.
    pub fn response_codec(mut self, codec: Arc<dyn BodyCodec>) -> Self {
        self.response_codec = Some(codec);
        self
    }

    /// Builds a client using the reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if the configuration is invalid
    /// or the HTTP client cannot be built.
    pub fn build(self) -> Result<ApiClient<ReqwestTransport>> {
        self.config.validate()?;
        let transport = ReqwestTransport::new(&self.config.transport_options)?;
        self.build_with_transport(transport)
    }

    /// Builds a client using a custom transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if the configuration is invalid.
    pub fn build_with_transport<T: Transport>(self, transport: T) -> Result<ApiClient<T>> {
        let state = self
            .config
            .into_state(self.request_codec, self.response_codec)
            .inspect_err(|e| tracing::error!(error = %e, "Invalid client configuration"))?;

        tracing::debug!(
            base_url = state.base_url(),
            protocol = %state.protocol(),
            request_format = state.request_codec().name(),
            response_format = state.response_codec().name(),
            "API client configured"
        );

        Ok(ApiClient {
            inner: Arc::new(ClientInner {
                state,
                transport,
                last_error: Mutex::new(String::new()),
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
