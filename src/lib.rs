//! # apibase - a base pipeline for typed HTTP API clients
//!
//! `apibase` takes care of everything between a business method on an API
//! client and the network: it validates the client configuration, merges base
//! and per-call parameters and headers, encodes them for the HTTP verb in use,
//! hands the resulting request to a transport, classifies the outcome and
//! decodes the response body.
//!
//! Concrete API clients wrap an [`ApiClient`] and only supply endpoint paths
//! and parameters.
//!
//! ## Quick Start
//!
//! ```no_run
//! use apibase::{ApiClient, ClientConfig, RequestSpec, Response};
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! /// A concrete client for a users API.
//! struct UsersApi {
//!     client: ApiClient,
//! }
//!
//! impl UsersApi {
//!     fn new() -> apibase::Result<Self> {
//!         let config = ClientConfig::from_value(&json!({
//!             "url": "api.example.com/v1",
//!             "baseHeaders": {"Content-Type": "application/json"},
//!             "maxTimeout": 30
//!         }))?;
//!         Ok(Self { client: ApiClient::new(config)? })
//!     }
//!
//!     async fn user(&self, id: u64) -> apibase::Result<Response<User>> {
//!         let spec = RequestSpec::get("/users").with_param("id", id);
//!         self.client.send_request_as(spec).await
//!     }
//!
//!     async fn create(&self, name: &str) -> apibase::Result<Response<User>> {
//!         let spec = RequestSpec::post("/users").with_param("name", name);
//!         self.client.send_request_as(spec).await
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> apibase::Result<()> {
//!     let api = UsersApi::new()?;
//!     let created = api.create("Ann").await?;
//!     let fetched = api.user(created.data.id).await?;
//!     println!("{} ({:?})", fetched.data.name, fetched.latency);
//!     Ok(())
//! }
//! ```
//!
//! ## Request building
//!
//! * Call parameters are merged over the configured base parameters.
//! * GET requests carry them as a form-urlencoded query string; every other
//!   verb carries them as a body in the configured request format (`json` or
//!   form-urlencoded `string`).
//! * Call headers are merged over base headers. No content type is added
//!   implicitly.
//!
//! ## Outcomes
//!
//! Every call returns a [`Result`]. Transport failures, encoding failures and
//! decode failures are errors and are also remembered by
//! [`ApiClient::last_error`]. A response without a 2xx status, without a
//! body, or with a blank body under the `json` format is the "no data"
//! outcome, [`Error::UnsuccessfulResponse`], which is not remembered:
//!
//! ```no_run
//! use apibase::{ApiClient, Error, RequestSpec};
//!
//! # async fn example(client: ApiClient) {
//! match client.send_request_and_get_body(RequestSpec::get("/users/7")).await {
//!     Ok(response) => println!("Found: {:?}", response.data),
//!     Err(e) if e.is_no_data() => println!("Nothing there"),
//!     Err(Error::Transport(e)) => eprintln!("Network trouble: {}", e),
//!     Err(e) => eprintln!("Call failed: {} (last error: {})", e, client.last_error()),
//! }
//! # }
//! ```
//!
//! ## Transports
//!
//! [`ReqwestTransport`] is used by default. Implement [`Transport`] to run
//! requests through anything else.

mod client;
pub mod codec;
mod config;
mod descriptor;
mod error;
mod request;
mod response;
mod transport;

pub use client::{classify, ApiClient, ApiDefinition, ClientBuilder};
pub use codec::{BodyCodec, BodyFormat};
pub use config::{ClientConfig, ClientState, Protocol, TransportOptions, DEFAULT_MAX_TIMEOUT_SECS};
pub use descriptor::build_descriptor;
pub use error::{Error, Result, TransportError, TransportErrorKind};
pub use request::{Params, RequestSpec};
pub use response::{Response, ResponseBody};
pub use transport::{RawResponse, ReqwestTransport, Transport, TransportDescriptor};
