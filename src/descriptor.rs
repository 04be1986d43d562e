//! Resolves client state and a per-call [`RequestSpec`] into a
//! [`TransportDescriptor`].

use crate::codec::form_encode;
use crate::config::{header_map, ClientState};
use crate::request::{merge_params, RequestSpec};
use crate::transport::TransportDescriptor;
use crate::{Error, Result};
use http::Method;
use url::Url;

/// Builds the descriptor for one call.
///
/// Call parameters and headers are merged over the base ones. GET requests
/// carry the merged parameters in the query string; every other verb carries
/// them as a body encoded by the client's request codec.
///
/// # Errors
///
/// * [`Error::InvalidUrl`] if protocol, base URL and path do not form a URL
/// * [`Error::ConfigurationError`] if a call header is malformed
/// * [`Error::Encoding`] if the request codec rejects the parameters
pub fn build_descriptor(state: &ClientState, spec: &RequestSpec) -> Result<TransportDescriptor> {
    let params = merge_params(state.base_params(), &spec.params);

    let mut url = Url::parse(&format!(
        "{}://{}{}",
        state.protocol(),
        state.base_url(),
        spec.path
    ))?;

    let body = if spec.method == Method::GET {
        if !params.is_empty() {
            let encoded = form_encode(&params);
            let query = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{}&{}", existing, encoded),
                _ => encoded,
            };
            url.set_query(Some(&query));
        }
        None
    } else {
        let encoded = state
            .request_codec()
            .encode(&params)
            .map_err(|e| Error::Encoding(e.to_string()))?;
        Some(encoded)
    };

    let mut headers = state.default_headers();
    for (name, value) in header_map("headers", &spec.headers)? {
        if let Some(name) = name {
            headers.insert(name, value);
        }
    }

    Ok(TransportDescriptor {
        method: spec.method.clone(),
        url,
        headers,
        body,
        timeout: state.max_timeout(),
        options: state.transport_options().clone(),
    })
}
