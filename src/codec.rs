//! Body formats for request encoding and response decoding.
//!
//! A [`BodyCodec`] is picked once, when the client is built, from the
//! configured [`BodyFormat`]. Calls never branch on the format name again.
//! Implement [`BodyCodec`] to plug in formats beyond the two built-ins.

use crate::request::Params;
use crate::response::ResponseBody;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use url::form_urlencoded;

/// The body formats a client can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormat {
    /// JSON objects on the way out, any JSON value on the way in.
    #[default]
    Json,
    /// `application/x-www-form-urlencoded` on the way out, plain text on the
    /// way in.
    String,
}

impl BodyFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyFormat::Json => "json",
            BodyFormat::String => "string",
        }
    }

    /// Returns the built-in codec for this format.
    pub fn codec(self) -> Arc<dyn BodyCodec> {
        match self {
            BodyFormat::Json => Arc::new(JsonCodec),
            BodyFormat::String => Arc::new(PlainFormCodec),
        }
    }
}

impl fmt::Display for BodyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BodyFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(BodyFormat::Json),
            "string" => Ok(BodyFormat::String),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}

/// Returned when parsing a format name that is not `json` or `string`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported body format `{0}`")]
pub struct UnknownFormat(pub String);

/// Error produced by a codec while encoding or decoding a body.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct CodecError(pub String);

/// Encoding and decoding strategy for one body format.
///
/// # Examples
///
/// ```
/// use apibase::codec::{BodyCodec, CodecError};
/// use apibase::{Params, ResponseBody};
///
/// /// Sends parameters as `key: value` lines.
/// #[derive(Debug)]
/// struct LinesCodec;
///
/// impl BodyCodec for LinesCodec {
///     fn name(&self) -> &str {
///         "lines"
///     }
///
///     fn encode(&self, params: &Params) -> Result<String, CodecError> {
///         Ok(params
///             .iter()
///             .map(|(k, v)| format!("{}: {}", k, v))
///             .collect::<Vec<_>>()
///             .join("\n"))
///     }
///
///     fn decode(&self, raw: &str) -> Result<Option<ResponseBody>, CodecError> {
///         Ok(Some(ResponseBody::Text(raw.to_string())))
///     }
/// }
/// ```
pub trait BodyCodec: Send + Sync + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Encodes merged request parameters into a request body.
    fn encode(&self, params: &Params) -> Result<String, CodecError>;

    /// Decodes a raw response body.
    ///
    /// `Ok(None)` means the body carries no payload in this format, which the
    /// client reports as the "no data" outcome rather than a failure.
    fn decode(&self, raw: &str) -> Result<Option<ResponseBody>, CodecError>;
}

/// JSON bodies. Non-ASCII characters are written unescaped.
///
/// An empty or whitespace-only response body decodes to no payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl BodyCodec for JsonCodec {
    fn name(&self) -> &str {
        "json"
    }

    fn encode(&self, params: &Params) -> Result<String, CodecError> {
        serde_json::to_string(params).map_err(|e| CodecError(e.to_string()))
    }

    fn decode(&self, raw: &str) -> Result<Option<ResponseBody>, CodecError> {
        if raw.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str::<Value>(raw)
            .map(|value| Some(ResponseBody::Json(value)))
            .map_err(|e| CodecError(e.to_string()))
    }
}

/// Form-urlencoded request bodies and verbatim text responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormCodec;

impl BodyCodec for PlainFormCodec {
    fn name(&self) -> &str {
        "string"
    }

    fn encode(&self, params: &Params) -> Result<String, CodecError> {
        Ok(form_encode(params))
    }

    fn decode(&self, raw: &str) -> Result<Option<ResponseBody>, CodecError> {
        Ok(Some(ResponseBody::Text(raw.to_string())))
    }
}

/// Serializes parameters as `application/x-www-form-urlencoded`.
///
/// Nested values use bracket keys (`tags[0]=a`, `user[name]=b`), booleans
/// become `1`/`0` and nulls are left out.
pub fn form_encode(params: &Params) -> String {
    let mut pairs = Vec::with_capacity(params.len());
    for (key, value) in params {
        flatten_pair(key, value, &mut pairs);
    }

    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter())
        .finish()
}

fn flatten_pair(key: &str, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => pairs.push((key.to_string(), if *b { "1" } else { "0" }.to_string())),
        Value::Number(n) => pairs.push((key.to_string(), n.to_string())),
        Value::String(s) => pairs.push((key.to_string(), s.clone())),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten_pair(&format!("{}[{}]", key, i), item, pairs);
            }
        }
        Value::Object(map) => {
            for (k, item) in map {
                flatten_pair(&format!("{}[{}]", key, k), item, pairs);
            }
        }
    }
}
