//! Decoded response bodies and the wrapper that carries them back to callers.
//!
//! [`ResponseBody`] is what the response codec produces. [`Response`] pairs the
//! decoded data with the raw body, status, headers and latency of the call, so
//! business methods on a concrete client can log or inspect the exchange.

use http::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// A response body decoded according to the configured response format.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Any JSON value, including `false` and `null`.
    Json(Value),
    /// The body exactly as received.
    Text(String),
}

impl ResponseBody {
    /// Returns the JSON value, if this body was decoded as JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }

    /// Returns the text, if this body was passed through as a string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Json(_) => None,
            ResponseBody::Text(text) => Some(text),
        }
    }

    /// Converts the body into a typed value.
    ///
    /// JSON bodies are converted directly; text bodies are parsed as JSON
    /// first.
    ///
    /// # Examples
    ///
    /// ```
    /// use apibase::ResponseBody;
    /// use serde::Deserialize;
    /// use serde_json::json;
    ///
    /// #[derive(Deserialize)]
    /// struct User {
    ///     name: String,
    /// }
    ///
    /// let body = ResponseBody::Json(json!({"name": "Ann"}));
    /// let user: User = body.deserialize().unwrap();
    /// assert_eq!(user.name, "Ann");
    /// ```
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        match self {
            ResponseBody::Json(value) => serde_json::from_value(value),
            ResponseBody::Text(text) => serde_json::from_str(&text),
        }
    }
}

/// A successful, decoded response.
///
/// # Type Parameters
///
/// * `T` - The type of the decoded response data
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The decoded response data.
    pub data: T,

    /// The raw response body as a string.
    pub raw_body: String,

    /// The HTTP status code of the response.
    pub status: u16,

    /// The response headers.
    pub headers: HeaderMap,

    /// Time from handing the request to the transport until its response was
    /// received.
    pub latency: Duration,
}

impl<T> Response<T> {
    /// Creates a new `Response`.
    pub fn new(
        data: T,
        raw_body: String,
        status: u16,
        headers: HeaderMap,
        latency: Duration,
    ) -> Self {
        Self {
            data,
            raw_body,
            status,
            headers,
            latency,
        }
    }

    /// Maps the response data to a different type using the provided function.
    ///
    /// # Examples
    ///
    /// ```
    /// # use apibase::Response;
    /// # use http::HeaderMap;
    /// # use std::time::Duration;
    /// let response = Response::new(
    ///     42,
    ///     "42".to_string(),
    ///     200,
    ///     HeaderMap::new(),
    ///     Duration::from_millis(100),
    /// );
    ///
    /// let string_response = response.map(|n| n.to_string());
    /// assert_eq!(string_response.data, "42");
    /// ```
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            raw_body: self.raw_body,
            status: self.status,
            headers: self.headers,
            latency: self.latency,
        }
    }

    /// Returns a reference to a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

impl<T> AsRef<T> for Response<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_bodies_deserialize_as_json() {
        let body = ResponseBody::Text("[1,2,3]".to_string());
        let numbers: Vec<u32> = body.deserialize().unwrap();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn accessors_match_variant() {
        let json = ResponseBody::Json(json!(false));
        assert_eq!(json.as_json(), Some(&json!(false)));
        assert_eq!(json.as_text(), None);

        let text = ResponseBody::Text("ok".to_string());
        assert_eq!(text.as_text(), Some("ok"));
        assert_eq!(text.as_json(), None);
    }

    #[test]
    fn header_lookup() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "text/plain".parse().unwrap());
        let response = Response::new((), String::new(), 200, headers, Duration::ZERO);
        assert_eq!(response.header("content-type"), Some("text/plain"));
        assert_eq!(response.header("x-missing"), None);
    }
}
