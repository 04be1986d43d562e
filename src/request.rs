//! Per-call request description.

use http::Method;
use serde_json::{Map, Value};

/// Request parameters: an ordered mapping of names to JSON values.
///
/// Base parameters come first and call parameters are merged over them, so
/// encoded queries and bodies list keys in that order.
pub type Params = Map<String, Value>;

/// Everything a single call contributes on top of the client's base state.
///
/// A `RequestSpec` is created fresh for every call and consumed by it.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    /// The HTTP method (GET, POST, etc.).
    pub method: Method,

    /// The path appended to the base URL, e.g. `/users`.
    pub path: String,

    /// Call parameters, merged over the base parameters.
    pub params: Params,

    /// Call headers, merged over the base headers.
    pub headers: Vec<(String, String)>,
}

impl RequestSpec {
    /// Creates a new `RequestSpec` with the given method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Params::new(),
            headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Adds a parameter, replacing any earlier value for the same key.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Adds multiple parameters.
    pub fn with_params(mut self, params: impl IntoIterator<Item = (String, Value)>) -> Self {
        self.params.extend(params);
        self
    }

    /// Adds a header. Names are validated when the request is built.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl Default for RequestSpec {
    fn default() -> Self {
        Self::new(Method::GET, "")
    }
}

/// Merges `overrides` over `base`; keys in `overrides` win and keep the
/// position they had in `base`.
pub(crate) fn merge_params(base: &Params, overrides: &Params) -> Params {
    let mut merged = base.clone();
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn call_params_override_base_params() {
        let base = RequestSpec::get("").with_param("a", 1).with_param("b", 2).params;
        let call = RequestSpec::get("").with_param("b", 3).with_param("c", 4).params;

        let merged = merge_params(&base, &call);
        assert_eq!(Value::Object(merged), json!({"a": 1, "b": 3, "c": 4}));
    }

    #[test]
    fn merge_keeps_base_order() {
        let base = RequestSpec::get("").with_param("a", 1).with_param("b", 2).params;
        let call = RequestSpec::get("").with_param("c", 4).with_param("b", 3).params;

        let keys: Vec<_> = merge_params(&base, &call).keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn builders_set_method() {
        assert_eq!(RequestSpec::post("/x").method, Method::POST);
        assert_eq!(RequestSpec::put("/x").method, Method::PUT);
        assert_eq!(RequestSpec::delete("/x").method, Method::DELETE);
        assert_eq!(RequestSpec::default().method, Method::GET);
    }
}
