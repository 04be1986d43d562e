//! Integration tests using wiremock to simulate HTTP servers.

use apibase::{
    ApiClient, ApiDefinition, ClientConfig, Error, Params, RequestSpec, Response, ResponseBody,
    TransportErrorKind,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    id: u32,
    name: String,
}

/// Builds a client for `server` from a loose configuration; `url` and
/// `protocol` are filled in.
fn client_for(server: &MockServer, mut config: Value) -> ApiClient {
    let host = server.uri().trim_start_matches("http://").to_string();
    config["url"] = json!(host);
    config["protocol"] = json!("http");

    ApiClient::new(ClientConfig::from_value(&config).unwrap()).unwrap()
}

fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        other => panic!("Expected an object, got {:?}", other),
    }
}

#[tokio::test]
async fn test_get_sends_merged_params_in_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("key", "abc"))
        .and(query_param("q", "x y"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hits": 3})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, json!({"params": {"key": "abc"}}));

    let response = client
        .get("/search", params(json!({"q": "x y"})))
        .await
        .unwrap();

    assert_eq!(response.data, ResponseBody::Json(json!({"hits": 3})));
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_post_sends_merged_params_as_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .and(body_json(json!({"a": 1, "b": 3, "c": 4})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1, "name": "Ann"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, json!({"params": {"a": 1, "b": 2}}));

    let response = client
        .post("/users", params(json!({"b": 3, "c": 4})))
        .await
        .unwrap();

    assert_eq!(response.data, ResponseBody::Json(json!({"id": 1, "name": "Ann"})));
    assert_eq!(response.status, 201);
}

#[tokio::test]
async fn test_end_to_end_typed_post() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .and(body_json(json!({"id": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":1,"name":"Ann"}"#))
        .mount(&mock_server)
        .await;

    let client = client_for(
        &mock_server,
        json!({"requestDataFormat": "json", "responseDataFormat": "json"}),
    );

    let response: Response<User> = client
        .send_request_as(RequestSpec::post("/users").with_param("id", 1))
        .await
        .unwrap();

    assert_eq!(
        response.data,
        User {
            id: 1,
            name: "Ann".to_string()
        }
    );
    assert_eq!(response.raw_body, r#"{"id":1,"name":"Ann"}"#);
    assert_eq!(client.last_error(), "");
}

#[tokio::test]
async fn test_put_with_string_formats() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/settings"))
        .and(body_string("a=1&b=2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("saved"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(
        &mock_server,
        json!({"requestDataFormat": "string", "responseDataFormat": "string"}),
    );

    let response = client
        .put("/settings", params(json!({"a": 1, "b": 2})))
        .await
        .unwrap();

    assert_eq!(response.data, ResponseBody::Text("saved".to_string()));
}

#[tokio::test]
async fn test_delete_carries_body_and_accepts_empty_text() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/users/1"))
        .and(body_json(json!({"reason": "closed"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, json!({"responseDataFormat": "string"}));

    let response = client
        .delete("/users/1", params(json!({"reason": "closed"})))
        .await
        .unwrap();

    assert_eq!(response.status, 204);
    assert_eq!(response.data, ResponseBody::Text(String::new()));
}

#[tokio::test]
async fn test_empty_json_body_is_no_data() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/users/1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, json!({}));

    let err = client
        .delete("/users/1", Params::new())
        .await
        .unwrap_err();

    assert!(err.is_no_data());
    assert!(matches!(err, Error::UnsuccessfulResponse { status: 204, .. }));
    assert_eq!(client.last_error(), "");
}

#[tokio::test]
async fn test_headers_are_merged() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("x-api-key", "secret"))
        .and(header("accept", "application/json"))
        .and(header("x-trace", "on"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 2, "name": "Bo"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(
        &mock_server,
        json!({
            "baseHeaders": {"X-Api-Key": "secret", "Accept": "text/plain"},
            "options": {"headers": {"X-Trace": "on"}}
        }),
    );

    let spec = RequestSpec::get("/me").with_header("Accept", "application/json");
    let response = client.send_request_as::<User>(spec).await.unwrap();

    assert_eq!(response.data.name, "Bo");
}

#[tokio::test]
async fn test_user_agent_option_is_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/agent"))
        .and(header("user-agent", "apibase-test/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(
        &mock_server,
        json!({"options": {"userAgent": "apibase-test/1.0", "connectTimeout": 5}}),
    );

    let response = client.get("/agent", Params::new()).await.unwrap();

    assert_eq!(response.data, ResponseBody::Json(json!({"ok": true})));
}

#[tokio::test]
async fn test_http_error_is_no_data() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, json!({}));

    let result = client.get("/missing", Params::new()).await;

    match result {
        Err(Error::UnsuccessfulResponse {
            status,
            raw_response,
        }) => {
            assert_eq!(status, 404);
            assert_eq!(raw_response.as_deref(), Some("Not found"));
        }
        _ => panic!("Expected UnsuccessfulResponse, got {:?}", result),
    }
    assert_eq!(client.last_error(), "");
}

#[tokio::test]
async fn test_send_request_returns_raw_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(503).set_body_string("try later"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, json!({}));

    let raw = client.send_request(RequestSpec::get("/busy")).await.unwrap();

    assert_eq!(raw.status, 503);
    assert_eq!(raw.body.as_deref(), Some("try later"));
}

#[tokio::test]
async fn test_timeout_is_a_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, json!({"maxTimeout": 1}));

    match client.send_request(RequestSpec::get("/slow")).await {
        Err(Error::Transport(e)) => {
            assert_eq!(e.kind(), TransportErrorKind::Timeout);
            assert_eq!(client.last_error(), e.message());
        }
        other => panic!("Expected a transport timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_failure_is_recorded() {
    // Nothing listens on port 1.
    let config = ClientConfig::from_value(&json!({"url": "127.0.0.1:1", "protocol": "http"}))
        .unwrap();
    let client = ApiClient::new(config).unwrap();

    let result = client.send_request(RequestSpec::get("/")).await;

    match result {
        Err(Error::Transport(e)) => {
            assert!(!e.message().is_empty());
            assert_eq!(client.last_error(), e.message());
        }
        other => panic!("Expected a transport error, got {:?}", other),
    }
}

/// A concrete client built on top of the base client.
struct UsersApi {
    host: String,
}

impl ApiDefinition for UsersApi {
    fn config(&self) -> apibase::Result<ClientConfig> {
        ClientConfig::from_value(&json!({
            "url": format!("{}/v1", self.host),
            "protocol": "http",
            "params": {"token": "t0k"},
            "maxTimeout": 10
        }))
    }
}

struct UsersClient {
    client: ApiClient,
}

impl UsersClient {
    fn new(api: &UsersApi) -> apibase::Result<Self> {
        Ok(Self {
            client: ApiClient::for_api(api)?,
        })
    }

    async fn user(&self, id: u32) -> apibase::Result<Option<User>> {
        let spec = RequestSpec::get(format!("/users/{}", id));
        match self.client.send_request_as::<User>(spec).await {
            Ok(response) => Ok(Some(response.data)),
            Err(e) if e.is_no_data() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[tokio::test]
async fn test_derived_client() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/users/7"))
        .and(query_param("token", "t0k"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7, "name": "Cy"})))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/users/8"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let api = UsersApi {
        host: mock_server.uri().trim_start_matches("http://").to_string(),
    };
    let users = UsersClient::new(&api).unwrap();

    assert_eq!(
        users.user(7).await.unwrap(),
        Some(User {
            id: 7,
            name: "Cy".to_string()
        })
    );
    assert_eq!(users.user(8).await.unwrap(), None);
}

#[tokio::test]
async fn test_invalid_config_yields_no_client() {
    let result = ClientConfig::from_value(&json!({"url": "api.test", "protocol": "ftp"}));
    assert!(matches!(result, Err(Error::ConfigurationError(msg)) if msg.contains("protocol")));

    let mut config = ClientConfig::new("api.test");
    config.max_timeout_secs = 0;
    assert!(matches!(
        ApiClient::new(config),
        Err(Error::ConfigurationError(_))
    ));
}
