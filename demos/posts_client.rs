//! A concrete API client built on `apibase`.
//!
//! This example shows how to:
//! - Declare an API's configuration with `ApiDefinition`
//! - Wrap `ApiClient` in business methods
//! - Tell "no data" apart from real failures
//!
//! Run with: `cargo run --example posts_client`

use apibase::{ApiClient, ApiDefinition, ClientConfig, RequestSpec};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

/// JSONPlaceholder, a public fake REST API.
struct Placeholder;

impl ApiDefinition for Placeholder {
    fn config(&self) -> apibase::Result<ClientConfig> {
        ClientConfig::from_value(&json!({
            "url": "jsonplaceholder.typicode.com",
            "baseHeaders": {"Content-Type": "application/json; charset=UTF-8"},
            "maxTimeout": 15,
            "options": {"userAgent": "apibase-demo/0.1"}
        }))
    }
}

struct PostsClient {
    client: ApiClient,
}

impl PostsClient {
    fn new() -> apibase::Result<Self> {
        Ok(Self {
            client: ApiClient::for_api(&Placeholder)?,
        })
    }

    /// Returns `None` when the post does not exist.
    async fn post(&self, id: u32) -> apibase::Result<Option<Post>> {
        let spec = RequestSpec::get(format!("/posts/{}", id));
        match self.client.send_request_as::<Post>(spec).await {
            Ok(response) => Ok(Some(response.data)),
            Err(e) if e.is_no_data() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn posts_by(&self, user_id: u32) -> apibase::Result<Vec<Post>> {
        let spec = RequestSpec::get("/posts").with_param("userId", user_id);
        Ok(self.client.send_request_as(spec).await?.data)
    }

    async fn create(&self, user_id: u32, title: &str, body: &str) -> apibase::Result<Post> {
        let spec = RequestSpec::post("/posts")
            .with_param("userId", user_id)
            .with_param("title", title)
            .with_param("body", body);
        Ok(self.client.send_request_as(spec).await?.data)
    }
}

#[tokio::main]
async fn main() -> Result<(), apibase::Error> {
    tracing_subscriber::fmt()
        .with_env_filter("apibase=debug,posts_client=info")
        .init();

    let posts = PostsClient::new()?;

    println!("=== Single post ===");
    match posts.post(1).await? {
        Some(post) => println!("#{}: {}", post.id, post.title),
        None => println!("Post 1 not found"),
    }

    println!("=== Missing post ===");
    println!("{:?}", posts.post(100_000).await?);

    println!("=== Posts by user 2 ===");
    for post in posts.posts_by(2).await? {
        println!("#{}: {}", post.id, post.title);
    }

    println!("=== Create ===");
    let created = posts
        .create(1, "Hello", "Created through apibase")
        .await?;
    println!("Created post #{} for user {}", created.id, created.user_id);

    Ok(())
}
