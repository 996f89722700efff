//! Server integration tests.
//!
//! These tests start a real server, send raw TCP traffic, and assert on
//! observable behavior.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use waypoint::config::{Config, Docs, Server as ServerConfig};
use waypoint::{
    Context, DateTimeFormat, Describe, Documented, Endpoint, Fields, Flow, Param, Prop, Router,
    Values, json, response, server,
};

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct HelloWorld;

impl Endpoint for HelloWorld {
    fn describe() -> Describe {
        Describe::new().summary("This endpoint will display Hello world.")
    }

    fn fields() -> Fields {
        Fields::new().query(
            Param::new("name")
                .of::<String>()
                .description("name of the person to greet.")
                .example("Alex"),
        )
    }

    async fn handle(&self, _ctx: &mut Context, values: Values) -> waypoint::Result<Flow> {
        let name = values.str("name").unwrap_or("world");
        Ok(response::text(format!("Hello {name}")).into())
    }
}

struct UpdateUser;

impl Endpoint for UpdateUser {
    fn fields() -> Fields {
        Fields::new()
            .path(Param::new("id").of::<u64>())
            .body(Prop::new("age").of::<u32>())
            .body(Prop::new("seen").format(DateTimeFormat))
    }

    async fn handle(&self, _ctx: &mut Context, values: Values) -> waypoint::Result<Flow> {
        Ok(response::ok(&json!({
            "id": values.i64("id"),
            "age": values.json("age"),
            "seen": values.timestamp("seen").map(|t| t.to_string()),
        }))?
        .into())
    }
}

/// Start a test server on a random port with the hello and user routes and
/// the API document at `/api-docs`.
async fn start_test_server() -> server::Server {
    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        docs: Docs::default(),
    };

    let mut router = Router::new();
    router
        .get("/api/hello", Documented::new(HelloWorld))
        .put("/api/users/:id", Documented::new(UpdateUser))
        .openapi(&config.docs.path, (&config.docs).into());

    server::start(&config, router.into_handle())
        .await
        .expect("failed to start test server")
}

/// Send a raw HTTP/1.1 request with `Connection: close` and read the full response.
async fn raw_request(addr: SocketAddr, payload: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("failed to connect");
    stream.write_all(payload).await.expect("failed to write");

    let mut buf = Vec::new();
    let _ = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        stream.read_to_end(&mut buf),
    )
    .await;
    String::from_utf8_lossy(&buf).into_owned()
}

fn get(path: &str) -> Vec<u8> {
    format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").into_bytes()
}

fn put_json(path: &str, body: &str) -> Vec<u8> {
    format!(
        "PUT {path} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
    .into_bytes()
}

fn body(response: &str) -> &str {
    response.split("\r\n\r\n").nth(1).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn query_value_reaches_handler() {
    let server = start_test_server().await;

    let resp = raw_request(server.addr(), &get("/api/hello?name=Alex")).await;
    assert!(resp.starts_with("HTTP/1.1 200"), "unexpected: {resp}");
    assert!(resp.ends_with("Hello Alex"), "unexpected: {resp}");

    let resp = raw_request(server.addr(), &get("/api/hello")).await;
    assert!(resp.ends_with("Hello world"), "unexpected: {resp}");

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn body_and_path_values_are_decoded() {
    let server = start_test_server().await;

    let resp = raw_request(
        server.addr(),
        &put_json(
            "/api/users/12",
            r#"{"age": "42", "seen": "2024-01-15T10:00:00Z"}"#,
        ),
    )
    .await;
    assert!(resp.starts_with("HTTP/1.1 200"), "unexpected: {resp}");
    let value: serde_json::Value = serde_json::from_str(body(&resp)).unwrap();
    assert_eq!(
        value,
        json!({ "id": 12, "age": 42, "seen": "2024-01-15T10:00:00Z" })
    );

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn invalid_date_is_rejected() {
    let server = start_test_server().await;

    let resp = raw_request(
        server.addr(),
        &put_json("/api/users/12", r#"{"seen": "not-a-date"}"#),
    )
    .await;
    assert!(resp.starts_with("HTTP/1.1 400"), "unexpected: {resp}");
    assert!(body(&resp).contains("seen"));

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn serves_api_document() {
    let server = start_test_server().await;

    let resp = raw_request(server.addr(), &get("/api-docs")).await;
    assert!(resp.starts_with("HTTP/1.1 200"), "unexpected: {resp}");
    let doc: serde_json::Value = serde_json::from_str(body(&resp)).unwrap();
    assert_eq!(doc["openapi"], "3.0.1");
    assert_eq!(
        doc["paths"]["/api/hello"]["get"]["summary"],
        "This endpoint will display Hello world."
    );
    assert!(doc["paths"]["/api/users/{id}"]["put"]["requestBody"].is_object());

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn standard_headers_present() {
    let server = start_test_server().await;

    let resp = raw_request(server.addr(), &get("/missing")).await;
    assert!(resp.starts_with("HTTP/1.1 404"), "unexpected: {resp}");
    let lower = resp.to_ascii_lowercase();
    assert!(lower.contains("x-content-type-options: nosniff"));
    assert!(lower.contains("x-frame-options: deny"));

    server.shutdown().await.unwrap();
}
