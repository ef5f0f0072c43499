mod common;

use axum::http::HeaderValue;
use marquee::{ServerConfig, db::Database, rate_limit::RateLimitConfig, run_server};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn raw_request(addr: std::net::SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

#[tokio::test]
async fn test_run_server_serves_over_tcp() {
    let db = Database::open(":memory:").await.unwrap();
    let config = ServerConfig {
        db,
        session: common::session_config(),
        allowed_origins: vec![HeaderValue::from_static("http://localhost:3000")],
        rate_limit: RateLimitConfig::new(),
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(run_server(config, listener));

    let response = raw_request(
        addr,
        "GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    assert!(response.contains("\"status\":\"active\""));

    // The login limiter reads the real peer address, so a bad login is a 401, not a 403.
    let body = r#"{"email":"a@b.com","password":"nope"}"#;
    let response = raw_request(
        addr,
        &format!(
            "POST /authenticate HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        ),
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 401"), "{}", response);

    handle.abort();
}
