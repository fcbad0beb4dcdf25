use std::path::PathBuf;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

struct Running {
    addr: std::net::SocketAddr,
    stop: oneshot::Sender<()>,
    handle: tokio::task::JoinHandle<Result<(), codevis_core::CodevisError>>,
}

async fn start(data: PathBuf) -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let handle = tokio::spawn(codevis_serve::server::serve(listener, data, async {
        stopped.await.ok();
    }));
    Running { addr, stop, handle }
}

async fn get(addr: std::net::SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn serves_timeline_and_health_over_http() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("timeline.json");
    std::fs::write(&data, "{\"metadata\":{\"total_commits\":3}}").unwrap();

    let server = start(data).await;

    let response = get(server.addr, "/api/timeline").await;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response
        .to_ascii_lowercase()
        .contains("access-control-allow-origin: *"));
    assert!(response.ends_with("{\"metadata\":{\"total_commits\":3}}"));

    let response = get(server.addr, "/api/health").await;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.ends_with("{\"status\":\"ok\"}"));

    server.stop.send(()).unwrap();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn missing_document_and_unknown_route_are_404() {
    let dir = tempfile::tempdir().unwrap();
    let server = start(dir.path().join("absent.json")).await;

    let response = get(server.addr, "/api/timeline").await;
    assert!(response.starts_with("HTTP/1.1 404"), "{response}");
    assert!(response.ends_with("{\"error\":\"Timeline data not found\"}"));

    let response = get(server.addr, "/nowhere").await;
    assert!(response.starts_with("HTTP/1.1 404"), "{response}");

    server.stop.send(()).unwrap();
    server.handle.await.unwrap().unwrap();
}
