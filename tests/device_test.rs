use std::fs;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use mock_iot_device::http::server::FileServer;

async fn spawn_server(root: PathBuf) -> (SocketAddr, CancellationToken, JoinHandle<()>) {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, 0));
    let server = FileServer::bind(addr, root)
        .await
        .expect("Failed to bind file server");
    let addr = server.local_addr().unwrap();

    let cancel = CancellationToken::new();
    let server_cancel = cancel.clone();
    let handle = tokio::spawn(async move {
        server.serve(server_cancel).await.unwrap();
    });

    (addr, cancel, handle)
}

#[tokio::test]
async fn serves_files_over_a_real_socket() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("hello.txt"), "hi").unwrap();

    let (addr, cancel, handle) = spawn_server(dir.path().to_path_buf()).await;

    let ok = reqwest::get(format!("http://{}/hello.txt", addr))
        .await
        .unwrap();
    assert_eq!(ok.status(), reqwest::StatusCode::OK);
    assert_eq!(ok.text().await.unwrap(), "hi");

    let missing = reqwest::get(format!("http://{}/does-not-exist", addr))
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn concurrent_requests_both_complete() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.txt"), "aaa").unwrap();
    fs::write(dir.path().join("b.txt"), "bbb").unwrap();

    let (addr, cancel, handle) = spawn_server(dir.path().to_path_buf()).await;

    let (first, second) = tokio::join!(
        reqwest::get(format!("http://{}/a.txt", addr)),
        reqwest::get(format!("http://{}/b.txt", addr)),
    );

    assert_eq!(first.unwrap().text().await.unwrap(), "aaa");
    assert_eq!(second.unwrap().text().await.unwrap(), "bbb");

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn stopped_server_refuses_new_connections() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("hello.txt"), "hi").unwrap();

    let (addr, cancel, handle) = spawn_server(dir.path().to_path_buf()).await;

    let before = reqwest::get(format!("http://{}/hello.txt", addr))
        .await
        .unwrap();
    assert_eq!(before.status(), reqwest::StatusCode::OK);

    cancel.cancel();
    handle.await.unwrap();

    let after = reqwest::get(format!("http://{}/hello.txt", addr)).await;
    assert!(after.is_err());
}

#[tokio::test]
async fn bind_conflict_is_a_startup_error() {
    let dir = TempDir::new().unwrap();

    let first = FileServer::bind(
        SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
        dir.path().to_path_buf(),
    )
    .await
    .unwrap();
    let addr = first.local_addr().unwrap();

    let second = FileServer::bind(addr, dir.path().to_path_buf()).await;
    assert!(second.is_err());
}
