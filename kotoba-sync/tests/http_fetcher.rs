use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use httpmock::prelude::*;
use kotoba_core::{AssetLayout, AudioLayout, ResourceIdentity};
use kotoba_sync::{
    AssetFetcher, FailureReason, FetchError, FetchOptions, HttpFetcher, SyncConfig,
    SyncCoordinator, SyncOutcome,
};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const LAST_MODIFIED: &str = "Mon, 01 Apr 2019 12:30:15 GMT";

fn id(raw: &str) -> ResourceIdentity {
    ResourceIdentity::parse(raw).expect("valid id")
}

fn fetcher_for(base_url: &str) -> HttpFetcher {
    let layout: Arc<dyn AssetLayout> = Arc::new(AudioLayout::new(base_url));
    let options = FetchOptions {
        request_timeout: Duration::from_secs(5),
        ..FetchOptions::default()
    };
    HttpFetcher::new(layout, &options).expect("client")
}

#[tokio::test]
async fn fetch_returns_body_and_descriptor() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/res/keyword/audio/A1W/A1W_0001.mp3");
            then.status(200)
                .header("Last-Modified", LAST_MODIFIED)
                .body("ID3-fake-audio");
        })
        .await;

    let asset = fetcher_for(&server.base_url())
        .fetch(&id("A1-0001"))
        .await
        .expect("fetch");

    mock.assert_async().await;
    assert_eq!(asset.bytes.as_ref(), b"ID3-fake-audio");
    assert_eq!(asset.descriptor.byte_len, 14);
    assert_eq!(
        asset.descriptor.last_modified,
        Utc.with_ymd_and_hms(2019, 4, 1, 12, 30, 15).unwrap()
    );
}

#[tokio::test]
async fn not_found_maps_to_http_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/res/keyword/audio/A1W/A1W_0404.mp3");
            then.status(404);
        })
        .await;

    let err = fetcher_for(&server.base_url())
        .fetch(&id("A1-0404"))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(404));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn missing_last_modified_is_not_a_valid_asset() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/res/keyword/audio/A1W/A1W_0002.mp3");
            then.status(200).body("no date");
        })
        .await;

    let err = fetcher_for(&server.base_url())
        .fetch(&id("A1-0002"))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::MissingHeader { .. }));
}

#[tokio::test]
async fn refused_connection_is_a_retryable_transport_error() {
    // Bind then drop a listener to get a port nothing listens on.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let err = fetcher_for(&format!("http://127.0.0.1:{port}"))
        .fetch(&id("A1-0003"))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport { .. }), "got {err:?}");
    assert!(err.is_retryable());
}

/// Serve exactly one connection with `response` verbatim, then close it.
async fn serve_once(response: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
    });
    base_url
}

#[tokio::test]
async fn truncated_body_is_a_retryable_transport_error() {
    let base_url = serve_once(format!(
        "HTTP/1.1 200 OK\r\nContent-Length: 10\r\nLast-Modified: {LAST_MODIFIED}\r\n\
         Connection: close\r\n\r\nabcd"
    ))
    .await;

    let err = fetcher_for(&base_url)
        .fetch(&id("A1-0005"))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport { .. }), "got {err:?}");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn chunked_body_without_length_uses_received_size() {
    let base_url = serve_once(format!(
        "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nLast-Modified: {LAST_MODIFIED}\r\n\
         Connection: close\r\n\r\n4\r\nabcd\r\n3\r\nefg\r\n0\r\n\r\n"
    ))
    .await;

    let asset = fetcher_for(&base_url)
        .fetch(&id("A1-0006"))
        .await
        .expect("fetch");
    assert_eq!(asset.bytes.as_ref(), b"abcdefg");
    assert_eq!(asset.descriptor.byte_len, 7);
}

async fn mock_asset<'a>(server: &'a MockServer, body: &'static str) -> httpmock::Mock<'a> {
    server
        .mock_async(|when, then| {
            when.method(GET).path("/res/keyword/audio/A2-1W/A2-1W_0007.mp3");
            then.status(200)
                .header("Last-Modified", LAST_MODIFIED)
                .body(body);
        })
        .await
}

#[tokio::test]
async fn end_to_end_mirror_is_idempotent() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/res/keyword/audio/A2-1W/A2-1W_0008.mp3");
            then.status(404);
        })
        .await;

    let base = TempDir::new().unwrap();
    let layout: Arc<dyn AssetLayout> = Arc::new(AudioLayout::new(server.base_url()));
    let coordinator = SyncCoordinator::new(
        Arc::new(fetcher_for(&server.base_url())),
        SyncConfig::new(base.path().join("media"), layout),
    );
    let batch = [id("A2-1-0007"), id("A2-1-0008")];

    let mut first_mock = mock_asset(&server, "seven").await;
    let first = coordinator.sync_all(&batch).await;
    first_mock.assert_async().await;
    first_mock.delete_async().await;
    assert_eq!(first.outcome_of(&batch[0]), Some(&SyncOutcome::Downloaded));
    assert!(matches!(
        first.outcome_of(&batch[1]),
        Some(SyncOutcome::Failed(FailureReason::Fetch(FetchError::Http { status: 404, .. })))
    ));

    // Same size and Last-Modified, different bytes: must be judged fresh.
    let second_mock = mock_asset(&server, "SEVEN").await;
    let second = coordinator.sync_all(&batch).await;
    second_mock.assert_async().await;
    assert_eq!(second.outcome_of(&batch[0]), Some(&SyncOutcome::SkippedFresh));

    let written = base.path().join("media").join("A2-1W_0007.mp3");
    assert_eq!(std::fs::read(written).unwrap(), b"seven");
}
