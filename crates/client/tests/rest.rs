//! REST-layer tests against a minimal in-process HTTP server.

use std::time::Duration;

use client::{ApiError, ClientConfig, Session};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    time::timeout,
};

const WAIT: Duration = Duration::from_secs(5);

/// Accept one connection and answer every request with the given status
/// line and body.
async fn serve_once(listener: TcpListener, status_line: &str, body: &str) {
    let (mut stream, _) = listener.accept().await.expect("accept failed");
    let mut buf = [0u8; 2048];
    let _ = stream.read(&mut buf).await;
    let response = format!(
        "{status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    stream
        .write_all(response.as_bytes())
        .await
        .expect("write failed");
}

#[tokio::test]
async fn unauthorized_board_list_forces_logout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(async move {
        serve_once(listener, "HTTP/1.1 401 Unauthorized", "").await;
    });

    let session = Session::new(ClientConfig::new(format!("http://127.0.0.1:{port}/api")));
    session.api().set_token(Some("stale".to_string()));
    session.store().set_token(Some("stale".to_string()));

    let result = timeout(WAIT, session.boards().list()).await.unwrap();

    assert!(matches!(result, Err(ApiError::Unauthorized)));
    assert!(!session.store().is_authenticated());
    assert_eq!(session.api().token(), None);
    timeout(WAIT, server).await.unwrap().unwrap();
}

#[tokio::test]
async fn successful_board_list_leaves_the_session_alone() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(async move {
        serve_once(
            listener,
            "HTTP/1.1 200 OK",
            r#"[{"id":1,"title":"Sprint"}]"#,
        )
        .await;
    });

    let session = Session::new(ClientConfig::new(format!("http://127.0.0.1:{port}/api")));
    session.api().set_token(Some("jwt".to_string()));
    session.store().set_token(Some("jwt".to_string()));

    let boards = timeout(WAIT, session.boards().list())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(boards.len(), 1);
    assert_eq!(boards[0].title, "Sprint");
    assert!(session.store().is_authenticated());
    timeout(WAIT, server).await.unwrap().unwrap();
}
