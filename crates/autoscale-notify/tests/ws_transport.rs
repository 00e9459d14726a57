//! Websocket transport against a real tungstenite server on loopback.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use autoscale_notify::*;

const G1: &str = r#"{"groupID":"g1","delta":2,"count":5,"createdAt":"2024-05-01T12:00:00Z"}"#;
const WAIT: Duration = Duration::from_secs(10);

#[tokio::test]
async fn server_close_gets_a_close_reply() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        ws.send(Message::text(G1)).await.unwrap();
        ws.close(None).await.unwrap();
        // A clean client answers with its own close frame.
        ws.next().await
    });

    let mut conn = WsTransport
        .connect(&format!("ws://{addr}{NOTIFICATIONS_PATH}"))
        .await
        .unwrap();

    let first = tokio::time::timeout(WAIT, conn.next_frame()).await.unwrap();
    assert_eq!(first.unwrap().unwrap(), Frame::Text(G1.to_string()));

    let end = tokio::time::timeout(WAIT, conn.next_frame()).await.unwrap();
    assert!(end.is_none());

    let reply = tokio::time::timeout(WAIT, server).await.unwrap().unwrap();
    assert!(
        matches!(reply, Some(Ok(Message::Close(_)))),
        "server saw {reply:?} instead of a close reply"
    );
}

#[tokio::test]
async fn refused_connection_is_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = WsTransport
        .connect(&format!("ws://{addr}{NOTIFICATIONS_PATH}"))
        .await;
    assert!(result.is_err());
}
