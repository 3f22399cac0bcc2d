//! Socket tests against an in-process STOMP-over-WebSocket server.

use std::time::Duration;

use client::{
    ClientConfig, Session,
    socket::{SocketClient, SocketCommand, SocketEvent},
    stomp::{Command, Frame},
};
use futures::{SinkExt, StreamExt};
use models::events::Topic;
use stores::BoardChange;
use tokio::{
    net::{TcpListener, TcpStream},
    time::timeout,
};
use tokio_tungstenite::{WebSocketStream, accept_async, tungstenite::Message};

const WAIT: Duration = Duration::from_secs(5);

type ServerSocket = WebSocketStream<TcpStream>;

/// Read frames from the client, skipping heartbeats. Returns `None` when
/// the client closes the connection.
async fn next_client_frame(ws: &mut ServerSocket) -> Option<Frame> {
    loop {
        match ws.next().await?.expect("websocket error") {
            Message::Text(text) => {
                if let Some(frame) = Frame::parse(&text).expect("malformed client frame") {
                    return Some(frame);
                }
            }
            Message::Close(_) => return None,
            _ => {}
        }
    }
}

async fn send_frame(ws: &mut ServerSocket, frame: Frame) {
    ws.send(Message::Text(frame.serialize().into()))
        .await
        .expect("server send failed");
}

/// Accept one connection and perform the CONNECT/CONNECTED handshake,
/// asserting the bearer token.
async fn accept_and_handshake(listener: TcpListener, token: &str) -> ServerSocket {
    let (stream, _) = listener.accept().await.expect("accept failed");
    let mut ws = accept_async(stream).await.expect("ws handshake failed");

    let connect = next_client_frame(&mut ws).await.expect("client hung up");
    assert_eq!(connect.command, Command::Connect);
    assert_eq!(
        connect.header("Authorization"),
        Some(format!("Bearer {token}").as_str())
    );

    send_frame(
        &mut ws,
        Frame::new(Command::Connected)
            .with_header("version", "1.2")
            .with_header("heart-beat", "10000,10000"),
    )
    .await;
    ws
}

#[tokio::test]
async fn subscribe_receives_topic_messages_and_disconnects() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        let mut ws = accept_and_handshake(listener, "jwt").await;

        let subscribe = next_client_frame(&mut ws).await.expect("client hung up");
        assert_eq!(subscribe.command, Command::Subscribe);
        assert_eq!(subscribe.header("destination"), Some("/topic/boards/7"));
        let sub_id = subscribe.header("id").expect("missing id").to_string();

        send_frame(
            &mut ws,
            Frame::new(Command::Message)
                .with_header("subscription", &sub_id)
                .with_header("destination", "/topic/boards/7")
                .with_header("message-id", "m-1")
                .with_body(r#"{"type":"BOARD_UPDATED","board":{"id":7,"title":"Renamed"}}"#),
        )
        .await;

        let disconnect = next_client_frame(&mut ws).await.expect("client hung up");
        assert_eq!(disconnect.command, Command::Disconnect);
        assert!(next_client_frame(&mut ws).await.is_none());
    });

    let config = ClientConfig::new(format!("http://127.0.0.1:{port}/api"));
    let (socket, mut event_rx, command_tx, command_rx) =
        SocketClient::new(config, "jwt".to_string());
    let run = tokio::spawn(socket.run(command_rx));

    let event = timeout(WAIT, event_rx.recv()).await.unwrap().unwrap();
    assert!(matches!(event, SocketEvent::Connected));

    command_tx
        .send(SocketCommand::Subscribe {
            topic: Topic::Board(7),
            handler: None,
        })
        .await
        .unwrap();

    let event = timeout(WAIT, event_rx.recv()).await.unwrap().unwrap();
    match event {
        SocketEvent::Message { key, topic, body } => {
            assert_eq!(key, "board-7");
            assert_eq!(topic, Topic::Board(7));
            assert!(body.contains("BOARD_UPDATED"));
        }
        other => panic!("expected a message event, got {other:?}"),
    }

    command_tx.send(SocketCommand::Disconnect).await.unwrap();
    timeout(WAIT, run).await.unwrap().unwrap();
    timeout(WAIT, server).await.unwrap().unwrap();
}

#[tokio::test]
async fn disconnect_while_down_stops_the_reconnect_loop() {
    // grab a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = ClientConfig::new(format!("http://127.0.0.1:{port}/api"));
    let (socket, _event_rx, command_tx, command_rx) =
        SocketClient::new(config, "jwt".to_string());
    let run = tokio::spawn(socket.run(command_rx));

    command_tx.send(SocketCommand::Disconnect).await.unwrap();

    // the loop must exit from the connect-failure/retry phase, not hang
    // until a connection succeeds
    timeout(WAIT, run).await.unwrap().unwrap();
}

#[tokio::test]
async fn dropping_the_command_sender_stops_the_reconnect_loop() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = ClientConfig::new(format!("http://127.0.0.1:{port}/api"));
    let (socket, _event_rx, command_tx, command_rx) =
        SocketClient::new(config, "jwt".to_string());
    let run = tokio::spawn(socket.run(command_rx));

    drop(command_tx);

    timeout(WAIT, run).await.unwrap().unwrap();
}

#[tokio::test]
async fn session_feeds_user_board_events_into_the_store() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        let mut ws = accept_and_handshake(listener, "session-jwt").await;

        // the event pump subscribes to the user feed on every connect
        let subscribe = next_client_frame(&mut ws).await.expect("client hung up");
        assert_eq!(subscribe.command, Command::Subscribe);
        assert_eq!(subscribe.header("destination"), Some("/user/topic/boards"));
        let sub_id = subscribe.header("id").expect("missing id").to_string();

        send_frame(
            &mut ws,
            Frame::new(Command::Message)
                .with_header("subscription", &sub_id)
                .with_header("destination", "/user/topic/boards")
                .with_header("message-id", "m-1")
                .with_body(r#"{"type":"BOARD_CREATED","board":{"id":3,"title":"Ops"}}"#),
        )
        .await;

        // logout: UNSUBSCRIBE for the user feed, then DISCONNECT
        loop {
            match next_client_frame(&mut ws).await {
                Some(frame) if frame.command == Command::Unsubscribe => {}
                Some(frame) => {
                    assert_eq!(frame.command, Command::Disconnect);
                    break;
                }
                None => break,
            }
        }
    });

    let config = ClientConfig::new(format!("http://127.0.0.1:{port}/api"));
    let session = Session::new(config);
    session.store().set_token(Some("session-jwt".to_string()));

    let mut changes = session.board_store().subscribe();
    let mut toasts = session.notifications().subscribe();
    session.connect_socket();

    let change = timeout(WAIT, changes.recv()).await.unwrap().unwrap();
    assert_eq!(change, BoardChange::Boards);

    let boards = session.board_store().boards();
    assert_eq!(boards.len(), 1);
    assert_eq!(boards[0].title, "Ops");
    assert!(session.store().socket_connected());

    // BOARD_CREATED on the user feed raises a toast
    let toast = timeout(WAIT, toasts.recv()).await.unwrap().unwrap();
    assert!(toast.message.contains("Ops"));
    assert_eq!(session.notifications().toasts().len(), 1);

    session.logout().await;
    timeout(WAIT, server).await.unwrap().unwrap();
    assert!(!session.store().is_authenticated());
}
