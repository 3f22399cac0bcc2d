//! STOMP-over-WebSocket client for the real-time topics.
//!
//! The socket task owns the connection: it performs the CONNECT
//! handshake, re-issues SUBSCRIBE frames after a reconnect, and then
//! selects over inbound frames, application commands and the outbound
//! heartbeat. Events are emitted to the session layer over an mpsc
//! channel.

use std::{sync::Arc, time::Duration};

use futures::{SinkExt, StreamExt};
use models::events::Topic;
use tokio::{
    sync::{RwLock, mpsc},
    time::{self, MissedTickBehavior},
};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use crate::{
    config::ClientConfig,
    stomp::{Command, Frame},
    subscriptions::{MessageHandler, SubscriptionRegistry},
};

/// Delay between reconnection attempts. Fixed, no backoff.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Timeout for the TCP/TLS connect and the CONNECTED handshake.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Outbound heartbeat interval, matching the advertised heart-beat
/// header.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("server refused connection: {0}")]
    Refused(String),
    #[error("url error: {0}")]
    Url(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("send error: {0}")]
    Send(String),
    #[error("timed out waiting for CONNECTED")]
    Timeout,
}

/// Commands accepted by the socket task.
pub enum SocketCommand {
    Subscribe {
        topic: Topic,
        handler: Option<MessageHandler>,
    },
    Unsubscribe {
        key: String,
    },
    UnsubscribeAll,
    Send {
        destination: String,
        body: String,
    },
    Disconnect,
}

/// Events emitted by the socket task.
#[derive(Debug, Clone)]
pub enum SocketEvent {
    Connected,
    Disconnected { reason: String },
    Message { key: String, topic: Topic, body: String },
    Error { message: String },
}

/// How a connection ended.
enum LoopExit {
    /// `Disconnect` command; the run loop stops.
    Manual,
    /// Server closed the socket; the run loop reconnects.
    ServerClosed,
}

#[derive(Default)]
struct ConnectionState {
    connected: bool,
}

pub struct SocketClient {
    config: ClientConfig,
    token: String,
    registry: Arc<SubscriptionRegistry>,
    state: Arc<RwLock<ConnectionState>>,
    event_tx: mpsc::Sender<SocketEvent>,
}

impl SocketClient {
    /// Create a new socket client.
    ///
    /// Returns:
    /// - the client itself (pass to [`run`](Self::run) in a spawned task)
    /// - a receiver for socket events
    /// - a sender for commands
    /// - the command receiver to hand to `run()`
    pub fn new(
        config: ClientConfig,
        token: String,
    ) -> (
        Self,
        mpsc::Receiver<SocketEvent>,
        mpsc::Sender<SocketCommand>,
        mpsc::Receiver<SocketCommand>,
    ) {
        let (event_tx, event_rx) = mpsc::channel(64);
        let (command_tx, command_rx) = mpsc::channel(64);

        let client = Self {
            config,
            token,
            registry: Arc::new(SubscriptionRegistry::new()),
            state: Arc::new(RwLock::new(ConnectionState::default())),
            event_tx,
        };

        (client, event_rx, command_tx, command_rx)
    }

    /// Shared handle to the subscription registry.
    pub fn subscriptions(&self) -> Arc<SubscriptionRegistry> {
        self.registry.clone()
    }

    pub async fn is_connected(&self) -> bool {
        self.state.read().await.connected
    }

    /// Connection loop: connect, run until the connection drops, wait the
    /// fixed delay, repeat. A `Disconnect` command (or the command sender
    /// being dropped) ends the loop whether the socket is up or down.
    pub async fn run(self, mut command_rx: mpsc::Receiver<SocketCommand>) {
        loop {
            // commands that arrived while the socket was down
            loop {
                match command_rx.try_recv() {
                    Ok(command) => {
                        if self.apply_offline_command(Some(command)) {
                            tracing::info!("socket disconnected by client");
                            return;
                        }
                    }
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        tracing::info!("socket disconnected by client");
                        return;
                    }
                }
            }

            match self.connect_and_run(&mut command_rx).await {
                Ok(LoopExit::Manual) => {
                    tracing::info!("socket disconnected by client");
                    self.state.write().await.connected = false;
                    return;
                }
                Ok(LoopExit::ServerClosed) => {
                    tracing::info!("server closed the socket");
                    let _ = self
                        .event_tx
                        .send(SocketEvent::Disconnected {
                            reason: "server closed connection".to_string(),
                        })
                        .await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "socket connection error");
                    let _ = self
                        .event_tx
                        .send(SocketEvent::Error {
                            message: e.to_string(),
                        })
                        .await;
                    let _ = self
                        .event_tx
                        .send(SocketEvent::Disconnected {
                            reason: e.to_string(),
                        })
                        .await;
                }
            }

            self.state.write().await.connected = false;

            tracing::info!(
                delay_secs = RECONNECT_DELAY.as_secs(),
                "reconnecting to taskboard socket"
            );

            // keep listening for commands during the delay so a
            // disconnect issued while down stops the loop
            let delay = time::sleep(RECONNECT_DELAY);
            tokio::pin!(delay);
            loop {
                tokio::select! {
                    _ = &mut delay => break,
                    command = command_rx.recv() => {
                        if self.apply_offline_command(command) {
                            tracing::info!("socket disconnected by client");
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Handle a command while the connection is down. Subscriptions are
    /// recorded in the registry and issued on the next connect; sends
    /// are dropped. Returns true when the run loop should stop.
    fn apply_offline_command(&self, command: Option<SocketCommand>) -> bool {
        match command {
            Some(SocketCommand::Subscribe { topic, handler }) => {
                self.registry.insert(topic, handler);
                false
            }
            Some(SocketCommand::Unsubscribe { key }) => {
                self.registry.remove(&key);
                false
            }
            Some(SocketCommand::UnsubscribeAll) => {
                self.registry.clear();
                false
            }
            Some(SocketCommand::Send { destination, .. }) => {
                tracing::debug!(destination = %destination, "dropping send while disconnected");
                false
            }
            Some(SocketCommand::Disconnect) | None => {
                self.registry.clear();
                true
            }
        }
    }

    async fn connect_and_run(
        &self,
        command_rx: &mut mpsc::Receiver<SocketCommand>,
    ) -> Result<LoopExit, SocketError> {
        let ws_url = build_ws_url(&self.config)?;
        tracing::info!(url = %ws_url, "connecting to taskboard socket");

        let (ws_stream, _response) = time::timeout(CONNECT_TIMEOUT, connect_async(&ws_url))
            .await
            .map_err(|_| SocketError::Timeout)?
            .map_err(|e| SocketError::Connection(e.to_string()))?;

        let (mut ws_sender, mut ws_receiver) = ws_stream.split();

        // STOMP handshake: CONNECT with the bearer token, wait for
        // CONNECTED.
        let host = ws_url.host_str().unwrap_or("localhost").to_string();
        let connect = Frame::connect(&host, &self.token);
        ws_sender
            .send(Message::Text(connect.serialize().into()))
            .await
            .map_err(|e| SocketError::Send(e.to_string()))?;

        let reply = time::timeout(CONNECT_TIMEOUT, next_frame(&mut ws_receiver))
            .await
            .map_err(|_| SocketError::Timeout)??;

        match reply.command {
            Command::Connected => {}
            Command::Error => {
                let message = reply
                    .header("message")
                    .map(str::to_string)
                    .unwrap_or_else(|| reply.body.clone());
                return Err(SocketError::Refused(message));
            }
            other => {
                return Err(SocketError::Protocol(format!(
                    "expected CONNECTED, got {other}"
                )));
            }
        }

        self.state.write().await.connected = true;
        let _ = self.event_tx.send(SocketEvent::Connected).await;
        tracing::info!("taskboard socket connected");

        // Surviving registry entries are re-subscribed after a reconnect.
        for (id, destination) in self.registry.resubscribe_targets() {
            tracing::debug!(subscription = %id, destination = %destination, "resubscribing");
            let frame = Frame::subscribe(&id, &destination);
            ws_sender
                .send(Message::Text(frame.serialize().into()))
                .await
                .map_err(|e| SocketError::Send(e.to_string()))?;
        }

        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                maybe_message = ws_receiver.next() => {
                    match maybe_message {
                        Some(Ok(Message::Text(text))) => {
                            if let Err(e) = self.handle_frame(&text).await {
                                tracing::warn!(error = %e, "failed to handle server frame");
                                let _ = self.event_tx.send(SocketEvent::Error {
                                    message: e.to_string(),
                                }).await;
                            }
                        }
                        Some(Ok(Message::Close(_))) => {
                            tracing::debug!("server sent close frame");
                            return Ok(LoopExit::ServerClosed);
                        }
                        Some(Ok(Message::Ping(data))) => {
                            ws_sender.send(Message::Pong(data)).await
                                .map_err(|e| SocketError::Send(e.to_string()))?;
                        }
                        Some(Ok(_)) => {
                            // binary and pong frames are ignored
                        }
                        Some(Err(e)) => {
                            return Err(SocketError::Connection(e.to_string()));
                        }
                        None => {
                            return Err(SocketError::Connection("connection closed".to_string()));
                        }
                    }
                }

                command = command_rx.recv() => {
                    match command {
                        Some(SocketCommand::Subscribe { topic, handler }) => {
                            let (key, id) = self.registry.insert(topic, handler);
                            tracing::debug!(key = %key, subscription = %id, "subscribing");
                            let frame = Frame::subscribe(&id, &topic.destination());
                            ws_sender.send(Message::Text(frame.serialize().into())).await
                                .map_err(|e| SocketError::Send(e.to_string()))?;
                        }
                        Some(SocketCommand::Unsubscribe { key }) => {
                            if let Some(id) = self.registry.remove(&key) {
                                tracing::debug!(key = %key, subscription = %id, "unsubscribing");
                                let frame = Frame::unsubscribe(&id);
                                ws_sender.send(Message::Text(frame.serialize().into())).await
                                    .map_err(|e| SocketError::Send(e.to_string()))?;
                            }
                        }
                        Some(SocketCommand::UnsubscribeAll) => {
                            for id in self.registry.clear() {
                                let frame = Frame::unsubscribe(&id);
                                ws_sender.send(Message::Text(frame.serialize().into())).await
                                    .map_err(|e| SocketError::Send(e.to_string()))?;
                            }
                        }
                        Some(SocketCommand::Send { destination, body }) => {
                            let frame = Frame::send(&destination, body);
                            ws_sender.send(Message::Text(frame.serialize().into())).await
                                .map_err(|e| SocketError::Send(e.to_string()))?;
                        }
                        Some(SocketCommand::Disconnect) | None => {
                            // release handles, then a polite DISCONNECT
                            self.registry.clear();
                            let _ = ws_sender
                                .send(Message::Text(Frame::disconnect().serialize().into()))
                                .await;
                            let _ = ws_sender.send(Message::Close(None)).await;
                            return Ok(LoopExit::Manual);
                        }
                    }
                }

                _ = heartbeat.tick() => {
                    // EOL heartbeat per the negotiated heart-beat header
                    ws_sender.send(Message::Text("\n".into())).await
                        .map_err(|e| SocketError::Send(e.to_string()))?;
                }
            }
        }
    }

    async fn handle_frame(&self, text: &str) -> Result<(), SocketError> {
        let Some(frame) = Frame::parse(text).map_err(|e| SocketError::Protocol(e.to_string()))?
        else {
            return Ok(()); // heartbeat
        };

        match frame.command {
            Command::Message => {
                let Some(subscription_id) = frame.header("subscription") else {
                    return Err(SocketError::Protocol(
                        "MESSAGE frame without subscription header".to_string(),
                    ));
                };
                match self.registry.dispatch(subscription_id, &frame.body) {
                    Some((key, topic)) => {
                        let _ = self
                            .event_tx
                            .send(SocketEvent::Message {
                                key,
                                topic,
                                body: frame.body.clone(),
                            })
                            .await;
                    }
                    None => {
                        tracing::debug!(
                            subscription = %subscription_id,
                            "message for unknown subscription"
                        );
                    }
                }
            }
            Command::Error => {
                let message = frame
                    .header("message")
                    .map(str::to_string)
                    .unwrap_or_else(|| frame.body.clone());
                tracing::warn!(message = %message, "server error frame");
                let _ = self
                    .event_tx
                    .send(SocketEvent::Error {
                        message: format!("WebSocket error: {message}"),
                    })
                    .await;
            }
            Command::Receipt => {
                tracing::trace!(receipt = ?frame.header("receipt-id"), "receipt frame");
            }
            other => {
                tracing::debug!(command = %other, "ignoring unexpected frame");
            }
        }

        Ok(())
    }
}

/// Wait for the next real frame, skipping heartbeats.
async fn next_frame<S>(ws_receiver: &mut S) -> Result<Frame, SocketError>
where
    S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        match ws_receiver.next().await {
            Some(Ok(Message::Text(text))) => {
                match Frame::parse(&text).map_err(|e| SocketError::Protocol(e.to_string()))? {
                    Some(frame) => return Ok(frame),
                    None => continue,
                }
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(SocketError::Connection(e.to_string())),
            None => return Err(SocketError::Connection("connection closed".to_string())),
        }
    }
}

/// Derive the WebSocket URL: an explicit override wins, otherwise the
/// API base URL with the scheme switched to ws(s) and the path `/ws`.
pub(crate) fn build_ws_url(config: &ClientConfig) -> Result<Url, SocketError> {
    if let Some(ws) = &config.ws_url {
        return Url::parse(ws).map_err(|e| SocketError::Url(e.to_string()));
    }

    let mut url =
        Url::parse(&config.api_base_url).map_err(|e| SocketError::Url(e.to_string()))?;
    match url.scheme() {
        "http" => url
            .set_scheme("ws")
            .map_err(|()| SocketError::Url("failed to set scheme".to_string()))?,
        "https" => url
            .set_scheme("wss")
            .map_err(|()| SocketError::Url("failed to set scheme".to_string()))?,
        "ws" | "wss" => {}
        other => {
            return Err(SocketError::Url(format!("unsupported scheme: {other}")));
        }
    }
    url.set_path("/ws");
    Ok(url)
}
