//! Session lifecycle: login, logout, and the socket event pump.
//!
//! `login` stores the token, fetches the current user, connects the
//! socket and subscribes to the user-scoped board feed. Any 401 forces a
//! logout: token and user are cleared, every subscription is released and
//! the socket is disconnected.

use std::sync::{Arc, Mutex};

use models::{
    board::{AddMember, Board, CreateBoard, UpdateBoard},
    comment::{Comment, CreateComment},
    events::{Event, Topic},
    task::{CreateTask, Task, UpdateTask},
    user::{CreateUser, Credentials, User},
};
use stores::{BoardStore, NotificationStore, SessionStore, reconcile};
use tokio::sync::mpsc;

use crate::{
    auth::AuthService,
    boards::BoardService,
    comments::CommentService,
    config::ClientConfig,
    error::ApiError,
    http::ApiClient,
    socket::{SocketClient, SocketCommand, SocketEvent},
    subscriptions::MessageHandler,
    tasks::TaskService,
    users::UserService,
};

pub struct Session {
    config: ClientConfig,
    api: ApiClient,
    auth: AuthService,
    session_store: Arc<SessionStore>,
    board_store: Arc<BoardStore>,
    notifications: Arc<NotificationStore>,
    command_tx: Mutex<Option<mpsc::Sender<SocketCommand>>>,
}

impl Session {
    pub fn new(config: ClientConfig) -> Self {
        let api = ApiClient::new(&config);
        Self {
            auth: AuthService::new(api.clone()),
            api,
            config,
            session_store: Arc::new(SessionStore::new()),
            board_store: Arc::new(BoardStore::new()),
            notifications: Arc::new(NotificationStore::new()),
            command_tx: Mutex::new(None),
        }
    }

    // --- accessors ---

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Board endpoints with the session's 401 reaction applied. A 401
    /// on any call forces a logout before the error is returned.
    pub fn boards(&self) -> SessionBoards<'_> {
        SessionBoards {
            session: self,
            service: BoardService::new(self.api.clone()),
        }
    }

    pub fn tasks(&self) -> SessionTasks<'_> {
        SessionTasks {
            session: self,
            service: TaskService::new(self.api.clone()),
        }
    }

    pub fn comments(&self) -> SessionComments<'_> {
        SessionComments {
            session: self,
            service: CommentService::new(self.api.clone()),
        }
    }

    pub fn users(&self) -> SessionUsers<'_> {
        SessionUsers {
            session: self,
            service: UserService::new(self.api.clone()),
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.session_store
    }

    pub fn board_store(&self) -> &Arc<BoardStore> {
        &self.board_store
    }

    pub fn notifications(&self) -> &Arc<NotificationStore> {
        &self.notifications
    }

    // --- auth lifecycle ---

    /// Log in, fetch the current user and bring up the socket.
    ///
    /// Socket failures do not fail the login; they surface on the
    /// session store's error slot.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, ApiError> {
        let response = self.auth.login(credentials).await?;
        self.api.set_token(Some(response.token.clone()));
        self.session_store.set_token(Some(response.token));

        let user = self.fetch_current_user().await?;
        self.connect_socket();
        Ok(user)
    }

    /// Register a new account. When the backend returns a token the
    /// session is logged in immediately.
    pub async fn register(&self, request: &CreateUser) -> Result<Option<User>, ApiError> {
        let response = self.auth.register(request).await?;
        if response.token.is_empty() {
            return Ok(None);
        }

        self.api.set_token(Some(response.token.clone()));
        self.session_store.set_token(Some(response.token));

        let user = self.fetch_current_user().await?;
        self.connect_socket();
        Ok(Some(user))
    }

    /// `GET /auth/me`, storing the user on success. A 401 forces a
    /// logout.
    pub async fn fetch_current_user(&self) -> Result<User, ApiError> {
        match self.auth.me().await {
            Ok(user) => {
                self.session_store.set_user(Some(user.clone()));
                Ok(user)
            }
            Err(e) => {
                if e.is_unauthorized() {
                    self.logout().await;
                }
                Err(e)
            }
        }
    }

    /// Clear the session: token, user, subscriptions, socket.
    pub async fn logout(&self) {
        tracing::info!("logging out");
        self.api.set_token(None);
        self.session_store.clear();

        let command_tx = self.command_tx.lock().unwrap().take();
        if let Some(tx) = command_tx {
            let _ = tx.send(SocketCommand::UnsubscribeAll).await;
            let _ = tx.send(SocketCommand::Disconnect).await;
        }
    }

    /// Force-logout reaction for arbitrary REST results: a 401 clears
    /// the session, every other outcome passes through.
    pub async fn check_auth<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if let Err(e) = &result {
            if e.is_unauthorized() {
                self.logout().await;
            }
        }
        result
    }

    // --- subscriptions ---

    /// Subscribe to a topic. Returns the registry key; like the rest of
    /// the subscription API this is a no-op while the socket is down
    /// (the user-boards feed is re-established on every connect).
    pub async fn subscribe(&self, topic: Topic) -> String {
        self.subscribe_with(topic, None).await
    }

    /// Subscribe with a custom raw-message handler in addition to store
    /// reconciliation.
    pub async fn subscribe_with(&self, topic: Topic, handler: Option<MessageHandler>) -> String {
        let key = topic.key();
        if let Some(tx) = self.command_sender() {
            let _ = tx.send(SocketCommand::Subscribe { topic, handler }).await;
        }
        key
    }

    pub async fn unsubscribe(&self, key: &str) {
        if let Some(tx) = self.command_sender() {
            let _ = tx
                .send(SocketCommand::Unsubscribe {
                    key: key.to_string(),
                })
                .await;
        }
    }

    pub async fn unsubscribe_all(&self) {
        if let Some(tx) = self.command_sender() {
            let _ = tx.send(SocketCommand::UnsubscribeAll).await;
        }
    }

    /// Publish a message to a destination.
    pub async fn publish(&self, destination: &str, body: String) {
        if let Some(tx) = self.command_sender() {
            let _ = tx
                .send(SocketCommand::Send {
                    destination: destination.to_string(),
                    body,
                })
                .await;
        }
    }

    // --- socket plumbing ---

    fn command_sender(&self) -> Option<mpsc::Sender<SocketCommand>> {
        self.command_tx.lock().unwrap().clone()
    }

    /// Spawn the socket task and the event pump for the current token.
    ///
    /// `login` and `register` call this automatically; it is public for
    /// callers that obtained a token out of band. A no-op without a
    /// token.
    pub fn connect_socket(&self) {
        let Some(token) = self.session_store.token() else {
            return;
        };
        self.session_store.set_socket_connecting(true);

        let (socket, event_rx, command_tx, command_rx) =
            SocketClient::new(self.config.clone(), token);
        *self.command_tx.lock().unwrap() = Some(command_tx.clone());

        tokio::spawn(socket.run(command_rx));
        Self::spawn_event_pump(
            event_rx,
            command_tx,
            self.session_store.clone(),
            self.board_store.clone(),
            self.notifications.clone(),
        );
    }

    /// Pump socket events into the stores until the socket task ends.
    fn spawn_event_pump(
        mut event_rx: mpsc::Receiver<SocketEvent>,
        command_tx: mpsc::Sender<SocketCommand>,
        session_store: Arc<SessionStore>,
        board_store: Arc<BoardStore>,
        notifications: Arc<NotificationStore>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                match event {
                    SocketEvent::Connected => {
                        session_store.set_socket_connected(true);
                        // user-scoped board feed, re-issued after every
                        // (re)connect
                        let _ = command_tx
                            .send(SocketCommand::Subscribe {
                                topic: Topic::UserBoards,
                                handler: None,
                            })
                            .await;
                    }
                    SocketEvent::Disconnected { reason } => {
                        tracing::debug!(reason = %reason, "socket disconnected");
                        session_store.set_socket_connected(false);
                    }
                    SocketEvent::Error { message } => {
                        session_store.set_socket_error(Some(message));
                    }
                    SocketEvent::Message { key, topic, body } => {
                        match Event::parse(&topic, &body) {
                            Ok(event) => {
                                reconcile::apply(&topic, &event, &board_store, &notifications);
                            }
                            Err(e) => {
                                tracing::warn!(
                                    key = %key,
                                    error = %e,
                                    "failed to parse topic message"
                                );
                            }
                        }
                    }
                }
            }
        })
    }
}

/// Board endpoints routed through [`Session::check_auth`].
pub struct SessionBoards<'a> {
    session: &'a Session,
    service: BoardService,
}

impl SessionBoards<'_> {
    pub async fn list(&self) -> Result<Vec<Board>, ApiError> {
        self.session.check_auth(self.service.list().await).await
    }

    pub async fn create(&self, request: &CreateBoard) -> Result<Board, ApiError> {
        self.session
            .check_auth(self.service.create(request).await)
            .await
    }

    pub async fn update(&self, board_id: i64, request: &UpdateBoard) -> Result<Board, ApiError> {
        self.session
            .check_auth(self.service.update(board_id, request).await)
            .await
    }

    pub async fn delete(&self, board_id: i64) -> Result<(), ApiError> {
        self.session
            .check_auth(self.service.delete(board_id).await)
            .await
    }

    pub async fn add_member(&self, board_id: i64, request: &AddMember) -> Result<Board, ApiError> {
        self.session
            .check_auth(self.service.add_member(board_id, request).await)
            .await
    }

    pub async fn remove_member(&self, board_id: i64, member_id: i64) -> Result<Board, ApiError> {
        self.session
            .check_auth(self.service.remove_member(board_id, member_id).await)
            .await
    }
}

/// Task endpoints routed through [`Session::check_auth`].
pub struct SessionTasks<'a> {
    session: &'a Session,
    service: TaskService,
}

impl SessionTasks<'_> {
    pub async fn list_for_board(&self, board_id: i64) -> Result<Vec<Task>, ApiError> {
        self.session
            .check_auth(self.service.list_for_board(board_id).await)
            .await
    }

    pub async fn create(&self, board_id: i64, request: &CreateTask) -> Result<Task, ApiError> {
        self.session
            .check_auth(self.service.create(board_id, request).await)
            .await
    }

    pub async fn update(
        &self,
        board_id: i64,
        task_id: i64,
        request: &UpdateTask,
    ) -> Result<Task, ApiError> {
        self.session
            .check_auth(self.service.update(board_id, task_id, request).await)
            .await
    }

    pub async fn delete(&self, board_id: i64, task_id: i64) -> Result<(), ApiError> {
        self.session
            .check_auth(self.service.delete(board_id, task_id).await)
            .await
    }
}

/// Comment endpoints routed through [`Session::check_auth`].
pub struct SessionComments<'a> {
    session: &'a Session,
    service: CommentService,
}

impl SessionComments<'_> {
    pub async fn list_for_task(&self, task_id: i64) -> Result<Vec<Comment>, ApiError> {
        self.session
            .check_auth(self.service.list_for_task(task_id).await)
            .await
    }

    pub async fn create(&self, task_id: i64, request: &CreateComment) -> Result<Comment, ApiError> {
        self.session
            .check_auth(self.service.create(task_id, request).await)
            .await
    }
}

/// User directory endpoints routed through [`Session::check_auth`].
pub struct SessionUsers<'a> {
    session: &'a Session,
    service: UserService,
}

impl SessionUsers<'_> {
    pub async fn list(&self) -> Result<Vec<User>, ApiError> {
        self.session.check_auth(self.service.list().await).await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<User>, ApiError> {
        self.session
            .check_auth(self.service.search(query).await)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn logout_clears_token_and_user() {
        let session = Session::new(ClientConfig::default());
        session.api().set_token(Some("jwt".to_string()));
        session.store().set_token(Some("jwt".to_string()));

        session.logout().await;

        assert_eq!(session.api().token(), None);
        assert!(!session.store().is_authenticated());
        assert!(session.store().user().is_none());
    }

    #[tokio::test]
    async fn subscribe_returns_key_while_offline() {
        let session = Session::new(ClientConfig::default());
        let key = session.subscribe(Topic::Board(5)).await;
        assert_eq!(key, "board-5");
    }

    #[tokio::test]
    async fn unauthorized_result_forces_logout() {
        let session = Session::new(ClientConfig::default());
        session.store().set_token(Some("jwt".to_string()));

        let result: Result<(), ApiError> = session.check_auth(Err(ApiError::Unauthorized)).await;

        assert!(result.is_err());
        assert!(!session.store().is_authenticated());
    }

    #[tokio::test]
    async fn non_auth_errors_pass_through() {
        let session = Session::new(ClientConfig::default());
        session.store().set_token(Some("jwt".to_string()));

        let result: Result<(), ApiError> = session
            .check_auth(Err(ApiError::Transport("reset".to_string())))
            .await;

        assert!(result.is_err());
        assert!(session.store().is_authenticated());
    }
}
