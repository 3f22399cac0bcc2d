//! Log in, open the first board and tail live store changes.
//!
//! ```sh
//! TASKBOARD_API_URL=http://localhost:8080/api \
//! TASKBOARD_USERNAME=demo TASKBOARD_PASSWORD=demo \
//!     cargo run --bin taskboard-tail
//! ```

use anyhow::Context;
use futures::StreamExt;
use models::{events::Topic, user::Credentials};
use client::{ClientConfig, Session};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let credentials = Credentials {
        username: std::env::var("TASKBOARD_USERNAME").context("TASKBOARD_USERNAME is not set")?,
        password: std::env::var("TASKBOARD_PASSWORD").context("TASKBOARD_PASSWORD is not set")?,
    };

    let session = Session::new(ClientConfig::from_env());
    let user = session
        .login(&credentials)
        .await
        .context("login failed")?;
    tracing::info!(user = %user.username, "logged in");

    let boards = session.boards().list().await.context("listing boards")?;
    let store = session.board_store().clone();
    store.set_boards(boards);
    if let Some(board) = store.boards().first() {
        store.set_current_board(board.id);
    }

    if let Some(board_id) = store.current_board_id() {
        let tasks = session
            .tasks()
            .list_for_board(board_id)
            .await
            .context("listing tasks")?;
        store.set_tasks(board_id, tasks);

        session.subscribe(Topic::Board(board_id)).await;
        session.subscribe(Topic::BoardTasks(board_id)).await;
        tracing::info!(board_id, "tailing board");
    } else {
        tracing::info!("no boards yet; tailing the user feed only");
    }

    let mut changes = store.change_stream();
    loop {
        tokio::select! {
            Some(change) = changes.next() => {
                tracing::info!(?change, boards = store.boards().len(), "store changed");
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                session.logout().await;
                return Ok(());
            }
        }
    }
}
