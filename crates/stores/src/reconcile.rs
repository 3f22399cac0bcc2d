//! Merges server-pushed events into the local stores.
//!
//! Each event maps to an add/update/delete on the matching collection,
//! keyed by entity id. There is no conflict resolution or idempotence
//! check against duplicate delivery; events are applied as received.

use models::events::{BoardEvent, CommentEvent, Event, NotificationLevel, TaskEvent, Topic};

use crate::{board::BoardStore, notifications::NotificationStore};

/// Apply a parsed event from `topic` to the stores.
pub fn apply(
    topic: &Topic,
    event: &Event,
    boards: &BoardStore,
    notifications: &NotificationStore,
) {
    match event {
        Event::Board(event) => apply_board(topic, event, boards, notifications),
        Event::Task(event) => apply_task(topic, event, boards),
        Event::Comment(event) => apply_comment(event, boards),
    }
}

fn apply_board(
    topic: &Topic,
    event: &BoardEvent,
    store: &BoardStore,
    notifications: &NotificationStore,
) {
    // Only the user-scoped feed raises toasts; per-board topics update
    // state silently.
    let user_scoped = matches!(topic, Topic::UserBoards);

    match event {
        BoardEvent::Created { board, .. } => {
            tracing::debug!(board_id = board.id, "board created");
            store.add_board(board.clone());
            if user_scoped {
                notifications.push(
                    NotificationLevel::Success,
                    format!("You have been added to a new board: {}", board.title),
                );
            }
        }
        BoardEvent::Updated { board, .. }
        | BoardEvent::MemberAdded { board, .. }
        | BoardEvent::MemberRemoved { board, .. } => {
            tracing::debug!(board_id = board.id, "board updated");
            store.update_board(board.clone());
        }
        BoardEvent::Deleted {
            deleted_board_id, ..
        } => {
            tracing::debug!(board_id = deleted_board_id, "board deleted");
            store.delete_board(*deleted_board_id);
            if user_scoped {
                notifications.push(
                    NotificationLevel::Info,
                    "You have been removed from a board",
                );
            }
        }
    }
}

fn apply_task(topic: &Topic, event: &TaskEvent, store: &BoardStore) {
    match event {
        TaskEvent::Created { task, .. } => {
            tracing::debug!(task_id = task.id, board_id = task.board_id, "task created");
            store.add_task(task.clone());
        }
        TaskEvent::Updated { task, .. }
        | TaskEvent::Moved { task, .. }
        | TaskEvent::Assigned { task, .. } => {
            tracing::debug!(task_id = task.id, board_id = task.board_id, "task updated");
            store.update_task(task.clone());
        }
        TaskEvent::Deleted {
            deleted_task_id,
            board_id,
            ..
        } => {
            // Deletion events may omit the board id; fall back to the
            // topic's board before scanning.
            let hint = board_id.or(match topic {
                Topic::BoardTasks(id) | Topic::Board(id) => Some(*id),
                _ => None,
            });
            tracing::debug!(task_id = deleted_task_id, "task deleted");
            store.delete_task(*deleted_task_id, hint);
        }
    }
}

fn apply_comment(event: &CommentEvent, store: &BoardStore) {
    match event {
        CommentEvent::Created {
            comment, task_id, ..
        } => {
            let task_id = task_id.unwrap_or(comment.task_id);
            tracing::debug!(comment_id = comment.id, task_id, "comment created");
            store.add_comment(task_id, comment.clone());
        }
        CommentEvent::Updated {
            comment, task_id, ..
        } => {
            let task_id = task_id.unwrap_or(comment.task_id);
            tracing::debug!(comment_id = comment.id, task_id, "comment updated");
            store.update_comment(task_id, comment.clone());
        }
        CommentEvent::Deleted {
            comment, task_id, ..
        } => {
            let task_id = task_id.unwrap_or(comment.task_id);
            tracing::debug!(comment_id = comment.id, task_id, "comment deleted");
            store.delete_comment(task_id, comment.id);
        }
    }
}
