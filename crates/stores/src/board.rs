//! Store for boards, their tasks and their comments.
//!
//! Collections are held as `Arc<Vec<_>>` snapshots; mutations clone the
//! affected collection, apply the change and swap the `Arc` so observers
//! holding an old snapshot are never mutated under their feet.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use futures::StreamExt;
use models::{
    board::Board,
    comment::Comment,
    task::{BOARD_COLUMNS, Task},
};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// Which collection changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardChange {
    Boards,
    CurrentBoard,
    Tasks { board_id: i64 },
    Comments { task_id: i64 },
}

struct Inner {
    boards: Arc<Vec<Board>>,
    current_board_id: Option<i64>,
    /// Tasks keyed by board id.
    tasks: HashMap<i64, Arc<Vec<Task>>>,
    /// Comments keyed by task id.
    comments: HashMap<i64, Arc<Vec<Comment>>>,
}

pub struct BoardStore {
    inner: RwLock<Inner>,
    sender: broadcast::Sender<BoardChange>,
}

impl Default for BoardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardStore {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self {
            inner: RwLock::new(Inner {
                boards: Arc::new(Vec::new()),
                current_board_id: None,
                tasks: HashMap::new(),
                comments: HashMap::new(),
            }),
            sender,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardChange> {
        self.sender.subscribe()
    }

    /// Change notifications as a stream, for select!-style consumers.
    pub fn change_stream(&self) -> futures::stream::BoxStream<'static, BoardChange> {
        let rx = self.subscribe();
        BroadcastStream::new(rx)
            .filter_map(|res| async move { res.ok() })
            .boxed()
    }

    fn notify(&self, change: BoardChange) {
        // no live observers is fine
        let _ = self.sender.send(change);
    }

    // --- reads ---

    pub fn boards(&self) -> Arc<Vec<Board>> {
        self.inner.read().unwrap().boards.clone()
    }

    pub fn current_board_id(&self) -> Option<i64> {
        self.inner.read().unwrap().current_board_id
    }

    pub fn current_board(&self) -> Option<Board> {
        let inner = self.inner.read().unwrap();
        let id = inner.current_board_id?;
        inner.boards.iter().find(|b| b.id == id).cloned()
    }

    pub fn tasks_for_board(&self, board_id: i64) -> Arc<Vec<Task>> {
        self.inner
            .read()
            .unwrap()
            .tasks
            .get(&board_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Tasks of the current board.
    pub fn current_tasks(&self) -> Arc<Vec<Task>> {
        match self.current_board_id() {
            Some(id) => self.tasks_for_board(id),
            None => Arc::default(),
        }
    }

    /// Tasks of the current board grouped into the Kanban columns.
    pub fn tasks_by_status(&self) -> Vec<(&'static str, Vec<Task>)> {
        let tasks = self.current_tasks();
        BOARD_COLUMNS
            .iter()
            .map(|status| {
                let column = tasks
                    .iter()
                    .filter(|t| t.status == *status)
                    .cloned()
                    .collect();
                (*status, column)
            })
            .collect()
    }

    pub fn comments_for_task(&self, task_id: i64) -> Arc<Vec<Comment>> {
        self.inner
            .read()
            .unwrap()
            .comments
            .get(&task_id)
            .cloned()
            .unwrap_or_default()
    }

    // --- boards ---

    pub fn set_boards(&self, boards: Vec<Board>) {
        self.inner.write().unwrap().boards = Arc::new(boards);
        self.notify(BoardChange::Boards);
    }

    pub fn add_board(&self, board: Board) {
        {
            let mut inner = self.inner.write().unwrap();
            let mut boards = inner.boards.as_ref().clone();
            boards.push(board);
            inner.boards = Arc::new(boards);
        }
        self.notify(BoardChange::Boards);
    }

    /// Replace the board with the same id. Unknown ids are a no-op.
    pub fn update_board(&self, board: Board) {
        let changed = {
            let mut inner = self.inner.write().unwrap();
            match inner.boards.iter().position(|b| b.id == board.id) {
                Some(index) => {
                    let mut boards = inner.boards.as_ref().clone();
                    boards[index] = board;
                    inner.boards = Arc::new(boards);
                    true
                }
                None => false,
            }
        };
        if changed {
            self.notify(BoardChange::Boards);
        }
    }

    /// Remove a board and cascade-delete its tasks.
    ///
    /// If the removed board was current, the first remaining board (if
    /// any) becomes current.
    pub fn delete_board(&self, board_id: i64) {
        let current_changed = {
            let mut inner = self.inner.write().unwrap();
            let boards: Vec<Board> = inner
                .boards
                .iter()
                .filter(|b| b.id != board_id)
                .cloned()
                .collect();
            inner.boards = Arc::new(boards);
            inner.tasks.remove(&board_id);
            if inner.current_board_id == Some(board_id) {
                inner.current_board_id = inner.boards.first().map(|b| b.id);
                true
            } else {
                false
            }
        };
        self.notify(BoardChange::Boards);
        if current_changed {
            self.notify(BoardChange::CurrentBoard);
        }
    }

    pub fn set_current_board(&self, board_id: i64) {
        self.inner.write().unwrap().current_board_id = Some(board_id);
        self.notify(BoardChange::CurrentBoard);
    }

    // --- tasks ---

    pub fn set_tasks(&self, board_id: i64, tasks: Vec<Task>) {
        self.inner
            .write()
            .unwrap()
            .tasks
            .insert(board_id, Arc::new(tasks));
        self.notify(BoardChange::Tasks { board_id });
    }

    /// Append a task to its board's collection.
    ///
    /// No duplicate check is performed; replayed created events insert
    /// again.
    pub fn add_task(&self, task: Task) {
        let board_id = task.board_id;
        {
            let mut inner = self.inner.write().unwrap();
            let mut tasks = inner
                .tasks
                .get(&board_id)
                .map(|t| t.as_ref().clone())
                .unwrap_or_default();
            tasks.push(task);
            inner.tasks.insert(board_id, Arc::new(tasks));
        }
        self.notify(BoardChange::Tasks { board_id });
    }

    /// Replace the task with the same id on its board. Unknown ids are a
    /// no-op.
    pub fn update_task(&self, task: Task) {
        let board_id = task.board_id;
        let changed = {
            let mut inner = self.inner.write().unwrap();
            match inner.tasks.get(&board_id) {
                Some(existing) => match existing.iter().position(|t| t.id == task.id) {
                    Some(index) => {
                        let mut tasks = existing.as_ref().clone();
                        tasks[index] = task;
                        inner.tasks.insert(board_id, Arc::new(tasks));
                        true
                    }
                    None => false,
                },
                None => false,
            }
        };
        if changed {
            self.notify(BoardChange::Tasks { board_id });
        }
    }

    /// Remove a task and cascade-delete its comments.
    ///
    /// When `board_id` is unknown (deletion events may omit it), every
    /// board's collection is scanned.
    pub fn delete_task(&self, task_id: i64, board_id: Option<i64>) {
        let affected = {
            let mut inner = self.inner.write().unwrap();
            let board_id = board_id.or_else(|| {
                inner
                    .tasks
                    .iter()
                    .find(|(_, tasks)| tasks.iter().any(|t| t.id == task_id))
                    .map(|(id, _)| *id)
            });
            let affected = board_id.and_then(|board_id| {
                let existing = inner.tasks.get(&board_id)?;
                let tasks: Vec<Task> = existing
                    .iter()
                    .filter(|t| t.id != task_id)
                    .cloned()
                    .collect();
                inner.tasks.insert(board_id, Arc::new(tasks));
                Some(board_id)
            });
            inner.comments.remove(&task_id);
            affected
        };
        if let Some(board_id) = affected {
            self.notify(BoardChange::Tasks { board_id });
        }
    }

    /// Set a task's status in place (drag between columns).
    pub fn move_task(&self, board_id: i64, task_id: i64, status: &str) {
        let changed = {
            let mut inner = self.inner.write().unwrap();
            match inner.tasks.get(&board_id) {
                Some(existing) => match existing.iter().position(|t| t.id == task_id) {
                    Some(index) => {
                        let mut tasks = existing.as_ref().clone();
                        tasks[index].status = status.to_string();
                        inner.tasks.insert(board_id, Arc::new(tasks));
                        true
                    }
                    None => false,
                },
                None => false,
            }
        };
        if changed {
            self.notify(BoardChange::Tasks { board_id });
        }
    }

    // --- comments ---

    pub fn set_comments(&self, task_id: i64, comments: Vec<Comment>) {
        self.inner
            .write()
            .unwrap()
            .comments
            .insert(task_id, Arc::new(comments));
        self.notify(BoardChange::Comments { task_id });
    }

    pub fn add_comment(&self, task_id: i64, comment: Comment) {
        {
            let mut inner = self.inner.write().unwrap();
            let mut comments = inner
                .comments
                .get(&task_id)
                .map(|c| c.as_ref().clone())
                .unwrap_or_default();
            comments.push(comment);
            inner.comments.insert(task_id, Arc::new(comments));
        }
        self.notify(BoardChange::Comments { task_id });
    }

    pub fn update_comment(&self, task_id: i64, comment: Comment) {
        let changed = {
            let mut inner = self.inner.write().unwrap();
            match inner.comments.get(&task_id) {
                Some(existing) => match existing.iter().position(|c| c.id == comment.id) {
                    Some(index) => {
                        let mut comments = existing.as_ref().clone();
                        comments[index] = comment;
                        inner.comments.insert(task_id, Arc::new(comments));
                        true
                    }
                    None => false,
                },
                None => false,
            }
        };
        if changed {
            self.notify(BoardChange::Comments { task_id });
        }
    }

    pub fn delete_comment(&self, task_id: i64, comment_id: i64) {
        let changed = {
            let mut inner = self.inner.write().unwrap();
            match inner.comments.get(&task_id) {
                Some(existing) => {
                    let comments: Vec<Comment> = existing
                        .iter()
                        .filter(|c| c.id != comment_id)
                        .cloned()
                        .collect();
                    inner.comments.insert(task_id, Arc::new(comments));
                    true
                }
                None => false,
            }
        };
        if changed {
            self.notify(BoardChange::Comments { task_id });
        }
    }
}
