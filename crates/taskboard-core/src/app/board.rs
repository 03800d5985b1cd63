//! TaskBoard - タスク一覧のビューモデル
//!
//! # 設計
//! - 状態は `Arc<Mutex<BoardState>>` に 1 つだけ持つ（書き手は 1 人）
//! - ストア呼び出しの間はロックを持たない（読み込み中表示が見える）
//! - 一覧を変更するのはストアが成功を返した後だけ（楽観的更新はしない）
//! - 失敗はログに出して `last_error` に残すだけで、呼び出し側には返さない
//!
//! 読み込みと作成が競合した場合は、後に返ってきた方が一覧を上書きする。

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::domain::{Task, TaskDraft, TaskField, TaskId};
use crate::error::BoardError;
use crate::observability::BoardStatus;
use crate::ports::TaskStore;

/// All view state owned by the board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardState {
    pub tasks: Vec<Task>,
    pub draft: TaskDraft,
    pub loading: bool,
    pub mounted: bool,
    pub editing: Option<Task>,
    pub edit_open: bool,
    pub last_error: Option<BoardError>,
}

/// What the list area should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListView<'a> {
    Loading,
    Empty,
    Tasks(&'a [Task]),
}

impl BoardState {
    pub fn list_view(&self) -> ListView<'_> {
        if self.loading {
            ListView::Loading
        } else if self.tasks.is_empty() {
            ListView::Empty
        } else {
            ListView::Tasks(&self.tasks)
        }
    }

    /// The task in the edit surface, only while the surface is open.
    pub fn edit_surface(&self) -> Option<&Task> {
        if self.edit_open {
            self.editing.as_ref()
        } else {
            None
        }
    }

    pub fn find(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn status(&self) -> BoardStatus {
        BoardStatus {
            tasks: self.tasks.len(),
            loading: self.loading,
            mounted: self.mounted,
            edit_open: self.edit_open,
            editing: self.editing.as_ref().map(|t| t.id),
            last_error: self.last_error.as_ref().map(ToString::to_string),
        }
    }

    fn record(&mut self, err: BoardError) {
        self.last_error = Some(err);
    }
}

#[derive(Clone)]
pub struct TaskBoard {
    store: Arc<dyn TaskStore>,
    state: Arc<Mutex<BoardState>>,
}

impl TaskBoard {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(BoardState::default())),
        }
    }

    /// Clone of the current view state.
    pub async fn snapshot(&self) -> BoardState {
        self.state.lock().await.clone()
    }

    pub async fn status(&self) -> BoardStatus {
        self.state.lock().await.status()
    }

    /// Load once, the first time the view is displayed.
    ///
    /// Returns whether this call did the load.
    pub async fn mount(&self) -> bool {
        let first = {
            let mut state = self.state.lock().await;
            !std::mem::replace(&mut state.mounted, true)
        };
        if first {
            self.load().await;
        }
        first
    }

    /// One page display: the first mounts, every later one reloads.
    pub async fn show(&self) {
        if !self.mount().await {
            self.load().await;
        }
    }

    /// Replace the local list with the store's, ordered by creation time.
    pub async fn load(&self) {
        self.state.lock().await.loading = true;

        let result = self.store.list().await;

        let mut state = self.state.lock().await;
        match result {
            Ok(tasks) => {
                info!(count = tasks.len(), "tasks loaded");
                state.tasks = tasks;
                state.last_error = None;
            }
            Err(err) => {
                error!(error = %err, "fetch error");
                state.record(err.into());
            }
        }
        state.loading = false;
    }

    /// Merge one keystroke into the creation buffer.
    pub async fn set_draft_field(&self, field: TaskField, value: impl Into<String>) {
        self.state.lock().await.draft.set(field, value);
    }

    /// Send the creation buffer as a new task.
    pub async fn create(&self) {
        let draft = {
            let mut state = self.state.lock().await;
            if let Some(field) = state.draft.missing_field() {
                warn!(%field, "create skipped, required field empty");
                state.record(BoardError::MissingField(field));
                return;
            }
            state.draft.clone()
        };

        let result = self.store.insert(&draft).await;

        let mut state = self.state.lock().await;
        match result {
            Ok(task) => {
                debug!(id = %task.id, "task created");
                state.tasks.push(task);
                state.draft.clear();
                state.last_error = None;
            }
            // buffer is kept so the user's input survives
            Err(err) => {
                error!(error = %err, "insert error");
                state.record(err.into());
            }
        }
    }

    /// Open the edit surface for `task`. No store call.
    pub async fn request_edit(&self, task: Task) {
        let mut state = self.state.lock().await;
        state.editing = Some(task);
        state.edit_open = true;
    }

    /// Merge one keystroke into the task being edited.
    pub async fn set_edit_field(&self, field: TaskField, value: impl Into<String>) {
        let mut state = self.state.lock().await;
        match state.editing.as_mut() {
            Some(task) => task.set(field, value),
            None => {
                warn!(%field, "edit keystroke without a task being edited");
                state.record(BoardError::NoTaskSelected);
            }
        }
    }

    /// Send the edited task; on success replace the matching list entry.
    pub async fn save_edit(&self) {
        let (id, draft) = {
            let mut state = self.state.lock().await;
            let Some(task) = state.editing.as_ref() else {
                warn!("save requested without a task being edited");
                state.record(BoardError::NoTaskSelected);
                return;
            };
            let draft = task.draft();
            let id = task.id;
            if let Some(field) = draft.missing_field() {
                warn!(%id, %field, "update skipped, required field empty");
                state.record(BoardError::MissingField(field));
                return;
            }
            (id, draft)
        };

        let result = self.store.update(id, &draft).await;

        let mut state = self.state.lock().await;
        match result {
            Ok(updated) => {
                debug!(id = %updated.id, "task updated");
                for task in state.tasks.iter_mut().filter(|t| t.id == updated.id) {
                    *task = updated.clone();
                }
                state.edit_open = false;
                state.editing = None;
                state.last_error = None;
            }
            // edit surface stays open
            Err(err) => {
                error!(%id, error = %err, "update error");
                state.record(err.into());
            }
        }
    }

    /// Close the edit surface, dropping unsaved edits.
    pub async fn cancel_edit(&self) {
        let mut state = self.state.lock().await;
        state.edit_open = false;
        state.editing = None;
    }

    /// Delete `id` in the store; on success drop it from the list.
    pub async fn delete(&self, id: TaskId) {
        let result = self.store.delete(id).await;

        let mut state = self.state.lock().await;
        match result {
            Ok(()) => {
                let before = state.tasks.len();
                state.tasks.retain(|t| t.id != id);
                debug!(%id, removed = before - state.tasks.len(), "task deleted");
                state.last_error = None;
            }
            Err(err) => {
                error!(%id, error = %err, "delete error");
                state.record(err.into());
            }
        }
    }
}
