//! InMemoryTaskStore - テスト・ローカル実行用のストア
//!
//! # 実装詳細
//! - BTreeMap<TaskId, Task> で行を保持（採番は 1 からの連番）
//! - created_at は注入した Clock から取る
//! - `fail_next` で次の呼び出しを 1 回だけ失敗させられる
//! - 呼び出し履歴（`calls`）を残すので「ストアを呼んだか」を検証できる

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{StoreError, Task, TaskDraft, TaskId};
use crate::ports::{Clock, TaskStore};

/// One call made against the store, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    List,
    Insert(TaskDraft),
    Update(TaskId, TaskDraft),
    Delete(TaskId),
}

struct InMemoryState {
    rows: BTreeMap<TaskId, Task>,
    next_id: i64,
    failures: VecDeque<StoreError>,
    calls: Vec<StoreCall>,
}

impl InMemoryState {
    fn allocate_id(&mut self) -> TaskId {
        let id = TaskId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Record the call and pop an injected failure, if any.
    fn begin(&mut self, call: StoreCall) -> Result<(), StoreError> {
        self.calls.push(call);
        match self.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[derive(Clone)]
pub struct InMemoryTaskStore {
    state: Arc<Mutex<InMemoryState>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryTaskStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryState {
                rows: BTreeMap::new(),
                next_id: 1,
                failures: VecDeque::new(),
                calls: Vec::new(),
            })),
            clock,
        }
    }

    /// Insert a row directly, bypassing the call journal.
    pub async fn seed(&self, draft: TaskDraft) -> Task {
        let mut state = self.state.lock().await;
        let task = Task {
            id: state.allocate_id(),
            title: draft.title,
            description: draft.description,
            created_at: self.clock.now(),
        };
        state.rows.insert(task.id, task.clone());
        task
    }

    /// Make the next store call fail with `err`.
    pub async fn fail_next(&self, err: StoreError) {
        self.state.lock().await.failures.push_back(err);
    }

    pub async fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        let mut state = self.state.lock().await;
        state.begin(StoreCall::List)?;

        let mut tasks: Vec<Task> = state.rows.values().cloned().collect();
        // created_at が同じ場合は id 順（採番順）
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(tasks)
    }

    async fn insert(&self, draft: &TaskDraft) -> Result<Task, StoreError> {
        let mut state = self.state.lock().await;
        state.begin(StoreCall::Insert(draft.clone()))?;

        let task = Task {
            id: state.allocate_id(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            created_at: self.clock.now(),
        };
        state.rows.insert(task.id, task.clone());
        Ok(task)
    }

    async fn update(&self, id: TaskId, draft: &TaskDraft) -> Result<Task, StoreError> {
        let mut state = self.state.lock().await;
        state.begin(StoreCall::Update(id, draft.clone()))?;

        let Some(row) = state.rows.get_mut(&id) else {
            return Err(StoreError::NotFound);
        };
        row.title = draft.title.clone();
        row.description = draft.description.clone();
        Ok(row.clone())
    }

    async fn delete(&self, id: TaskId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.begin(StoreCall::Delete(id))?;

        state.rows.remove(&id);
        Ok(())
    }
}
