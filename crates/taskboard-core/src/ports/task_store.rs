//! TaskStore port - リモートストアが正本（source of truth）
//!
//! TaskStore は tasks テーブルへの 4 つの呼び出しだけを表します。
//! スキーマ・インデックス・永続化はすべてストア側の責務です。
//!
//! # 実装
//! - `RestTaskStore`: PostgREST 互換の REST API（本番用）
//! - `InMemoryTaskStore`: テスト・ローカル実行用

use async_trait::async_trait;

use crate::domain::{StoreError, Task, TaskDraft, TaskId};

/// TaskStore は Task の CRUD を提供する
///
/// # 設計原則
/// - 返り値はストアが返したレコードそのもの（id / created_at はストア採番）
/// - リトライはしない（失敗はそのまま呼び出し側へ）
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All tasks, ascending by `created_at`.
    async fn list(&self) -> Result<Vec<Task>, StoreError>;

    /// Insert one task and return the stored row.
    async fn insert(&self, draft: &TaskDraft) -> Result<Task, StoreError>;

    /// Replace title/description of `id` and return the stored row.
    ///
    /// Returns `StoreError::NotFound` when no row has that id.
    async fn update(&self, id: TaskId, draft: &TaskDraft) -> Result<Task, StoreError>;

    /// Delete `id`. Deleting a missing id is not an error.
    async fn delete(&self, id: TaskId) -> Result<(), StoreError>;
}
