//! BoardRegistry - 訪問者ごとのビュー状態
//!
//! TaskBoard の状態は 1 つのビュー（ブラウザのタブ）に属する。
//! 訪問者は cookie の `ViewId` で自分の TaskBoard を引き当てる。
//!
//! # 掃除
//! - `idle_timeout` を過ぎて使われていないビューは次のアクセス時に捨てる
//! - 上限 `max_views` に達したら、最後に使われたのが最も古いビューから捨てる

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::app::TaskBoard;
use crate::domain::ViewId;
use crate::ports::{Clock, TaskStore};

pub const DEFAULT_IDLE_TIMEOUT_SECS: i64 = 30 * 60;
pub const DEFAULT_MAX_VIEWS: usize = 1024;

struct ViewEntry {
    board: TaskBoard,
    last_seen: DateTime<Utc>,
}

/// The board handed out for one request.
#[derive(Clone)]
pub struct OpenedView {
    pub id: ViewId,
    pub board: TaskBoard,
    /// `true` when no live view matched and a new one was created.
    pub fresh: bool,
}

pub struct BoardRegistry {
    store: Arc<dyn TaskStore>,
    clock: Arc<dyn Clock>,
    views: Mutex<HashMap<ViewId, ViewEntry>>,
    idle_timeout: Duration,
    max_views: usize,
}

impl BoardRegistry {
    pub fn new(store: Arc<dyn TaskStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            views: Mutex::new(HashMap::new()),
            idle_timeout: Duration::seconds(DEFAULT_IDLE_TIMEOUT_SECS),
            max_views: DEFAULT_MAX_VIEWS,
        }
    }

    pub fn with_limits(mut self, idle_timeout: Duration, max_views: usize) -> Self {
        self.idle_timeout = idle_timeout;
        self.max_views = max_views.max(1);
        self
    }

    /// The live view for `requested`, or a new one.
    ///
    /// Unknown or expired ids never become views: a new id is issued instead.
    pub async fn open(&self, requested: Option<ViewId>) -> OpenedView {
        let now = self.clock.now();
        let mut views = self.views.lock().await;

        let cutoff = now - self.idle_timeout;
        let before = views.len();
        views.retain(|_, entry| entry.last_seen > cutoff);
        if views.len() < before {
            debug!(evicted = before - views.len(), "idle views dropped");
        }

        if let Some(id) = requested
            && let Some(entry) = views.get_mut(&id)
        {
            entry.last_seen = now;
            return OpenedView {
                id,
                board: entry.board.clone(),
                fresh: false,
            };
        }

        while views.len() >= self.max_views {
            let Some(oldest) = views
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| *id)
            else {
                break;
            };
            views.remove(&oldest);
            debug!(view = %oldest, "view evicted, registry full");
        }

        let id = ViewId::generate();
        let board = TaskBoard::new(self.store.clone());
        views.insert(
            id,
            ViewEntry {
                board: board.clone(),
                last_seen: now,
            },
        );
        debug!(view = %id, live = views.len(), "view opened");

        OpenedView {
            id,
            board,
            fresh: true,
        }
    }

    pub async fn len(&self) -> usize {
        self.views.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskField;
    use crate::impls::InMemoryTaskStore;
    use crate::ports::FixedClock;
    use chrono::TimeZone;

    fn registry() -> (BoardRegistry, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ));
        let store = InMemoryTaskStore::new(clock.clone());
        let registry = BoardRegistry::new(Arc::new(store), clock.clone())
            .with_limits(Duration::minutes(10), 2);
        (registry, clock)
    }

    #[tokio::test]
    async fn known_view_is_reused() {
        let (registry, _) = registry();
        assert!(registry.is_empty().await);

        let first = registry.open(None).await;
        first.board.set_draft_field(TaskField::Title, "mine").await;
        let again = registry.open(Some(first.id)).await;

        assert!(first.fresh);
        assert!(!again.fresh);
        assert_eq!(again.id, first.id);
        assert_eq!(again.board.snapshot().await.draft.title, "mine");
    }

    #[tokio::test]
    async fn views_do_not_share_state() {
        let (registry, _) = registry();
        let a = registry.open(None).await;
        let b = registry.open(None).await;

        a.board.set_draft_field(TaskField::Title, "secret A").await;

        assert_ne!(a.id, b.id);
        assert_eq!(b.board.snapshot().await.draft.title, "");
    }

    #[tokio::test]
    async fn unknown_id_gets_a_new_view() {
        let (registry, _) = registry();
        let stranger = ViewId::generate();

        let opened = registry.open(Some(stranger)).await;

        assert!(opened.fresh);
        assert_ne!(opened.id, stranger);
    }

    #[tokio::test]
    async fn idle_views_expire() {
        let (registry, clock) = registry();
        let view = registry.open(None).await;

        clock.set(clock.now() + Duration::minutes(11));
        let reopened = registry.open(Some(view.id)).await;

        assert!(reopened.fresh);
        assert_ne!(reopened.id, view.id);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn full_registry_drops_least_recently_seen() {
        let (registry, clock) = registry();
        let a = registry.open(None).await;
        clock.set(clock.now() + Duration::minutes(1));
        let b = registry.open(None).await;
        clock.set(clock.now() + Duration::minutes(1));
        registry.open(Some(a.id)).await;

        clock.set(clock.now() + Duration::minutes(1));
        registry.open(None).await;

        assert_eq!(registry.len().await, 2);
        assert!(!registry.open(Some(a.id)).await.fresh);
        assert!(registry.open(Some(b.id)).await.fresh);
    }
}
