//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **RestTaskStore**: PostgREST 互換の tasks テーブル（本番用）
//! - **InMemoryTaskStore**: テスト・ローカル実行用のストア
//! - **SupabaseSessionResolver**: 認証サービスによるセッション解決（本番用）
//! - **FixedSessionResolver**: 固定の解決結果を返す（テスト用）

pub mod fixed_session;
pub mod inmem_store;
pub mod rest_store;
pub mod supabase_session;

// 主要な型を再エクスポート
pub use self::fixed_session::FixedSessionResolver;
pub use self::inmem_store::{InMemoryTaskStore, StoreCall};
pub use self::rest_store::RestTaskStore;
pub use self::supabase_session::{StoredSession, SupabaseSessionResolver};
