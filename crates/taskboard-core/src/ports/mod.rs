//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（リモートストア、認証サービス、時計）への
//! インターフェースを提供し、テストでは差し替えられるようにします。
//!
//! # 設計原則
//! - リモートストアが正本（ローカルの一覧はキャッシュに過ぎない）
//! - 接続先と鍵は明示的に渡す（環境変数を直接読まない）

pub mod clock;
pub mod session;
pub mod task_store;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::session::{Identity, Resolution, SessionResolver};
pub use self::task_store::TaskStore;
