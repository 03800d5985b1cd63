//! App - アプリケーション層
//!
//! ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **TaskBoard**: タスク一覧のビューモデル（load / create / edit / delete）
//! - **BoardRegistry**: 訪問者（ビュー）ごとに TaskBoard を割り当てる
//! - **AccessGate**: 保護パスへの未認証リクエストをログインへ誘導

pub mod board;
pub mod gate;
pub mod views;

// 主要な型を再エクスポート
pub use self::board::{BoardState, ListView, TaskBoard};
pub use self::gate::{AccessGate, GateDecision, LOGIN_PATH, PROTECTED_PREFIX};
pub use self::views::{BoardRegistry, OpenedView};
