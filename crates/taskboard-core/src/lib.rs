//! taskboard-core
//!
//! Core building blocks for the task board.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, task, user, cookie, errors）
//! - **ports**: 抽象化レイヤー（TaskStore, SessionResolver, Clock）
//! - **app**: アプリケーションロジック（TaskBoard, BoardRegistry, AccessGate）
//! - **impls**: 実装（RestTaskStore, SupabaseSessionResolver, InMemoryTaskStore など）
//! - **config**: 環境変数からの設定読み込み
//! - **observability**: tracing の初期化と状態ビュー

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod observability;
pub mod ports;

pub use app::{AccessGate, BoardRegistry, GateDecision, TaskBoard};
pub use config::{Settings, StoreConfig};
pub use error::BoardError;
