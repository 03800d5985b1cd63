//! Errors - リモート呼び出しの失敗分類
//!
//! ストア呼び出しとセッション解決の失敗を型で区別します。
//! 呼び出し側（TaskBoard / AccessGate）はこれを握りつぶしてログに出すだけですが、
//! ログ上で「ネットワーク断」「ストアの拒否」「該当なし」を区別できるようにしています。

use thiserror::Error;

/// StoreError はストア呼び出しの失敗理由
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached (DNS, connect, TLS, timeout...).
    #[error("store unreachable: {0}")]
    Network(String),

    /// The store answered with an error status (validation, permissions...).
    #[error("store rejected request (status {status}): {message}")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// No row matched a single-row request.
    #[error("no matching task")]
    NotFound,

    /// The store answered 2xx but the body was not what we expected.
    #[error("unexpected store response: {0}")]
    Decode(String),

    #[error("store misconfigured: {0}")]
    Config(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }

    pub fn is_network(&self) -> bool {
        matches!(self, StoreError::Network(_))
    }
}

/// SessionError はセッション解決の失敗理由
///
/// ゲートはこれを「ユーザーなし」と同じに扱う（ログレベルだけ変える）。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session cookie is malformed: {0}")]
    MalformedCookie(String),

    #[error("auth service unreachable: {0}")]
    Network(String),

    #[error("auth service rejected session (status {0})")]
    Rejected(u16),

    #[error("unexpected auth response: {0}")]
    Decode(String),
}
