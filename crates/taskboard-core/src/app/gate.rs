//! AccessGate - リクエスト単位の認証ゲート
//!
//! 保護されたパス（既定 `/admin`）にユーザー無しで来たリクエストをログイン
//! ページへ誘導する。セッション解決で生まれた cookie 変更は、リダイレクトでも
//! 通過でも必ずレスポンスに載せる。

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{CookieMutation, RequestCookies};
use crate::ports::{Identity, SessionResolver};

pub const PROTECTED_PREFIX: &str = "/admin";
pub const LOGIN_PATH: &str = "/login";

/// What to do with one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    PassThrough {
        cookies: Vec<CookieMutation>,
    },
    Redirect {
        location: String,
        cookies: Vec<CookieMutation>,
    },
}

impl GateDecision {
    pub fn cookies(&self) -> &[CookieMutation] {
        match self {
            GateDecision::PassThrough { cookies } | GateDecision::Redirect { cookies, .. } => {
                cookies
            }
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, GateDecision::Redirect { .. })
    }
}

#[derive(Clone)]
pub struct AccessGate {
    resolver: Arc<dyn SessionResolver>,
    protected_prefix: String,
    login_path: String,
}

impl AccessGate {
    pub fn new(resolver: Arc<dyn SessionResolver>) -> Self {
        Self::with_paths(resolver, PROTECTED_PREFIX, LOGIN_PATH)
    }

    pub fn with_paths(
        resolver: Arc<dyn SessionResolver>,
        protected_prefix: impl Into<String>,
        login_path: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            protected_prefix: protected_prefix.into(),
            login_path: login_path.into(),
        }
    }

    /// Plain string prefix: `/administrator` is protected too.
    pub fn is_protected(&self, path: &str) -> bool {
        path.starts_with(&self.protected_prefix)
    }

    pub async fn check(&self, path: &str, cookies: &RequestCookies) -> GateDecision {
        let resolution = self.resolver.resolve(cookies).await;
        let cookies = resolution.cookies;

        match &resolution.identity {
            Identity::Authenticated(user) => {
                debug!(path, user = %user.id, "gate: authenticated");
                return GateDecision::PassThrough { cookies };
            }
            Identity::Anonymous => debug!(path, "gate: no session"),
            Identity::Unresolved(err) => warn!(path, error = %err, "gate: session unresolved"),
        }

        if self.is_protected(path) {
            info!(path, location = %self.login_path, "gate: redirecting to login");
            GateDecision::Redirect {
                location: self.login_path.clone(),
                cookies,
            }
        } else {
            GateDecision::PassThrough { cookies }
        }
    }
}
