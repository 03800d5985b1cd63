//! SessionResolver port - リクエスト cookie からの本人解決
//!
//! cookie の書き込みは副作用にせず、`Resolution` の一部として返します。
//! どのレスポンスに載せるかは呼び出し側（AccessGate）が決めます。

use async_trait::async_trait;

use crate::domain::{CookieMutation, RequestCookies, SessionError, User};

/// Outcome of identity resolution for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Authenticated(User),
    /// No session cookie at all.
    Anonymous,
    /// A session was presented but could not be turned into a user.
    Unresolved(SessionError),
}

impl Identity {
    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::Authenticated(user) => Some(user),
            Identity::Anonymous | Identity::Unresolved(_) => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }
}

/// Identity plus the cookie writes the resolver wants on the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub identity: Identity,
    pub cookies: Vec<CookieMutation>,
}

impl Resolution {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            cookies: Vec::new(),
        }
    }

    pub fn anonymous() -> Self {
        Self::new(Identity::Anonymous)
    }

    pub fn with_cookies(mut self, cookies: Vec<CookieMutation>) -> Self {
        self.cookies = cookies;
        self
    }
}

/// SessionResolver はリクエストの cookie から現在のユーザーを解決する
///
/// 失敗は `Identity::Unresolved` で表し、エラーとしては返さない。
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, cookies: &RequestCookies) -> Resolution;
}
