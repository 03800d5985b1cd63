use async_trait::async_trait;

use crate::domain::{CookieMutation, RequestCookies, User};
use crate::ports::{Identity, Resolution, SessionResolver};

/// Resolver that always answers with the same resolution.
///
/// Used in tests and for running the board without an auth service.
#[derive(Debug, Clone)]
pub struct FixedSessionResolver {
    resolution: Resolution,
}

impl FixedSessionResolver {
    pub fn new(resolution: Resolution) -> Self {
        Self { resolution }
    }

    pub fn authenticated(user: User) -> Self {
        Self::new(Resolution::new(Identity::Authenticated(user)))
    }

    pub fn anonymous() -> Self {
        Self::new(Resolution::anonymous())
    }

    pub fn with_cookies(mut self, cookies: Vec<CookieMutation>) -> Self {
        self.resolution.cookies = cookies;
        self
    }
}

#[async_trait]
impl SessionResolver for FixedSessionResolver {
    async fn resolve(&self, _cookies: &RequestCookies) -> Resolution {
        self.resolution.clone()
    }
}
