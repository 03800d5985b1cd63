//! SupabaseSessionResolver - 認証サービス（GoTrue 互換）によるセッション解決
//!
//! # cookie 形式
//! - 名前: `sb-{project_ref}-auth-token`（大きい場合は `.0`, `.1`, ... に分割）
//! - 値: `base64-` + base64url(JSON) または生の JSON
//! - JSON: access_token / refresh_token / expires_at（unix 秒）ほか
//!
//! # 流れ
//! 1. cookie が無ければ Anonymous（ネットワークには出ない）
//! 2. 期限切れ間近なら refresh_token で更新し、新しい cookie を staged に積む
//!    （更新に失敗したら既存の cookie を消す指示を積む）
//! 3. `/auth/v1/user` で access_token を検証してユーザーを得る

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, general_purpose};
use chrono::{DateTime, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::domain::{
    CookieMutation, CookieOptions, RequestCookies, SameSite, SessionError, User,
};
use crate::ports::{Clock, Identity, Resolution, SessionResolver};

pub const BASE64_PREFIX: &str = "base64-";
pub const MAX_CHUNK_SIZE: usize = 3180;
/// 400 days, the browser cap for cookie lifetime.
pub const COOKIE_MAX_AGE_SECS: i64 = 400 * 24 * 60 * 60;
const EXPIRY_MARGIN_SECS: i64 = 10;

const ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    general_purpose::NO_PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Session as stored in the auth cookie.
///
/// Unknown fields are carried through so a refreshed cookie keeps them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl StoredSession {
    fn is_expiring(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at - EXPIRY_MARGIN_SECS <= now.timestamp())
    }

    /// Token responses may carry only `expires_in`.
    fn fill_expiry(&mut self, now: DateTime<Utc>) {
        if self.expires_at.is_none()
            && let Some(expires_in) = self.extra.get("expires_in").and_then(|v| v.as_i64())
        {
            self.expires_at = Some(now.timestamp() + expires_in);
        }
    }
}

pub fn decode_session(raw: &str) -> Result<StoredSession, SessionError> {
    let json = match raw.strip_prefix(BASE64_PREFIX) {
        Some(encoded) => {
            let bytes = ENGINE
                .decode(encoded)
                .map_err(|e| SessionError::MalformedCookie(format!("base64: {e}")))?;
            String::from_utf8(bytes)
                .map_err(|e| SessionError::MalformedCookie(format!("utf-8: {e}")))?
        }
        None => raw.to_string(),
    };
    serde_json::from_str(&json).map_err(|e| SessionError::MalformedCookie(format!("json: {e}")))
}

pub fn encode_session(session: &StoredSession) -> Result<String, SessionError> {
    let json = serde_json::to_string(session).map_err(|e| SessionError::Decode(e.to_string()))?;
    Ok(format!("{BASE64_PREFIX}{}", ENGINE.encode(json)))
}

fn chunk_name(base: &str, index: usize) -> String {
    format!("{base}.{index}")
}

fn chunk_index(cookie_name: &str, base: &str) -> Option<usize> {
    cookie_name
        .strip_prefix(base)?
        .strip_prefix('.')?
        .parse()
        .ok()
}

fn split_chunks(value: &str, max: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for ch in value.chars() {
        if current.len() + ch.len_utf8() > max {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}

pub struct SupabaseSessionResolver {
    client: Client,
    config: StoreConfig,
    clock: Arc<dyn Clock>,
    cookie_name: String,
}

impl SupabaseSessionResolver {
    pub fn new(config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        let cookie_name = format!("sb-{}-auth-token", config.project_ref());
        Self {
            client: Client::new(),
            config,
            clock,
            cookie_name,
        }
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    fn cookie_options() -> CookieOptions {
        CookieOptions::default()
            .with_path("/")
            .with_same_site(SameSite::Lax)
            .with_max_age(COOKIE_MAX_AGE_SECS)
    }

    /// Whole cookie value, joining chunks when the plain cookie is absent.
    fn read_raw(&self, cookies: &RequestCookies) -> Option<String> {
        if let Some(value) = cookies.get(&self.cookie_name) {
            return Some(value.to_string());
        }
        let combined: String = (0..)
            .map_while(|i| cookies.get(&chunk_name(&self.cookie_name, i)))
            .collect();
        (!combined.is_empty()).then_some(combined)
    }

    fn present_chunks(&self, cookies: &RequestCookies) -> Vec<usize> {
        cookies
            .names()
            .filter_map(|name| chunk_index(name, &self.cookie_name))
            .collect()
    }

    /// Cookie writes that store `session`, removing stale chunks.
    pub fn session_cookies(
        &self,
        cookies: &RequestCookies,
        session: &StoredSession,
    ) -> Result<Vec<CookieMutation>, SessionError> {
        let value = encode_session(session)?;
        let chunks = split_chunks(&value, MAX_CHUNK_SIZE);
        let options = Self::cookie_options();
        let mut staged = Vec::new();

        if chunks.len() == 1 {
            staged.push(CookieMutation::set(&self.cookie_name, value, options.clone()));
            for index in self.present_chunks(cookies) {
                staged.push(CookieMutation::remove(
                    chunk_name(&self.cookie_name, index),
                    options.clone(),
                ));
            }
        } else {
            let count = chunks.len();
            for (index, chunk) in chunks.into_iter().enumerate() {
                staged.push(CookieMutation::set(
                    chunk_name(&self.cookie_name, index),
                    chunk,
                    options.clone(),
                ));
            }
            if cookies.contains(&self.cookie_name) {
                staged.push(CookieMutation::remove(&self.cookie_name, options.clone()));
            }
            for index in self.present_chunks(cookies) {
                if index >= count {
                    staged.push(CookieMutation::remove(
                        chunk_name(&self.cookie_name, index),
                        options.clone(),
                    ));
                }
            }
        }
        Ok(staged)
    }

    /// Removal of every session cookie the request carried.
    pub fn clear_session(&self, cookies: &RequestCookies) -> Vec<CookieMutation> {
        let options = Self::cookie_options();
        let mut staged = Vec::new();
        if cookies.contains(&self.cookie_name) {
            staged.push(CookieMutation::remove(&self.cookie_name, options.clone()));
        }
        for index in self.present_chunks(cookies) {
            staged.push(CookieMutation::remove(
                chunk_name(&self.cookie_name, index),
                options.clone(),
            ));
        }
        staged
    }

    async fn fetch_user(&self, access_token: &str) -> Result<User, SessionError> {
        let url = self
            .config
            .endpoint("auth/v1/user")
            .map_err(|e| SessionError::Network(e.to_string()))?;

        let res = self
            .client
            .get(url)
            .header("apikey", self.config.anon_key.expose_secret())
            .header(AUTHORIZATION, format!("Bearer {access_token}"))
            .send()
            .await
            .map_err(|e| SessionError::Network(e.to_string()))?;

        match res.status() {
            StatusCode::OK => res
                .json::<User>()
                .await
                .map_err(|e| SessionError::Decode(e.to_string())),
            status => Err(SessionError::Rejected(status.as_u16())),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<StoredSession, SessionError> {
        let mut url = self
            .config
            .endpoint("auth/v1/token")
            .map_err(|e| SessionError::Network(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("grant_type", "refresh_token");

        let key = self.config.anon_key.expose_secret();
        let res = self
            .client
            .post(url)
            .header("apikey", key)
            .header(AUTHORIZATION, format!("Bearer {key}"))
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| SessionError::Network(e.to_string()))?;

        match res.status() {
            StatusCode::OK => res
                .json::<StoredSession>()
                .await
                .map_err(|e| SessionError::Decode(e.to_string())),
            status => Err(SessionError::Rejected(status.as_u16())),
        }
    }
}

#[async_trait]
impl SessionResolver for SupabaseSessionResolver {
    async fn resolve(&self, cookies: &RequestCookies) -> Resolution {
        let Some(raw) = self.read_raw(cookies) else {
            return Resolution::anonymous();
        };

        let mut session = match decode_session(&raw) {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, cookie = %self.cookie_name, "ignoring session cookie");
                return Resolution::new(Identity::Unresolved(err));
            }
        };

        let mut staged = Vec::new();
        let now = self.clock.now();
        if session.is_expiring(now) {
            debug!("session expiring, refreshing");
            match self.refresh(&session.refresh_token).await {
                Ok(mut fresh) => {
                    fresh.fill_expiry(now);
                    staged = match self.session_cookies(cookies, &fresh) {
                        Ok(staged) => staged,
                        Err(err) => return Resolution::new(Identity::Unresolved(err)),
                    };
                    session = fresh;
                }
                Err(err) => {
                    warn!(error = %err, "session refresh failed, clearing cookies");
                    return Resolution::new(Identity::Unresolved(err))
                        .with_cookies(self.clear_session(cookies));
                }
            }
        }

        match self.fetch_user(&session.access_token).await {
            Ok(user) => Resolution::new(Identity::Authenticated(user)).with_cookies(staged),
            // revoked or invalid token: the cookie will never work again
            Err(err @ SessionError::Rejected(401 | 403)) => {
                warn!(error = %err, "access token rejected, clearing cookies");
                Resolution::new(Identity::Unresolved(err)).with_cookies(self.clear_session(cookies))
            }
            Err(err) => Resolution::new(Identity::Unresolved(err)).with_cookies(staged),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedClock;
    use chrono::TimeZone;
    use reqwest::Url;
    use secrecy::SecretString;

    fn resolver() -> SupabaseSessionResolver {
        let config = StoreConfig::new(
            Url::parse("https://abcd.supabase.co").unwrap(),
            SecretString::from("anon".to_string()),
        );
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        SupabaseSessionResolver::new(config, Arc::new(clock))
    }

    fn session(extra_len: usize) -> StoredSession {
        let mut extra = serde_json::Map::new();
        extra.insert("padding".to_string(), "x".repeat(extra_len).into());
        StoredSession {
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            expires_at: Some(1_704_067_200 + 3600),
            extra,
        }
    }

    #[test]
    fn cookie_name_uses_project_ref() {
        assert_eq!(resolver().cookie_name(), "sb-abcd-auth-token");
    }

    #[test]
    fn encoded_session_decodes_back() {
        let original = session(4);
        let encoded = encode_session(&original).unwrap();
        assert!(encoded.starts_with(BASE64_PREFIX));
        assert_eq!(decode_session(&encoded).unwrap(), original);
    }

    #[test]
    fn raw_json_cookie_is_accepted() {
        let decoded = decode_session(r#"{"access_token":"a","refresh_token":"r"}"#).unwrap();
        assert_eq!(decoded.access_token, "a");
        assert_eq!(decoded.expires_at, None);
    }

    #[test]
    fn garbage_cookie_is_malformed() {
        let err = decode_session("base64-!!!").unwrap_err();
        assert!(matches!(err, SessionError::MalformedCookie(_)));
    }

    #[test]
    fn chunked_cookie_is_reassembled_in_order() {
        let r = resolver();
        let cookies = RequestCookies::new()
            .with("sb-abcd-auth-token.1", "world")
            .with("sb-abcd-auth-token.0", "hello ");
        assert_eq!(r.read_raw(&cookies).as_deref(), Some("hello world"));
        assert_eq!(r.read_raw(&RequestCookies::new()), None);
    }

    #[test]
    fn small_session_replaces_stale_chunks() {
        let r = resolver();
        let cookies = RequestCookies::new()
            .with("sb-abcd-auth-token.0", "old")
            .with("sb-abcd-auth-token.1", "old");
        let staged = r.session_cookies(&cookies, &session(4)).unwrap();

        assert_eq!(staged.len(), 3);
        assert!(matches!(&staged[0], CookieMutation::Set { name, .. } if name == "sb-abcd-auth-token"));
        assert!(staged[1..]
            .iter()
            .all(|m| matches!(m, CookieMutation::Remove { .. })));
    }

    #[test]
    fn large_session_is_split_into_chunks() {
        let r = resolver();
        let cookies = RequestCookies::new().with("sb-abcd-auth-token", "old");
        let staged = r.session_cookies(&cookies, &session(5000)).unwrap();

        let sets: Vec<&CookieMutation> = staged
            .iter()
            .filter(|m| matches!(m, CookieMutation::Set { .. }))
            .collect();
        assert!(sets.len() >= 2);
        assert_eq!(sets[0].name(), "sb-abcd-auth-token.0");
        assert!(staged
            .iter()
            .any(|m| matches!(m, CookieMutation::Remove { name, .. } if name == "sb-abcd-auth-token")));
    }

    #[test]
    fn split_chunks_respects_limit() {
        let chunks = split_chunks(&"a".repeat(7), 3);
        assert_eq!(chunks, vec!["aaa", "aaa", "a"]);
        assert_eq!(split_chunks("", 3), vec![""]);
    }

    #[test]
    fn expiry_margin() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut s = session(0);
        s.expires_at = Some(now.timestamp() + 5);
        assert!(s.is_expiring(now));
        s.expires_at = Some(now.timestamp() + 60);
        assert!(!s.is_expiring(now));
        s.expires_at = None;
        assert!(!s.is_expiring(now));
    }

    #[tokio::test]
    async fn no_cookie_is_anonymous_without_network() {
        let resolution = resolver().resolve(&RequestCookies::new()).await;
        assert_eq!(resolution, Resolution::anonymous());
    }
}
