//! Cookie - リクエスト側の読み取り専用ビューとレスポンス側の変更指示
//!
//! セッション解決はリクエストの cookie を読み、書き込みたい cookie は
//! `CookieMutation` として返すだけ。実際にレスポンスへ載せるのは呼び出し側。

use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Read-only view of the cookies sent with a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCookies {
    values: BTreeMap<String, String>,
}

impl RequestCookies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one or more `Cookie` header values (`a=1; b=2`).
    ///
    /// Malformed pairs are skipped. On duplicate names the first one wins.
    pub fn from_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        let mut values = BTreeMap::new();
        for header in headers {
            for pair in header.split(';') {
                let Some((name, value)) = pair.split_once('=') else {
                    continue;
                };
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                let value = value.trim();
                let value = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(value);
                values
                    .entry(name.to_string())
                    .or_insert_with(|| value.to_string());
            }
        }
        Self { values }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Lax,
    Strict,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
            SameSite::None => "None",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: Option<String>,
    /// Seconds.
    pub max_age: Option<i64>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: Option<SameSite>,
}

impl CookieOptions {
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }
}

/// A cookie write staged for the outgoing response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieMutation {
    Set {
        name: String,
        value: String,
        options: CookieOptions,
    },
    Remove {
        name: String,
        options: CookieOptions,
    },
}

impl CookieMutation {
    pub fn set(name: impl Into<String>, value: impl Into<String>, options: CookieOptions) -> Self {
        CookieMutation::Set {
            name: name.into(),
            value: value.into(),
            options,
        }
    }

    pub fn remove(name: impl Into<String>, options: CookieOptions) -> Self {
        CookieMutation::Remove {
            name: name.into(),
            options,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CookieMutation::Set { name, .. } | CookieMutation::Remove { name, .. } => name,
        }
    }

    /// Render as a `Set-Cookie` header value.
    pub fn to_set_cookie(&self) -> String {
        let (name, value, options, max_age) = match self {
            CookieMutation::Set {
                name,
                value,
                options,
            } => (name, value.as_str(), options, options.max_age),
            // removal = empty value + Max-Age=0
            CookieMutation::Remove { name, options } => (name, "", options, Some(0)),
        };

        let mut header = format!("{name}={value}");
        if let Some(path) = &options.path {
            let _ = write!(header, "; Path={path}");
        }
        if let Some(max_age) = max_age {
            let _ = write!(header, "; Max-Age={max_age}");
        }
        if options.http_only {
            header.push_str("; HttpOnly");
        }
        if options.secure {
            header.push_str("; Secure");
        }
        if let Some(same_site) = options.same_site {
            let _ = write!(header, "; SameSite={}", same_site.as_str());
        }
        header
    }
}
