//! Cookies and sessions
//!
//! `CookieManager` is the seam for how cookies travel: the default writes
//! plain `Set-Cookie` headers and reads the request's `Cookie` header, and a
//! router can be given another implementation (signed, encrypted, ...)
//! through `RouterOptions`.

use crate::error::CookieError;
use crate::http::{Request, ResponseWriter};
use crate::logger;
use chrono::{DateTime, Utc};
use hyper::header::{COOKIE, SET_COOKIE};
use time::OffsetDateTime;

/// A cookie as sent in `Set-Cookie`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    /// Omitted from the header when empty
    pub path: String,
    /// Omitted from the header when empty
    pub domain: String,
    /// Session cookie when `None`
    pub expires: Option<DateTime<Utc>>,
    pub secure: bool,
    pub http_only: bool,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    /// Render the `Set-Cookie` header value, or `None` if the name is not a
    /// valid token. Bytes not allowed in a cookie value are dropped; a value
    /// containing a space or comma is sent quoted.
    pub fn to_set_cookie_header(&self) -> Option<String> {
        if !is_valid_name(&self.name) {
            return None;
        }

        let mut builder = ::cookie::Cookie::build((self.name.clone(), sanitize_value(&self.value)))
            .secure(self.secure)
            .http_only(self.http_only);
        if !self.path.is_empty() {
            builder = builder.path(self.path.clone());
        }
        if !self.domain.is_empty() {
            builder = builder.domain(self.domain.clone());
        }
        if let Some(expires) = self.expires.and_then(to_offset) {
            builder = builder.expires(expires);
        }

        Some(builder.build().to_string())
    }

    /// Parse a full `Set-Cookie` header value back into its fields. Quotes
    /// around the value are removed.
    pub fn parse_set_cookie(header: &str) -> Result<Self, CookieError> {
        let wire = ::cookie::Cookie::parse(header)
            .map_err(|e| CookieError::Malformed(e.to_string()))?;

        Ok(Self {
            name: wire.name().to_string(),
            value: wire.value_trimmed().to_string(),
            path: wire.path().unwrap_or_default().to_string(),
            domain: wire.domain().unwrap_or_default().to_string(),
            expires: wire.expires_datetime().and_then(from_offset),
            secure: wire.secure().unwrap_or(false),
            http_only: wire.http_only().unwrap_or(false),
        })
    }
}

fn to_offset(at: DateTime<Utc>) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(at.timestamp()).ok()
}

fn from_offset(at: OffsetDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(at.unix_timestamp(), 0)
}

/// RFC 6265 cookie-name: an RFC 2616 token
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_graphic()
                && !matches!(
                    b,
                    b'(' | b')' | b'<' | b'>' | b'@' | b',' | b';' | b':' | b'\\' | b'"'
                        | b'/' | b'[' | b']' | b'?' | b'=' | b'{' | b'}'
                )
        })
}

fn sanitize_value(value: &str) -> String {
    let kept: String = value
        .chars()
        .filter(|&c| (' '..='~').contains(&c) && !matches!(c, '"' | ';' | '\\'))
        .collect();

    if kept.contains([' ', ',']) {
        format!("\"{kept}\"")
    } else {
        kept
    }
}

/// Strategy for moving a cookie across one request/response exchange
pub trait CookieManager: Send + Sync {
    /// Append a `Set-Cookie` header for `cookie` to the response
    fn set_cookie(&self, w: &mut ResponseWriter, cookie: &Cookie);

    /// Find the cookie called `name` on the request
    fn get_cookie(&self, req: &Request, name: &str) -> Result<Cookie, CookieError>;
}

/// Plain, unsigned cookies
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCookieManager;

impl CookieManager for DefaultCookieManager {
    fn set_cookie(&self, w: &mut ResponseWriter, cookie: &Cookie) {
        match cookie.to_set_cookie_header() {
            Some(header) => w.append_header(SET_COOKIE, &header),
            None => logger::log_warning(&format!(
                "Invalid cookie name {:?}; dropping cookie",
                cookie.name
            )),
        }
    }

    /// Only name and value travel in a `Cookie` request header, so the other
    /// fields of the result are left at their defaults. A quoted value is
    /// returned without its quotes.
    fn get_cookie(&self, req: &Request, name: &str) -> Result<Cookie, CookieError> {
        req.headers()
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(::cookie::Cookie::split_parse)
            .flatten()
            .find(|c| c.name() == name)
            .map(|c| Cookie::new(c.name(), c.value_trimmed()))
            .ok_or_else(|| CookieError::NotFound(name.to_string()))
    }
}

/// Application state carried in a single cookie.
///
/// There is exactly one value per session: `get` and `set` accept a key so
/// call sites read naturally, but the key does not select anything, and
/// `set("a", ..)` followed by `get("b")` returns what was set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    cookie: Cookie,
}

impl Session {
    pub const fn new(cookie: Cookie) -> Self {
        Self { cookie }
    }

    pub fn get(&self, _key: &str) -> &str {
        &self.cookie.value
    }

    pub fn set(&mut self, _key: &str, value: impl Into<String>) {
        self.cookie.value = value.into();
    }

    pub const fn cookie(&self) -> &Cookie {
        &self.cookie
    }

    pub fn into_cookie(self) -> Cookie {
        self.cookie
    }
}
