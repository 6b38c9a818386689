//! Validators and freshness for static assets
//!
//! Static replies are revalidated by content hash only; there is no
//! `Last-Modified` handling.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Seconds a static asset stays fresh: one year
pub const STATIC_MAX_AGE: u32 = 31_536_000;

/// `Cache-Control` value sent with every static reply, including 304 and 404
pub const STATIC_CACHE_CONTROL: &str = "public, max-age=31536000";

/// Strong entity tag derived from the bytes served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTag(String);

impl EntityTag {
    pub fn for_content(content: &[u8]) -> Self {
        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        Self(format!("\"{:x}\"", hasher.finish()))
    }

    /// Quoted header form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether an `If-None-Match` list names this tag. `*` matches anything;
    /// weak tags (`W/"..."`) compare by their opaque part.
    pub fn matches(&self, if_none_match: Option<&str>) -> bool {
        if_none_match.is_some_and(|list| {
            list.split(',')
                .map(str::trim)
                .any(|candidate| {
                    candidate == "*" || candidate.trim_start_matches("W/") == self.0
                })
        })
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
