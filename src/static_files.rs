//! Static file serving
//!
//! One GET route serves files from the configured root directory. The route
//! key is a literal string such as `/*filepath` or `/static/*filepath`;
//! the route table matches it exactly, so only a request for that very path
//! reaches the handler. Every reply carries a one-year public cache policy.

use crate::http::cache::{EntityTag, STATIC_CACHE_CONTROL};
use crate::http::{self, mime, Request, ResponseWriter};
use crate::logger;
use crate::router::{Handler, Router};
use hyper::header::{CACHE_CONTROL, CONTENT_TYPE, ETAG, IF_NONE_MATCH};
use hyper::{Method, StatusCode};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// Route key of the catch-all policy
pub const CATCH_ALL_ROUTE: &str = "/*filepath";

const FILEPATH_SUFFIX: &str = "*filepath";
const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// Which static route gets registered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaticPolicy {
    /// GET `/*filepath`, resolved against the root as-is
    CatchAll,
    /// GET `{prefix}*filepath`; the first `prefix.len()` bytes of the request
    /// path are stripped before resolving
    Prefixed { prefix: String },
}

impl StaticPolicy {
    pub fn route_path(&self) -> String {
        match self {
            Self::CatchAll => CATCH_ALL_ROUTE.to_string(),
            Self::Prefixed { prefix } => format!("{prefix}{FILEPATH_SUFFIX}"),
        }
    }

    fn relative_path<'a>(&self, request_path: &'a str) -> &'a str {
        match self {
            Self::CatchAll => request_path,
            Self::Prefixed { prefix } => request_path.get(prefix.len()..).unwrap_or(""),
        }
    }
}

/// Shared, replaceable static root directory
#[derive(Debug, Clone, Default)]
pub struct StaticRoot(Arc<RwLock<Option<PathBuf>>>);

impl StaticRoot {
    pub fn set(&self, root: PathBuf) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(root);
    }

    pub fn get(&self) -> Option<PathBuf> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

struct StaticHandler {
    root: StaticRoot,
    policy: StaticPolicy,
}

impl Handler for StaticHandler {
    fn serve(&self, w: &mut ResponseWriter, req: &Request) {
        let Some(root) = self.root.get() else {
            logger::log_warning("Static route hit but no static root is configured");
            reply_not_found(w);
            return;
        };

        let Some(path) = http::decoded_path(req) else {
            reply_not_found(w);
            return;
        };
        match resolve(&root, self.policy.relative_path(&path)) {
            Some(file) => serve_file(w, req, &file),
            None => reply_not_found(w),
        }
    }
}

impl Router {
    /// Register the static route for `policy`, serving from whatever root
    /// `configure_static` set (now or later).
    pub fn enable_static(&self, policy: StaticPolicy) {
        let route = policy.route_path();
        let handler = StaticHandler {
            root: self.static_root_handle(),
            policy,
        };
        self.handle(Method::GET, &route, handler);
    }
}

/// Map a request path onto a file under `root`.
///
/// Directories (and empty or slash-terminated paths) fall back to an index
/// file. Returns `None` for missing files and for anything whose canonical
/// path is not inside the canonical root.
pub fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let root_canonical = match root.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static directory not found or inaccessible '{}': {e}",
                root.display()
            ));
            return None;
        }
    };

    let relative = request_path.trim_start_matches('/');
    let mut candidate = root_canonical.join(relative);

    if relative.is_empty() || relative.ends_with('/') || candidate.is_dir() {
        candidate = INDEX_FILES
            .iter()
            .map(|index| candidate.join(index))
            .find(|p| p.is_file())?;
    }

    // Missing files are the common 404, not worth a warning
    let canonical = candidate.canonicalize().ok()?;
    if !canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {request_path} -> {}",
            canonical.display()
        ));
        return None;
    }

    canonical.is_file().then_some(canonical)
}

fn serve_file(w: &mut ResponseWriter, req: &Request, file: &Path) {
    let content = match fs::read(file) {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!("Failed to read file '{}': {e}", file.display()));
            reply_not_found(w);
            return;
        }
    };

    let etag = EntityTag::for_content(&content);
    let if_none_match = req
        .headers()
        .get(IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok());

    set_cache_headers(w);
    w.set_header(ETAG, etag.as_str());

    if etag.matches(if_none_match) {
        w.write_header(StatusCode::NOT_MODIFIED);
        return;
    }

    w.set_header(CONTENT_TYPE, mime::content_type_for(file));
    w.write_header(StatusCode::OK);
    w.write_body(&content);
}

fn reply_not_found(w: &mut ResponseWriter) {
    http::not_found(w);
    set_cache_headers(w);
}

fn set_cache_headers(w: &mut ResponseWriter) {
    w.set_header(CACHE_CONTROL, STATIC_CACHE_CONTROL);
}
