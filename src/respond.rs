//! Response helpers for handlers
//!
//! Each helper writes a complete reply into the `ResponseWriter`. Render and
//! encoding failures are not returned: they replace the reply with a 500
//! carrying the error text.

use crate::error::RenderError;
use crate::http::{self, Request, ResponseWriter};
use crate::logger;
use crate::template::Template;
use hyper::header::{CONTENT_TYPE, LOCATION};
use hyper::{Method, StatusCode};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Render `template_file` with `data` and send it as HTML.
///
/// The file is read and compiled on every call.
pub fn html<S: Serialize>(
    w: &mut ResponseWriter,
    status: StatusCode,
    template_file: impl AsRef<Path>,
    data: S,
) {
    let rendered = Template::from_file(template_file.as_ref()).and_then(|t| t.render(data));
    write_rendered(w, status, rendered);
}

/// Send an already rendered page, or a 500 if rendering failed
pub fn write_rendered(
    w: &mut ResponseWriter,
    status: StatusCode,
    rendered: Result<String, RenderError>,
) {
    match rendered {
        Ok(page) => {
            w.set_header(CONTENT_TYPE, HTML_CONTENT_TYPE);
            w.write_header(status);
            w.write_body(page.as_bytes());
        }
        Err(e) => internal_error(w, &e),
    }
}

/// Serialize `data` and send it as `application/json`
pub fn json<S: Serialize + ?Sized>(w: &mut ResponseWriter, status: StatusCode, data: &S) {
    match serde_json::to_vec(data) {
        Ok(body) => {
            w.set_header(CONTENT_TYPE, JSON_CONTENT_TYPE);
            w.write_header(status);
            w.write_body(&body);
        }
        Err(e) => internal_error(w, &RenderError::from(e)),
    }
}

fn internal_error(w: &mut ResponseWriter, err: &RenderError) {
    logger::log_error(&format!("Render failed: {err}"));
    http::error(w, StatusCode::INTERNAL_SERVER_ERROR, &err.to_string());
}

/// Reply `302 Found` pointing at `target`.
///
/// A target without scheme or host is made absolute against the directory of
/// the request path and cleaned, keeping a trailing slash and any query.
/// GET requests also get a short HTML body linking to the new location.
pub fn redirect(w: &mut ResponseWriter, req: &Request, target: &str) {
    let location = resolve_location(req.uri().path(), target);
    let had_content_type = w.headers().contains_key(CONTENT_TYPE);
    let method = req.method();

    w.set_header(LOCATION, &escape_non_ascii(&location));
    if !had_content_type && (method == Method::GET || method == Method::HEAD) {
        w.set_header(CONTENT_TYPE, HTML_CONTENT_TYPE);
    }
    w.write_header(StatusCode::FOUND);

    if !had_content_type && method == Method::GET {
        let body = format!("<a href=\"{}\">Found</a>.\n", escape_html(&location));
        w.write_body(body.as_bytes());
    }
}

fn resolve_location(request_path: &str, target: &str) -> String {
    if has_scheme(target) || target.starts_with("//") {
        return target.to_string();
    }

    let base = if request_path.is_empty() { "/" } else { request_path };
    let joined = if target.starts_with('/') {
        target.to_string()
    } else {
        let dir_end = base.rfind('/').map_or(0, |i| i + 1);
        format!("{}{target}", &base[..dir_end])
    };

    let (path, query) = match joined.find('?') {
        Some(i) => joined.split_at(i),
        None => (joined.as_str(), ""),
    };

    let mut cleaned = clean_path(path);
    if path.ends_with('/') && !cleaned.ends_with('/') {
        cleaned.push('/');
    }
    cleaned.push_str(query);
    cleaned
}

/// `scheme:` prefix per RFC 3986
fn has_scheme(target: &str) -> bool {
    let Some(colon) = target.find(':') else {
        return false;
    };
    let scheme = &target[..colon];
    scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Lexically normalize a slash-separated path: collapse repeated slashes,
/// drop `.` segments and resolve `..` against the previous segment.
fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|s| *s != "..") {
                    segments.pop();
                } else if !rooted {
                    segments.push("..");
                }
            }
            s => segments.push(s),
        }
    }

    let joined = segments.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

fn escape_non_ascii(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii() && !b.is_ascii_control() {
            out.push(char::from(b));
        } else {
            let _ = write!(out, "%{b:02x}");
        }
    }
    out
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
