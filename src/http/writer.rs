//! Response sink handed to every handler
//!
//! Handlers never build a `Response` themselves. They set a status, headers
//! and body bytes on a `ResponseWriter`, and the dispatcher turns it into a
//! hyper response once the handler returns.

use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use std::io;

const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Buffered response under construction
#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status written so far, `200 OK` if none was set
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Set the response status. The first call wins; writing body bytes
    /// commits `200 OK` if no status was set before.
    pub fn write_header(&mut self, status: StatusCode) {
        if let Some(current) = self.status {
            logger::log_debug(&format!(
                "Superfluous write_header({status}), status already {current}"
            ));
            return;
        }
        self.status = Some(status);
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Replace a header. Values that are not valid header text are dropped.
    pub fn set_header(&mut self, name: HeaderName, value: &str) {
        match HeaderValue::from_str(value) {
            Ok(v) => {
                self.headers.insert(name, v);
            }
            Err(e) => logger::log_warning(&format!("Dropping invalid {name} header: {e}")),
        }
    }

    /// Add a header without removing earlier values of the same name
    pub fn append_header(&mut self, name: HeaderName, value: &str) {
        match HeaderValue::from_str(value) {
            Ok(v) => {
                self.headers.append(name, v);
            }
            Err(e) => logger::log_warning(&format!("Dropping invalid {name} header: {e}")),
        }
    }

    /// Append bytes to the body
    pub fn write_body(&mut self, data: &[u8]) {
        self.status.get_or_insert(StatusCode::OK);
        self.body.extend_from_slice(data);
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Discard everything written so far
    pub fn reset(&mut self) {
        self.status = None;
        self.headers.clear();
        self.body.clear();
    }

    /// Finish the response. A non-empty body without a `Content-Type`
    /// is sent as plain UTF-8 text.
    pub fn into_response(mut self) -> Response<Full<Bytes>> {
        if !self.body.is_empty() && !self.headers.contains_key(CONTENT_TYPE) {
            self.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
        }

        let status = self.status();
        let mut response = Response::new(Full::new(Bytes::from(self.body)));
        *response.status_mut() = status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl io::Write for ResponseWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_body(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Replace whatever was written with a plain-text error
pub fn error(w: &mut ResponseWriter, status: StatusCode, message: &str) {
    w.reset();
    w.set_header(CONTENT_TYPE, DEFAULT_CONTENT_TYPE);
    w.set_header(
        HeaderName::from_static("x-content-type-options"),
        "nosniff",
    );
    w.write_header(status);
    w.write_body(message.as_bytes());
    w.write_body(b"\n");
}

/// Standard 404 reply
pub fn not_found(w: &mut ResponseWriter) {
    error(w, StatusCode::NOT_FOUND, "404 Not Found");
}
