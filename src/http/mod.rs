//! HTTP protocol layer module
//!
//! The response sink handlers write into, plus cache, MIME and prebuilt
//! response helpers shared by the router and the transport.

pub mod cache;
pub mod mime;
pub mod response;
pub mod writer;

use percent_encoding::percent_decode_str;
use std::borrow::Cow;

/// Incoming request as seen by handlers: head plus the fully collected body
pub type Request = hyper::Request<hyper::body::Bytes>;

/// The request path with percent-escapes decoded, or `None` when the decoded
/// bytes are not UTF-8. Routes are keyed on this form.
pub fn decoded_path(req: &Request) -> Option<Cow<'_, str>> {
    percent_decode_str(req.uri().path()).decode_utf8().ok()
}

pub use response::{build_400_response, build_413_response, build_500_response};
pub use writer::{error, not_found, ResponseWriter};
