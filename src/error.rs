//! Error types
//!
//! Setup-time errors are collected per item, request-time errors are turned
//! into responses by the code that hits them, and cookie/upload errors are
//! handed back to the calling handler.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while registering templates from glob patterns
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("cannot read glob match for '{pattern}': {source}")]
    Glob {
        pattern: String,
        #[source]
        source: glob::GlobError,
    },

    #[error("cannot load template '{}': {source}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: RenderError,
    },
}

/// Failure while producing a response body
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot read template file: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Template(#[from] minijinja::Error),

    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CookieError {
    #[error("named cookie not present: {0}")]
    NotFound(String),

    #[error("malformed cookie: {0}")]
    Malformed(String),
}

/// Failure while persisting an uploaded file
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("cannot create '{}': {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write '{}': {source}", path.display())]
    Copy {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
