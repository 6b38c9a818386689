// Connection handling
// Serves one accepted TCP connection: HTTP/1.1 framing, body collection,
// synchronous dispatch on the blocking pool and access logging.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body as _, Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Response;
use hyper_util::rt::TokioIo;

use crate::config::Config;
use crate::http::{self, Request};
use crate::logger::{self, AccessLogEntry};
use crate::router::Router;

/// Per-connection settings, resolved once from `Config`
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub keep_alive: bool,
    /// Deadline for the whole connection
    pub timeout: Duration,
    pub max_body_size: u64,
    pub access_log: bool,
    pub access_log_format: String,
}

impl ConnectionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            keep_alive: config.performance.keep_alive,
            timeout: config.connection_timeout(),
            max_body_size: config.performance.max_body_size,
            access_log: config.logging.access_log,
            access_log_format: config.logging.access_log_format.clone(),
        }
    }
}

/// Serve `stream` on its own task until the peer closes it or the deadline
/// passes.
pub fn spawn_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    router: Arc<Router>,
    settings: Arc<ConnectionSettings>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let timeout = settings.timeout;

        let mut builder = http1::Builder::new();
        builder.keep_alive(settings.keep_alive);

        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let router = Arc::clone(&router);
                let settings = Arc::clone(&settings);
                async move { handle_request(req, peer_addr, router, settings).await }
            }),
        );

        match tokio::time::timeout(timeout, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => logger::log_debug(&format!(
                "Connection from {peer_addr} closed after {}s deadline",
                timeout.as_secs()
            )),
        }
    });
}

/// Collect the body, run the router and log the exchange
pub async fn handle_request(
    req: hyper::Request<Incoming>,
    peer_addr: SocketAddr,
    router: Arc<Router>,
    settings: Arc<ConnectionSettings>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, body) = req.into_parts();

    let (request, rejected) = match collect_body(body, settings.max_body_size).await {
        Ok(bytes) => (Request::from_parts(parts, bytes), None),
        Err(response) => (Request::from_parts(parts, Bytes::new()), Some(response)),
    };

    let entry = settings
        .access_log
        .then(|| AccessLogEntry::from_request(&request, peer_addr));

    let response = match rejected {
        Some(response) => response,
        None => dispatch(router, request).await,
    };

    if let Some(mut entry) = entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &settings.access_log_format);
    }

    Ok(response)
}

async fn collect_body(body: Incoming, max_body_size: u64) -> Result<Bytes, Response<Full<Bytes>>> {
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            logger::log_warning(&format!(
                "Request body too large (max: {max_body_size} bytes)"
            ));
            Err(http::build_413_response())
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            Err(http::build_400_response())
        }
    }
}

/// Handlers are synchronous, so the router runs on the blocking pool. A
/// panicking handler surfaces here as a join error.
async fn dispatch(router: Arc<Router>, request: Request) -> Response<Full<Bytes>> {
    match tokio::task::spawn_blocking(move || router.serve(&request)).await {
        Ok(response) => response,
        Err(e) => {
            logger::log_error(&format!("Handler failed: {e}"));
            http::build_500_response()
        }
    }
}
