//! Router: route registration and request dispatch
//!
//! A `Router` is built and populated during startup, shared behind an `Arc`
//! while serving, and dropped at shutdown. The table sits behind a
//! read/write lock, so late registrations are safe but exclusive.

mod handler;
mod table;

pub use handler::Handler;
pub use table::RouteTable;

use crate::error::CookieError;
use crate::http::{self, Request, ResponseWriter};
use crate::logger;
use crate::session::{Cookie, CookieManager, DefaultCookieManager, Session};
use crate::static_files::StaticRoot;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Response, StatusCode};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Construction options
#[derive(Default, Clone)]
pub struct RouterOptions {
    /// Replaces `DefaultCookieManager`
    pub cookie_manager: Option<Arc<dyn CookieManager>>,
}

pub struct Router {
    table: RwLock<RouteTable>,
    static_root: StaticRoot,
    cookie_manager: Arc<dyn CookieManager>,
}

macro_rules! method_routes {
    ($($(#[$doc:meta])* $name:ident => $method:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name<F>(&self, path: &str, handler: F)
            where
                F: Fn(&mut ResponseWriter, &Request) + Send + Sync + 'static,
            {
                self.handle(Method::$method, path, handler);
            }
        )*
    };
}

impl Router {
    pub fn new() -> Self {
        Self::with_options(RouterOptions::default())
    }

    pub fn with_options(options: RouterOptions) -> Self {
        Self {
            table: RwLock::new(RouteTable::new()),
            static_root: StaticRoot::default(),
            cookie_manager: options
                .cookie_manager
                .unwrap_or_else(|| Arc::new(DefaultCookieManager)),
        }
    }

    /// Register `handler` for (method, path). A later registration of the
    /// same pair replaces it.
    pub fn handle<H: Handler>(&self, method: Method, path: &str, handler: H) {
        logger::log_route_registered(&method, path);
        if self
            .write_table()
            .insert(method.clone(), path, Arc::new(handler))
            .is_some()
        {
            logger::log_debug(&format!("[Route] {method} {path} replaced"));
        }
    }

    method_routes! {
        get => GET,
        post => POST,
        put => PUT,
        delete => DELETE,
        head => HEAD,
        options => OPTIONS,
        patch => PATCH,
        trace => TRACE,
        connect => CONNECT,
    }

    pub fn lookup(&self, method: &Method, path: &str) -> Option<Arc<dyn Handler>> {
        self.read_table().lookup(method, path)
    }

    /// Registered (method, path) pairs, sorted
    pub fn routes(&self) -> Vec<(Method, String)> {
        self.read_table().routes()
    }

    /// Run the handler registered for the request, or write 404.
    ///
    /// The lookup key is the percent-decoded path; a path that does not
    /// decode to UTF-8 gets 400. The table lock is released before the
    /// handler runs.
    pub fn dispatch(&self, req: &Request, w: &mut ResponseWriter) {
        let Some(path) = http::decoded_path(req) else {
            logger::log_warning(&format!("Undecodable request path: {}", req.uri().path()));
            http::error(w, StatusCode::BAD_REQUEST, "400 Bad Request");
            return;
        };

        let handler = self.lookup(req.method(), &path);
        match handler {
            Some(handler) => handler.serve(w, req),
            None => http::not_found(w),
        }
    }

    /// Dispatch into a fresh writer and finish the response
    pub fn serve(&self, req: &Request) -> Response<Full<Bytes>> {
        let mut w = ResponseWriter::new();
        self.dispatch(req, &mut w);
        w.into_response()
    }

    /// Set the directory static routes serve from. Last call wins, including
    /// for static routes that are already registered.
    pub fn configure_static(&self, root: impl Into<PathBuf>) {
        self.static_root.set(root.into());
    }

    pub fn static_root(&self) -> Option<PathBuf> {
        self.static_root.get()
    }

    pub(crate) fn static_root_handle(&self) -> StaticRoot {
        self.static_root.clone()
    }

    pub fn cookie_manager(&self) -> Arc<dyn CookieManager> {
        Arc::clone(&self.cookie_manager)
    }

    pub fn set_cookie(&self, w: &mut ResponseWriter, cookie: &Cookie) {
        self.cookie_manager.set_cookie(w, cookie);
    }

    pub fn get_cookie(&self, req: &Request, name: &str) -> Result<Cookie, CookieError> {
        self.cookie_manager.get_cookie(req, name)
    }

    pub fn set_session(&self, session: &mut Session, key: &str, value: &str) {
        session.set(key, value);
    }

    pub fn get_session<'s>(&self, session: &'s Session, key: &str) -> &'s str {
        session.get(key)
    }

    fn read_table(&self) -> RwLockReadGuard<'_, RouteTable> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_table(&self) -> RwLockWriteGuard<'_, RouteTable> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn request(method: Method, path: &str) -> Request {
        hyper::Request::builder()
            .method(method)
            .uri(path)
            .body(Bytes::new())
            .unwrap()
    }

    fn dispatch(router: &Router, method: Method, path: &str) -> ResponseWriter {
        let mut w = ResponseWriter::new();
        router.dispatch(&request(method, path), &mut w);
        w
    }

    #[test]
    fn test_hello_scenario() {
        let router = Router::new();
        router.get("/hello", |w, _| w.write_body(b"hi"));

        let w = dispatch(&router, Method::GET, "/hello");
        assert_eq!(w.status(), StatusCode::OK);
        assert_eq!(w.body(), b"hi");

        let w = dispatch(&router, Method::POST, "/hello");
        assert_eq!(w.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_every_verb_registers_its_method() {
        let router = Router::new();
        router.get("/r", |w, _| w.write_body(b"GET"));
        router.post("/r", |w, _| w.write_body(b"POST"));
        router.put("/r", |w, _| w.write_body(b"PUT"));
        router.delete("/r", |w, _| w.write_body(b"DELETE"));
        router.head("/r", |w, _| w.write_body(b"HEAD"));
        router.options("/r", |w, _| w.write_body(b"OPTIONS"));
        router.patch("/r", |w, _| w.write_body(b"PATCH"));
        router.trace("/r", |w, _| w.write_body(b"TRACE"));
        router.connect("/r", |w, _| w.write_body(b"CONNECT"));

        for method in [
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::HEAD,
            Method::OPTIONS,
            Method::PATCH,
            Method::TRACE,
            Method::CONNECT,
        ] {
            let resp = router.serve(&request(method.clone(), "/r"));
            assert_eq!(resp.status(), StatusCode::OK, "{method}");
            assert!(router.lookup(&method, "/r").is_some());

            let w = dispatch(&router, method.clone(), "/r");
            assert_eq!(w.body(), method.as_str().as_bytes());
        }
        assert_eq!(router.routes().len(), 9);
    }

    #[test]
    fn test_reregistration_overwrites() {
        let router = Router::new();
        router.get("/a", |w, _| w.write_body(b"old"));
        router.get("/a", |w, _| w.write_body(b"new"));

        assert_eq!(dispatch(&router, Method::GET, "/a").body(), b"new");
        assert_eq!(router.routes(), vec![(Method::GET, "/a".to_string())]);
    }

    #[test]
    fn test_path_ignores_query_string() {
        let router = Router::new();
        router.get("/search", |w, req| {
            w.write_body(req.uri().query().unwrap_or("").as_bytes());
        });

        let w = dispatch(&router, Method::GET, "/search?q=rust");
        assert_eq!(w.body(), b"q=rust");
    }

    #[test]
    fn test_lookup_uses_decoded_path() {
        let router = Router::new();
        router.get("/my page.html", |w, _| w.write_body(b"spaced"));
        router.get("/caf\u{e9}", |w, _| w.write_body(b"accent"));

        assert_eq!(dispatch(&router, Method::GET, "/my%20page.html").body(), b"spaced");
        assert_eq!(dispatch(&router, Method::GET, "/caf%C3%A9").body(), b"accent");
        assert_eq!(
            dispatch(&router, Method::GET, "/my%2520page.html").status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_non_utf8_path_is_400() {
        let router = Router::new();
        router.get("/x", |w, _| w.write_body(b"x"));

        let w = dispatch(&router, Method::GET, "/%FF%FE");
        assert_eq!(w.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_unregistered_pair_is_404() {
        let router = Router::new();
        assert!(router.lookup(&Method::GET, "/missing").is_none());

        let resp = router.serve(&request(Method::GET, "/missing"));
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers()["content-type"], "text/plain; charset=utf-8");
    }

    #[test]
    fn test_handler_owns_response() {
        let router = Router::new();
        router.post("/items", |w, req| {
            w.set_header(hyper::header::LOCATION, "/items/1");
            w.write_header(StatusCode::CREATED);
            w.write_body(req.body());
        });

        let req = hyper::Request::builder()
            .method(Method::POST)
            .uri("/items")
            .body(Bytes::from_static(b"payload"))
            .unwrap();
        let resp = router.serve(&req);
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(resp.headers()["location"], "/items/1");
    }

    #[test]
    fn test_handler_may_register_routes() {
        let router = Arc::new(Router::new());
        let inner = Arc::clone(&router);
        router.post("/install", move |w, _| {
            inner.get("/installed", |w, _| w.write_body(b"yes"));
            w.write_header(StatusCode::NO_CONTENT);
        });

        assert_eq!(
            dispatch(&router, Method::POST, "/install").status(),
            StatusCode::NO_CONTENT
        );
        assert_eq!(dispatch(&router, Method::GET, "/installed").body(), b"yes");
    }

    #[test]
    fn test_concurrent_dispatch() {
        let router = Arc::new(Router::new());
        router.get("/hello", |w, _| w.write_body(b"hi"));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let router = Arc::clone(&router);
                thread::spawn(move || {
                    for _ in 0..100 {
                        assert_eq!(dispatch(&router, Method::GET, "/hello").body(), b"hi");
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
    }

    #[test]
    fn test_struct_handler() {
        struct Greeting(&'static str);

        impl Handler for Greeting {
            fn serve(&self, w: &mut ResponseWriter, _req: &Request) {
                w.write_body(self.0.as_bytes());
            }
        }

        let router = Router::new();
        router.handle(Method::GET, "/greet", Greeting("hello"));
        assert_eq!(dispatch(&router, Method::GET, "/greet").body(), b"hello");
    }

    #[test]
    fn test_session_helpers() {
        let router = Router::new();
        let mut session = Session::new(Cookie::new("sid", "one"));
        router.set_session(&mut session, "user", "two");
        assert_eq!(router.get_session(&session, "user"), "two");
    }
}
