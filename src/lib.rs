//! routekit: a small synchronous-handler HTTP router
//!
//! Routes are exact `(method, path)` keys in a table behind a lock. Handlers
//! write into a buffered `ResponseWriter`; the bundled server runs them on
//! the blocking pool of a tokio runtime.
//!
//! ```no_run
//! use std::sync::Arc;
//! use routekit::{config::Config, server, Router};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let router = Router::new();
//! router.get("/hello", |w, _req| w.write_body(b"hi"));
//!
//! let config = Config::load_from("config")?;
//! server::run(Arc::new(router), &config).await
//! # }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod logger;
pub mod respond;
pub mod router;
pub mod server;
pub mod session;
pub mod static_files;
pub mod template;
pub mod upload;

pub use error::{CookieError, RegistrationError, RenderError, UploadError};
pub use http::{Request, ResponseWriter};
pub use router::{Handler, Router, RouterOptions};
pub use session::{Cookie, CookieManager, DefaultCookieManager, Session};
pub use static_files::StaticPolicy;
pub use template::{RegistrationReport, Template};
pub use upload::save_uploaded_file;
