//! Template route registration
//!
//! Expands glob patterns and registers `GET /<file name>` for every template
//! found. Bad patterns and unparsable files are logged and skipped so one
//! broken page never blocks the rest.

use super::Template;
use crate::error::{RegistrationError, RenderError};
use crate::http::{self, Request};
use crate::logger;
use crate::respond;
use crate::router::Router;
use crate::static_files::StaticRoot;
use hyper::StatusCode;
use serde::Serialize;
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

/// Outcome of a `register_templates` call
#[derive(Debug, Default)]
pub struct RegistrationReport {
    /// Route paths registered, in registration order (may repeat)
    pub routes: Vec<String>,
    pub errors: Vec<RegistrationError>,
}

impl RegistrationReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn record(&mut self, error: RegistrationError) {
        logger::log_error(&error.to_string());
        self.errors.push(error);
    }
}

/// Data every registered template is rendered with
#[derive(Debug, Serialize)]
struct PageContext<'a> {
    method: &'a str,
    path: Cow<'a, str>,
    query: &'a str,
    static_path: Option<String>,
}

impl Router {
    /// Register one GET route per template file matched by `patterns`.
    ///
    /// The route is `"/" + file name`; when two files share a name, the one
    /// registered last wins.
    pub fn register_templates<I, S>(&self, patterns: I) -> RegistrationReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = RegistrationReport::default();

        for file in expand_patterns(patterns, &mut report) {
            let template = match Template::from_file(&file) {
                Ok(t) => t,
                Err(source) => {
                    report.record(RegistrationError::Template { path: file, source });
                    continue;
                }
            };

            let route = format!("/{}", template.name());
            self.register_page(&route, template);
            report.routes.push(route);
        }

        report
    }

    fn register_page(&self, route: &str, template: Template) {
        let template = Arc::new(template);
        let static_root = self.static_root_handle();

        self.get(route, move |w, req| {
            let rendered = render_page(&template, req, &static_root);
            respond::write_rendered(w, StatusCode::OK, rendered);
        });
    }
}

fn render_page(
    template: &Template,
    req: &Request,
    static_root: &StaticRoot,
) -> Result<String, RenderError> {
    template.render(PageContext {
        method: req.method().as_str(),
        path: http::decoded_path(req).unwrap_or(Cow::Borrowed(req.uri().path())),
        query: req.uri().query().unwrap_or(""),
        static_path: static_root.get().map(|p| p.display().to_string()),
    })
}

fn expand_patterns<I, S>(patterns: I, report: &mut RegistrationReport) -> Vec<PathBuf>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut files = Vec::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();
        let paths = match glob::glob(pattern) {
            Ok(paths) => paths,
            Err(source) => {
                report.record(RegistrationError::Pattern {
                    pattern: pattern.to_string(),
                    source,
                });
                continue;
            }
        };

        for entry in paths {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(path) => logger::log_debug(&format!(
                    "Skipping non-file glob match: {}",
                    path.display()
                )),
                Err(source) => report.record(RegistrationError::Glob {
                    pattern: pattern.to_string(),
                    source,
                }),
            }
        }
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::body::Bytes;
    use hyper::Method;
    use std::fs;
    use tempfile::TempDir;

    fn pages() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("pages")).unwrap();
        fs::write(dir.path().join("pages/a.html"), "<p>page a at {{ path }}</p>").unwrap();
        fs::write(dir.path().join("pages/b.html"), "<p>page b</p>").unwrap();
        dir
    }

    fn pattern(dir: &TempDir, rest: &str) -> String {
        format!("{}/{rest}", dir.path().display())
    }

    fn get(router: &Router, path: &str) -> (StatusCode, String) {
        let req = hyper::Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Bytes::new())
            .unwrap();
        let mut w = crate::http::ResponseWriter::new();
        router.dispatch(&req, &mut w);
        (w.status(), String::from_utf8(w.body().to_vec()).unwrap())
    }

    #[test]
    fn test_registers_one_route_per_file() {
        let dir = pages();
        let router = Router::new();
        let report = router.register_templates([pattern(&dir, "pages/*.html")]);

        assert!(report.is_clean());
        assert_eq!(report.routes, vec!["/a.html", "/b.html"]);

        assert_eq!(
            get(&router, "/a.html"),
            (StatusCode::OK, "<p>page a at /a.html</p>".to_string())
        );
        assert_eq!(
            get(&router, "/b.html"),
            (StatusCode::OK, "<p>page b</p>".to_string())
        );
        assert_eq!(get(&router, "/pages/a.html").0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_duplicate_base_names_last_wins() {
        let dir = pages();
        fs::create_dir(dir.path().join("other")).unwrap();
        fs::write(dir.path().join("other/a.html"), "other a").unwrap();

        let router = Router::new();
        let report = router.register_templates([
            pattern(&dir, "pages/a.html"),
            pattern(&dir, "pages/a.html"),
            pattern(&dir, "other/a.html"),
        ]);

        assert_eq!(report.routes.len(), 3);
        assert_eq!(router.routes(), vec![(Method::GET, "/a.html".to_string())]);
        assert_eq!(get(&router, "/a.html").1, "other a");
    }

    #[test]
    fn test_bad_pattern_does_not_stop_others() {
        let dir = pages();
        let router = Router::new();
        let report = router.register_templates([
            "pages/[".to_string(),
            pattern(&dir, "pages/b.html"),
        ]);

        assert_eq!(report.errors.len(), 1);
        assert!(matches!(report.errors[0], RegistrationError::Pattern { .. }));
        assert_eq!(report.routes, vec!["/b.html"]);
        assert_eq!(get(&router, "/b.html").0, StatusCode::OK);
    }

    #[test]
    fn test_unparsable_template_is_skipped() {
        let dir = pages();
        fs::write(dir.path().join("pages/broken.html"), "{% for %}").unwrap();

        let router = Router::new();
        let report = router.register_templates([pattern(&dir, "pages/*.html")]);

        assert_eq!(report.errors.len(), 1);
        assert!(matches!(
            report.errors[0],
            RegistrationError::Template { .. }
        ));
        assert_eq!(report.routes, vec!["/a.html", "/b.html"]);
        assert_eq!(get(&router, "/broken.html").0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_no_matches_registers_nothing() {
        let dir = pages();
        let router = Router::new();
        let report = router.register_templates([pattern(&dir, "pages/*.txt")]);

        assert!(report.is_clean());
        assert!(report.routes.is_empty());
        assert!(router.routes().is_empty());
    }

    #[test]
    fn test_render_failure_is_500_with_message() {
        let dir = pages();
        fs::write(dir.path().join("pages/strict.html"), "{{ user.name }}").unwrap();

        let router = Router::new();
        router.register_templates([pattern(&dir, "pages/strict.html")]);

        let (status, body) = get(&router, "/strict.html");
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("undefined"), "unexpected body: {body}");
    }

    #[test]
    fn test_context_exposes_static_path() {
        let dir = pages();
        fs::write(
            dir.path().join("pages/assets.html"),
            "{{ static_path }}|{{ query }}",
        )
        .unwrap();

        let router = Router::new();
        router.configure_static("/srv/public");
        router.register_templates([pattern(&dir, "pages/assets.html")]);

        assert_eq!(get(&router, "/assets.html?v=2").1, "/srv/public|v=2");
    }

    #[test]
    fn test_encoded_request_reaches_spaced_and_non_ascii_names() {
        let dir = pages();
        fs::write(dir.path().join("pages/my page.html"), "spaced {{ path }}").unwrap();
        fs::write(dir.path().join("pages/caf\u{e9}.html"), "menu").unwrap();

        let router = Router::new();
        let report = router.register_templates([pattern(&dir, "pages/*.html")]);
        assert!(report.routes.contains(&"/my page.html".to_string()));

        assert_eq!(
            get(&router, "/my%20page.html"),
            (StatusCode::OK, "spaced /my page.html".to_string())
        );
        assert_eq!(get(&router, "/caf%C3%A9.html"), (StatusCode::OK, "menu".to_string()));
    }
}
