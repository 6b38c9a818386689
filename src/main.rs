use std::path::PathBuf;
use std::sync::Arc;

use hyper::StatusCode;
use routekit::config::Config;
use routekit::{logger, respond, server, Cookie, Router, Session};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg.logging)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    let router = Arc::new(build_router(&cfg));
    runtime.block_on(server::run(router, &cfg))
}

fn build_router(cfg: &Config) -> Router {
    let router = Router::new();

    if let Some(ref dir) = cfg.assets.static_dir {
        router.configure_static(dir);
        router.enable_static(cfg.static_policy());
    }

    let report = router.register_templates(&cfg.assets.templates);
    if !report.is_clean() {
        logger::log_warning(&format!(
            "{} template(s) skipped, {} registered",
            report.errors.len(),
            report.routes.len()
        ));
    }

    register_demo_routes(&router);
    router
}

fn register_demo_routes(router: &Router) {
    router.get("/hello", |w, _| w.write_body(b"hi"));

    router.get("/status", |w, req| {
        respond::json(
            w,
            StatusCode::OK,
            &json!({ "status": "ok", "path": req.uri().path() }),
        );
    });

    router.get("/home", |w, req| respond::redirect(w, req, "hello"));

    router.post("/upload", |w, req| {
        let dest = upload_path();
        match routekit::save_uploaded_file(&mut &req.body()[..], &dest) {
            Ok(written) => respond::json(w, StatusCode::CREATED, &json!({ "bytes": written })),
            Err(e) => routekit::http::error(w, StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
        }
    });

    let manager = router.cookie_manager();
    router.get("/visit", move |w, req| {
        let mut session = Session::new(
            manager
                .get_cookie(req, "visits")
                .unwrap_or_else(|_| Cookie::new("visits", "0")),
        );
        let visits = session.get("visits").parse::<u64>().unwrap_or(0) + 1;
        session.set("visits", visits.to_string());

        let mut cookie = session.into_cookie();
        cookie.path = "/".to_string();
        cookie.http_only = true;
        manager.set_cookie(w, &cookie);
        w.write_body(format!("visit #{visits}\n").as_bytes());
    });
}

fn upload_path() -> PathBuf {
    std::env::temp_dir().join("routekit-upload.bin")
}
