// Server module entry point
// Binds the listener and runs the accept loop until shutdown

pub mod connection;
pub mod listener;

pub use connection::ConnectionSettings;
pub use listener::create_reusable_listener;

use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::logger;
use crate::router::Router;

/// Bind the configured address and serve `router` until Ctrl-C
pub async fn run(router: Arc<Router>, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.get_socket_addr()?;
    let listener = create_reusable_listener(addr)?;

    logger::log_server_start(&addr, config);
    for (method, path) in router.routes() {
        logger::log_info(&format!("Route: {method} {path}"));
    }

    let settings = Arc::new(ConnectionSettings::from_config(config));
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            logger::log_error(&format!("Failed to listen for shutdown signal: {e}"));
            std::future::pending::<()>().await;
        }
    };

    serve(listener, router, settings, shutdown).await;
    logger::log_info("Shutting down");
    Ok(())
}

/// Accept connections from `listener` until `shutdown` completes.
/// Connections already accepted keep running on their own tasks.
pub async fn serve(
    listener: TcpListener,
    router: Arc<Router>,
    settings: Arc<ConnectionSettings>,
    shutdown: impl Future<Output = ()>,
) {
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr)) => connection::spawn_connection(
                    stream,
                    peer_addr,
                    Arc::clone(&router),
                    Arc::clone(&settings),
                ),
                Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
            },
            () = &mut shutdown => break,
        }
    }
}
