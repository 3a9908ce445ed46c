#![recursion_limit = "512"]

pub mod api;
pub mod config;
pub mod logic;
pub mod model;
pub mod seed;
pub mod store;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;

// Export API types
pub use api::handlers;
pub use api::routes;

pub use logic::{validate_persona, FieldError, ValidationErrors};
pub use model::*;
pub use store::{InMemoryStore, PersonaStore, PostgresStore, Store, StoreError};

/// How long the store gets to release its connections on shutdown.
pub const STORE_CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Serve the API on `listener` until `shutdown` resolves, then drain in-flight
/// requests.
pub async fn serve<S, F>(
    listener: TcpListener,
    store: Arc<S>,
    config: &config::AppConfig,
    shutdown: F,
) -> anyhow::Result<()>
where
    S: Store + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let app = routes::build_app(store, config.request_timeout());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")
}

/// Release the store, bounded by [`STORE_CLOSE_TIMEOUT`].
pub async fn close_store<S: Store + ?Sized>(store: &S) -> anyhow::Result<()> {
    tokio::time::timeout(STORE_CLOSE_TIMEOUT, store.close())
        .await
        .context("Timed out closing the store connection")
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            log::error!("Unable to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                log::error!("Unable to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("Shutdown signal received");
}
