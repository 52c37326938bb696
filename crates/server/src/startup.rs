use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use configs::AppConfig;
use service::storage::StorageRoot;

use crate::errors::StartupError;
use crate::routes;
use crate::state::ServerState;

const LIMITER_PRUNE_EVERY: Duration = Duration::from_secs(60);

/// A fully initialised server: storage opened, database migrated, socket bound.
pub struct Application {
    listener: TcpListener,
    router: Router,
    state: ServerState,
}

impl Application {
    /// Run every startup step in order. Any failure aborts before serving.
    pub async fn build(config: AppConfig) -> Result<Self, StartupError> {
        let storage = Arc::new(StorageRoot::open(&config.storage.root).await?);

        let db = models::db::connect_with_config(&config.database)
            .await
            .map_err(|e| StartupError::Database(e.to_string()))?;
        models::db::migrate(&db)
            .await
            .map_err(|e| StartupError::Database(e.to_string()))?;

        let listener = bind_listener(&config.server.host, config.server.port).await?;
        let state = ServerState::new(db, config, storage);
        let router = routes::build_router(state.clone());
        Ok(Self { listener, router, state })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, StartupError> {
        self.listener.local_addr().map_err(StartupError::Serve)
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn serve_until<F>(self, shutdown: F) -> Result<(), StartupError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let limiter = self.state.me_limiter.clone();
        let pruner = tokio::spawn(async move {
            let mut tick = tokio::time::interval(LIMITER_PRUNE_EVERY);
            loop {
                tick.tick().await;
                limiter.prune();
            }
        });

        let served = axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(StartupError::Serve);
        pruner.abort();
        served
    }
}

/// Bind the listening socket; an occupied port is a startup error, never retried.
pub async fn bind_listener(host: &str, port: u16) -> Result<TcpListener, StartupError> {
    let addr = format!("{host}:{port}");
    match TcpListener::bind(addr.as_str()).await {
        Ok(listener) => Ok(listener),
        Err(source) => Err(StartupError::Bind { addr, source }),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
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
    info!(event = "shutdown_signal", "shutting down gracefully");
}

/// Public entry: build the app and serve until Ctrl+C or SIGTERM.
pub async fn run(config: AppConfig) -> Result<(), StartupError> {
    let app = Application::build(config).await?;
    let addr = app.local_addr()?;
    info!(%addr, storage = %app.state().storage.path().display(), "contacts api listening");
    app.serve_until(shutdown_signal()).await
}
