//! HTTP server setup.
//!
//! # Responsibilities
//! - Wrap the registered route tree in the tracing layer
//! - Bind the listener only after the pipeline has finished
//! - Serve until the shutdown coordinator fires
//!
//! # Design Decisions
//! - The server never sees a partial route tree: it is constructed from a
//!   finished `axum::Router`
//! - Graceful shutdown lets in-flight requests complete

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ListenerConfig;
use crate::lifecycle::Shutdown;

/// HTTP server for the discovered routes.
pub struct HttpServer {
    router: Router,
    config: ListenerConfig,
}

impl HttpServer {
    pub fn new(router: Router, config: ListenerConfig) -> Self {
        let router = router.layer(TraceLayer::new_for_http());
        Self { router, config }
    }

    /// Bind to the configured address.
    pub async fn bind(&self) -> Result<TcpListener, std::io::Error> {
        TcpListener::bind(&self.config.bind_address).await
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let mut stop = shutdown.subscribe();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = stop.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ListenerConfig {
        &self.config
    }
}
