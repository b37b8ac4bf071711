use std::net::SocketAddr;

use axum::Router;
use banana_config::Config;
use tower_http::trace::TraceLayer;

/// Assembled HTTP server
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the dispatcher cannot be initialized
    pub fn new(config: &Config, listen_override: Option<SocketAddr>) -> anyhow::Result<Self> {
        let listen_address = listen_override.unwrap_or(config.server.listen_address);
        let dispatcher = banana_imagegen::build_dispatcher(config)?;

        tracing::info!(
            modes = ?dispatcher.modes().collect::<Vec<_>>(),
            "image generation providers ready"
        );

        let router = banana_imagegen::endpoint_router()
            .with_state(dispatcher)
            .layer(TraceLayer::new_for_http());

        Ok(Self { router, listen_address })
    }

    /// Serve until `shutdown` is cancelled
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}
