//! HTTP API layer.
//!
//! This module contains thin handlers that delegate to the receiver facade
//! and the services. It provides the router construction and server startup
//! functionality.

use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::bootstrap::BootstrappedServices;
use crate::eiscp::ReceiverClient;
use crate::state::Config;

pub mod http;
pub mod response;

/// Errors that can occur when starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to a TCP port.
    #[error("Failed to bind to port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// The server stopped with an I/O error.
    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Shared application state for the API layer.
///
/// This is a thin wrapper that holds references to services.
#[derive(Clone)]
pub struct AppState {
    /// Receiver client for all device operations.
    pub receiver: Arc<dyn ReceiverClient>,
    /// Application configuration (profiles, ports).
    pub config: Arc<RwLock<Config>>,
}

impl AppState {
    pub fn new(receiver: Arc<dyn ReceiverClient>, config: Config) -> Self {
        Self {
            receiver,
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// Builds the state from bootstrapped services.
    pub fn from_services(services: &BootstrappedServices, config: Config) -> Self {
        Self::new(Arc::clone(&services.receiver), config)
    }
}

/// Starts the HTTP server on the configured port.
///
/// Runs until `shutdown` resolves, then finishes in-flight requests.
pub async fn start_server<F>(state: AppState, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let port = state.config.read().bind_port;
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind { port, source })?;

    log::info!("Server listening on http://{}", addr);
    let app = http::create_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
