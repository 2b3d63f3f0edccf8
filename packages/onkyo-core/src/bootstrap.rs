//! Application bootstrap and dependency wiring.
//!
//! This module contains the composition root: the single place where the
//! session and the receiver facade are created and wired together for the
//! server and the CLI.

use std::sync::Arc;

use crate::eiscp::{OnkyoClient, ReceiverClient, Session};
use crate::error::EiscpResult;
use crate::state::Config;

/// Container for all bootstrapped services.
#[derive(Clone)]
pub struct BootstrappedServices {
    /// The live connection to the receiver.
    pub session: Arc<Session>,
    /// Typed receiver operations over `session`.
    pub receiver: Arc<dyn ReceiverClient>,
}

impl BootstrappedServices {
    /// Closes the receiver connection.
    pub async fn shutdown(&self) {
        log::info!("[Bootstrap] Closing receiver session...");
        self.session.close().await;
    }
}

/// Connects to the configured receiver and wires the facade on top.
///
/// Fails fast if the receiver is unreachable.
pub async fn bootstrap_services(config: &Config) -> EiscpResult<BootstrappedServices> {
    let session =
        Arc::new(Session::connect_with(&config.host, config.port, config.session_config()).await?);
    let receiver: Arc<dyn ReceiverClient> = Arc::new(OnkyoClient::new(Arc::clone(&session)));

    Ok(BootstrappedServices { session, receiver })
}
