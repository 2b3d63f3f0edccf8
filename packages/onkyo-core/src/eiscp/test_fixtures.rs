//! Shared test doubles for receiver tests.
//!
//! Used by the facade, service and API test modules to avoid duplication.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::client::OnkyoClient;
use super::traits::CommandTransport;
use crate::error::{EiscpError, EiscpResult};

/// Transport that records commands and replays canned responses in order.
///
/// A query with no canned response left fails with a timeout, like a
/// silent receiver.
#[derive(Default)]
pub struct MockTransport {
    sent: Mutex<Vec<String>>,
    responses: Mutex<VecDeque<String>>,
}

impl MockTransport {
    pub fn with_responses(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
        })
    }

    /// Commands received so far, in order.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl CommandTransport for MockTransport {
    async fn send(&self, command: &str) -> EiscpResult<()> {
        self.sent.lock().push(command.to_string());
        Ok(())
    }

    async fn send_and_await(&self, command: &str) -> EiscpResult<String> {
        self.sent.lock().push(command.to_string());
        self.responses
            .lock()
            .pop_front()
            .ok_or(EiscpError::Timeout(Duration::from_secs(2)))
    }
}

/// Builds a facade over a fresh mock transport.
pub fn mock_client(responses: &[&str]) -> (OnkyoClient<MockTransport>, Arc<MockTransport>) {
    let transport = MockTransport::with_responses(responses);
    (OnkyoClient::new(Arc::clone(&transport)), transport)
}
