//! Trait abstractions for receiver operations.
//!
//! These traits enable dependency injection for testability and modularity.
//! The API layer depends on [`ReceiverClient`] rather than on a concrete
//! session, and the facade depends on [`CommandTransport`].

use async_trait::async_trait;

use super::command::InputSelector;
use super::session::Session;
use crate::error::EiscpResult;

/// Raw command exchange with a receiver.
#[async_trait]
pub trait CommandTransport: Send + Sync {
    /// Sends an ISCP command without waiting for a response.
    async fn send(&self, command: &str) -> EiscpResult<()>;

    /// Sends an ISCP command and returns the next decoded response.
    async fn send_and_await(&self, command: &str) -> EiscpResult<String>;
}

#[async_trait]
impl CommandTransport for Session {
    async fn send(&self, command: &str) -> EiscpResult<()> {
        Session::send(self, command).await
    }

    async fn send_and_await(&self, command: &str) -> EiscpResult<String> {
        Session::send_and_await(self, command).await
    }
}

/// Power and front panel control.
#[async_trait]
pub trait PowerControl: Send + Sync {
    async fn power_on(&self) -> EiscpResult<()>;

    async fn power_off(&self) -> EiscpResult<()>;

    /// Returns `true` if the receiver reports it is on.
    async fn query_power(&self) -> EiscpResult<bool>;

    /// Toggles power and returns the new state.
    async fn switch_power(&self) -> EiscpResult<bool>;

    /// Sets the display dimmer (0 bright, 1 dim, 2 dark).
    async fn set_dimmer(&self, level: i32) -> EiscpResult<()>;
}

/// Master volume control.
#[async_trait]
pub trait VolumeControl: Send + Sync {
    async fn volume_up(&self) -> EiscpResult<()>;

    async fn volume_down(&self) -> EiscpResult<()>;

    /// Sets the master volume (0-50).
    async fn set_volume(&self, level: i32) -> EiscpResult<()>;

    async fn query_volume(&self) -> EiscpResult<u8>;
}

/// Subwoofer trim control.
#[async_trait]
pub trait SubwooferControl: Send + Sync {
    async fn subwoofer_up(&self) -> EiscpResult<()>;

    async fn subwoofer_down(&self) -> EiscpResult<()>;

    /// Sets the subwoofer trim (-8..=8).
    async fn set_subwoofer_level(&self, level: i32) -> EiscpResult<()>;

    async fn query_subwoofer_level(&self) -> EiscpResult<i8>;
}

/// Input selector control.
#[async_trait]
pub trait InputControl: Send + Sync {
    /// Selects an input by symbolic name (`tv`, `dj`, `vinyl`, `spotify`).
    async fn set_input_selector(&self, name: &str) -> EiscpResult<()>;

    async fn query_input_selector(&self) -> EiscpResult<InputSelector>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Combined Traits (for trait objects)
// ─────────────────────────────────────────────────────────────────────────────

/// Combined trait for all receiver operations.
///
/// Used by `AppState` to provide a unified client for the API handlers.
pub trait ReceiverClient: PowerControl + VolumeControl + SubwooferControl + InputControl {}

/// Blanket implementation for any type implementing all traits.
impl<T: PowerControl + VolumeControl + SubwooferControl + InputControl> ReceiverClient for T {}
