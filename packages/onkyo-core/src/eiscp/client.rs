//! Receiver facade.
//!
//! [`OnkyoClient`] turns typed receiver operations into ISCP commands and
//! routes them through a [`CommandTransport`]: setters and nudges are sent
//! fire-and-forget, queries wait for the next response. Arguments are
//! validated before the transport is touched.
//!
//! "Set" operations do not power the receiver on. Callers that do not know
//! the power state issue [`PowerControl::power_on`] first.

use std::sync::Arc;

use async_trait::async_trait;

use super::command::{self, Command, Direction, InputSelector};
use super::traits::{
    CommandTransport, InputControl, PowerControl, SubwooferControl, VolumeControl,
};
use crate::error::EiscpResult;

/// Typed operations for an Onkyo/Integra receiver.
pub struct OnkyoClient<T: ?Sized> {
    transport: Arc<T>,
}

impl<T: ?Sized> Clone for OnkyoClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: CommandTransport + ?Sized> OnkyoClient<T> {
    /// Creates a client on top of a shared transport.
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    async fn send(&self, command: Command) -> EiscpResult<()> {
        let iscp = command.iscp();
        log::debug!("[EISCP] send {}", iscp);
        self.transport.send(&iscp).await
    }

    async fn query(&self, command: Command) -> EiscpResult<String> {
        let iscp = command.iscp();
        log::debug!("[EISCP] query {}", iscp);
        self.transport.send_and_await(&iscp).await
    }
}

#[async_trait]
impl<T: CommandTransport + ?Sized> PowerControl for OnkyoClient<T> {
    async fn power_on(&self) -> EiscpResult<()> {
        self.send(Command::PowerOn).await
    }

    async fn power_off(&self) -> EiscpResult<()> {
        self.send(Command::PowerOff).await
    }

    async fn query_power(&self) -> EiscpResult<bool> {
        let response = self.query(Command::QueryPower).await?;
        command::parse_power(&response)
    }

    async fn switch_power(&self) -> EiscpResult<bool> {
        if self.query_power().await? {
            self.power_off().await?;
            Ok(false)
        } else {
            self.power_on().await?;
            Ok(true)
        }
    }

    async fn set_dimmer(&self, level: i32) -> EiscpResult<()> {
        self.send(Command::set_dimmer(level)?).await
    }
}

#[async_trait]
impl<T: CommandTransport + ?Sized> VolumeControl for OnkyoClient<T> {
    async fn volume_up(&self) -> EiscpResult<()> {
        self.send(Command::VolumeStep(Direction::Up)).await
    }

    async fn volume_down(&self) -> EiscpResult<()> {
        self.send(Command::VolumeStep(Direction::Down)).await
    }

    async fn set_volume(&self, level: i32) -> EiscpResult<()> {
        self.send(Command::set_volume(level)?).await
    }

    async fn query_volume(&self) -> EiscpResult<u8> {
        let response = self.query(Command::QueryVolume).await?;
        command::parse_volume(&response)
    }
}

#[async_trait]
impl<T: CommandTransport + ?Sized> SubwooferControl for OnkyoClient<T> {
    async fn subwoofer_up(&self) -> EiscpResult<()> {
        self.send(Command::SubwooferStep(Direction::Up)).await
    }

    async fn subwoofer_down(&self) -> EiscpResult<()> {
        self.send(Command::SubwooferStep(Direction::Down)).await
    }

    async fn set_subwoofer_level(&self, level: i32) -> EiscpResult<()> {
        self.send(Command::set_subwoofer(level)?).await
    }

    async fn query_subwoofer_level(&self) -> EiscpResult<i8> {
        let response = self.query(Command::QuerySubwoofer).await?;
        command::parse_subwoofer(&response)
    }
}

#[async_trait]
impl<T: CommandTransport + ?Sized> InputControl for OnkyoClient<T> {
    async fn set_input_selector(&self, name: &str) -> EiscpResult<()> {
        self.send(Command::set_input(name)?).await
    }

    async fn query_input_selector(&self) -> EiscpResult<InputSelector> {
        let response = self.query(Command::QueryInput).await?;
        command::parse_input(&response)
    }
}
