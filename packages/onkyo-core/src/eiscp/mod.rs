//! eISCP client for Onkyo/Integra receivers.
//!
//! # Module Structure
//!
//! - `packet` - eISCP frame encoding and decoding
//! - `command` - ISCP command vocabulary and response parsing
//! - `session` - Persistent TCP session with background reader
//! - `traits` - Trait abstractions for testability
//! - `client` - `OnkyoClient` receiver facade

pub mod client;
pub mod command;
pub mod packet;
pub mod session;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_fixtures;

// Re-export domain types
pub use command::{Command, DimmerLevel, Direction, InputSelector, SubwooferLevel, VolumeLevel};

// Re-export trait abstractions
pub use traits::{
    CommandTransport, InputControl, PowerControl, ReceiverClient, SubwooferControl, VolumeControl,
};

// Re-export concrete implementations
pub use client::OnkyoClient;
pub use session::{Session, SessionConfig};
