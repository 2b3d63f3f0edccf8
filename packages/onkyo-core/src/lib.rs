//! Onkyo Core - shared library for onkyo-ctl.
//!
//! This crate talks eISCP (ISCP over TCP) to Onkyo/Integra network
//! receivers. It is used by both the standalone HTTP server and the
//! command-line client.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`eiscp`]: Packet codec, command vocabulary, TCP session and receiver facade
//! - [`services`]: Listening profiles built on top of the facade
//! - [`state`]: Core configuration
//! - [`bootstrap`]: Service wiring for the binaries
//! - [`api`]: HTTP API routes
//! - [`error`]: Centralized error types
//!
//! # Abstraction Traits
//!
//! The facade is split into capability traits
//! ([`PowerControl`](eiscp::PowerControl), [`VolumeControl`](eiscp::VolumeControl),
//! [`SubwooferControl`](eiscp::SubwooferControl), [`InputControl`](eiscp::InputControl))
//! combined into [`ReceiverClient`]. It sits on a
//! [`CommandTransport`](eiscp::CommandTransport), implemented by [`Session`].

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod bootstrap;
pub mod eiscp;
pub mod error;
pub mod protocol_constants;
pub mod services;
pub mod state;

// Re-export commonly used types at the crate root
pub use api::{start_server, AppState, ServerError};
pub use bootstrap::{bootstrap_services, BootstrappedServices};
pub use eiscp::{InputSelector, OnkyoClient, ReceiverClient, Session, SessionConfig};
pub use error::{ApiError, ApiResult, EiscpError, EiscpResult, ErrorCode};
pub use services::{DeviceInfo, Profile};
pub use state::Config;
