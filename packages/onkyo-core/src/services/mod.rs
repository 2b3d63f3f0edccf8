//! Service layer.
//!
//! Shared operations composed from several receiver commands, used by both
//! the HTTP API and the CLI.

pub mod profiles;

pub use profiles::{apply_profile, device_info, DeviceInfo, Profile};
