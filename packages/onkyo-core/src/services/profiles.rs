//! Listening profiles.
//!
//! A profile bundles an input with the volume and subwoofer presets that
//! suit it, plus a volume ceiling advertised to clients (e.g. a watch app
//! that renders a volume slider).

use serde::{Deserialize, Serialize};

use crate::eiscp::{InputSelector, ReceiverClient, SubwooferLevel, VolumeLevel};
use crate::error::{EiscpError, EiscpResult};
use crate::protocol_constants::MAX_VOLUME;

/// Presets applied when switching to an input.
///
/// The profile name is also the symbolic input it selects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(rename = "profile")]
    pub name: String,
    pub volume_level: i32,
    pub subwoofer_level: i32,
    pub max_volume: i32,
}

impl Profile {
    pub fn new(name: &str, volume_level: i32, subwoofer_level: i32, max_volume: i32) -> Self {
        Self {
            name: name.to_string(),
            volume_level,
            subwoofer_level,
            max_volume,
        }
    }

    /// Checks every preset against the receiver's ranges.
    pub fn validate(&self) -> EiscpResult<(InputSelector, VolumeLevel, SubwooferLevel)> {
        let input: InputSelector = self.name.parse()?;
        let volume = VolumeLevel::new(self.volume_level)?;
        let subwoofer = SubwooferLevel::new(self.subwoofer_level)?;
        VolumeLevel::new(self.max_volume)?;
        if self.volume_level > self.max_volume {
            return Err(EiscpError::validation(format!(
                "profile '{}' volume {} exceeds its max volume {}",
                self.name, self.volume_level, self.max_volume
            )));
        }
        Ok((input, volume, subwoofer))
    }
}

/// The profile table shipped with the server.
pub fn default_profiles() -> Vec<Profile> {
    vec![
        Profile::new("tv", 20, 0, 28),
        Profile::new("dj", 27, -8, 35),
        Profile::new("vinyl", 20, 0, 30),
        Profile::new("spotify", 38, -6, 50),
    ]
}

/// Finds a profile by name (case-insensitive).
pub fn find<'a>(profiles: &'a [Profile], name: &str) -> Option<&'a Profile> {
    profiles
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
}

/// Live receiver state, shaped like a [`Profile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub profile: String,
    pub volume_level: i32,
    pub subwoofer_level: i32,
    pub max_volume: i32,
}

/// Powers the receiver on and applies a profile's presets.
///
/// All presets are validated before the first command is sent.
pub async fn apply_profile(receiver: &dyn ReceiverClient, profile: &Profile) -> EiscpResult<()> {
    let (input, volume, subwoofer) = profile.validate()?;

    log::info!(
        "[Profile] Applying '{}' (volume {}, subwoofer {})",
        profile.name,
        volume.value(),
        subwoofer.value()
    );

    receiver.power_on().await?;
    receiver.set_volume(volume.value().into()).await?;
    receiver.set_subwoofer_level(subwoofer.value().into()).await?;
    receiver.set_input_selector(input.name()).await?;
    Ok(())
}

/// Queries the receiver's current input, volume and subwoofer level.
///
/// `max_volume` comes from the profile named after the current input, or
/// the receiver maximum if no such profile is configured.
pub async fn device_info(
    receiver: &dyn ReceiverClient,
    profiles: &[Profile],
) -> EiscpResult<DeviceInfo> {
    let input = receiver.query_input_selector().await?;
    let volume = receiver.query_volume().await?;
    let subwoofer = receiver.query_subwoofer_level().await?;

    let max_volume = find(profiles, input.name())
        .map(|p| p.max_volume)
        .unwrap_or(MAX_VOLUME.into());

    Ok(DeviceInfo {
        profile: input.name().to_string(),
        volume_level: volume.into(),
        subwoofer_level: subwoofer.into(),
        max_volume,
    })
}

/// Returns the profile for the current input, filled with live levels.
///
/// Fails with a validation error if the current input has no configured
/// profile.
pub async fn current_profile(
    receiver: &dyn ReceiverClient,
    profiles: &[Profile],
) -> EiscpResult<Profile> {
    let input = receiver.query_input_selector().await?;
    let volume = receiver.query_volume().await?;
    let subwoofer = receiver.query_subwoofer_level().await?;

    let preset = find(profiles, input.name())
        .ok_or_else(|| EiscpError::validation(format!("no profile for input '{}'", input)))?;

    Ok(Profile {
        name: input.name().to_string(),
        volume_level: volume.into(),
        subwoofer_level: subwoofer.into(),
        max_volume: preset.max_volume,
    })
}
