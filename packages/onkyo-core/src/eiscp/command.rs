//! ISCP command vocabulary.
//!
//! Pure encoding and decoding between typed receiver operations and the
//! ASCII commands carried inside eISCP frames. Nothing here performs I/O:
//! out-of-range values and unknown input names are rejected while building
//! a [`Command`], before a session is ever touched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EiscpError, EiscpResult};
use crate::protocol_constants::{
    MAX_DIMMER_LEVEL, MAX_SUBWOOFER_LEVEL, MAX_VOLUME, MIN_SUBWOOFER_LEVEL,
};

const POWER: &str = "PWR";
const MASTER_VOLUME: &str = "MVL";
const SUBWOOFER: &str = "SWL";
const INPUT_SELECTOR: &str = "SLI";
const DIMMER: &str = "DIM";

const QUERY: &str = "QSTN";

// ─────────────────────────────────────────────────────────────────────────────
// Argument Types
// ─────────────────────────────────────────────────────────────────────────────

/// Master volume level, validated to `0..=50`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VolumeLevel(u8);

impl VolumeLevel {
    pub fn new(level: i32) -> EiscpResult<Self> {
        match u8::try_from(level) {
            Ok(v) if v <= MAX_VOLUME => Ok(Self(v)),
            _ => Err(EiscpError::validation(format!(
                "volume level {} must be between 0 and {}",
                level, MAX_VOLUME
            ))),
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

/// Subwoofer trim level, validated to `-8..=8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubwooferLevel(i8);

impl SubwooferLevel {
    pub fn new(level: i32) -> EiscpResult<Self> {
        match i8::try_from(level) {
            Ok(v) if (MIN_SUBWOOFER_LEVEL..=MAX_SUBWOOFER_LEVEL).contains(&v) => Ok(Self(v)),
            _ => Err(EiscpError::validation(format!(
                "subwoofer level {} must be between {} and {}",
                level, MIN_SUBWOOFER_LEVEL, MAX_SUBWOOFER_LEVEL
            ))),
        }
    }

    #[must_use]
    pub fn value(self) -> i8 {
        self.0
    }
}

/// Front panel dimmer level: 0 (bright), 1 (dim), 2 (dark).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DimmerLevel(u8);

impl DimmerLevel {
    pub fn new(level: i32) -> EiscpResult<Self> {
        match u8::try_from(level) {
            Ok(v) if v <= MAX_DIMMER_LEVEL => Ok(Self(v)),
            _ => Err(EiscpError::validation(format!(
                "brightness level {} must be between 0 and {}",
                level, MAX_DIMMER_LEVEL
            ))),
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

/// Relative adjustment for volume and subwoofer trim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    fn as_arg(self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
        }
    }
}

/// Inputs wired to the receiver, keyed by the names users know them by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputSelector {
    Tv,
    Dj,
    Vinyl,
    Spotify,
}

impl InputSelector {
    /// All inputs in the table, in display order.
    #[must_use]
    pub fn all() -> &'static [InputSelector] {
        &[Self::Tv, Self::Spotify, Self::Dj, Self::Vinyl]
    }

    /// Two-digit `SLI` code for this input.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Tv => "12",
            Self::Dj => "10",
            Self::Vinyl => "22",
            Self::Spotify => "01",
        }
    }

    /// Symbolic name used by the API and CLI.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Tv => "tv",
            Self::Dj => "dj",
            Self::Vinyl => "vinyl",
            Self::Spotify => "spotify",
        }
    }

    /// Looks up an input by its `SLI` code.
    pub fn from_code(code: &str) -> EiscpResult<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|input| input.code() == code)
            .ok_or_else(|| EiscpError::validation(format!("unknown input code '{}'", code)))
    }
}

impl FromStr for InputSelector {
    type Err = EiscpError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let wanted = name.trim();
        Self::all()
            .iter()
            .copied()
            .find(|input| input.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| EiscpError::validation(format!("invalid input selector '{}'", name)))
    }
}

impl fmt::Display for InputSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// A receiver command. `Display` renders the ISCP string sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    PowerOn,
    PowerOff,
    QueryPower,
    Volume(VolumeLevel),
    VolumeStep(Direction),
    QueryVolume,
    Subwoofer(SubwooferLevel),
    SubwooferStep(Direction),
    QuerySubwoofer,
    Input(InputSelector),
    QueryInput,
    Dimmer(DimmerLevel),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PowerOn => write!(f, "{POWER}01"),
            Self::PowerOff => write!(f, "{POWER}00"),
            Self::QueryPower => write!(f, "{POWER}{QUERY}"),
            Self::Volume(level) => write!(f, "{MASTER_VOLUME}{:02X}", level.value()),
            Self::VolumeStep(dir) => write!(f, "{MASTER_VOLUME}{}", dir.as_arg()),
            Self::QueryVolume => write!(f, "{MASTER_VOLUME}{QUERY}"),
            Self::Subwoofer(level) => {
                let v = level.value();
                let sign = if v >= 0 { '+' } else { '-' };
                write!(f, "{SUBWOOFER}{}{:02}", sign, v.unsigned_abs())
            }
            Self::SubwooferStep(dir) => write!(f, "{SUBWOOFER}{}", dir.as_arg()),
            Self::QuerySubwoofer => write!(f, "{SUBWOOFER}{QUERY}"),
            Self::Input(input) => write!(f, "{INPUT_SELECTOR}{}", input.code()),
            Self::QueryInput => write!(f, "{INPUT_SELECTOR}{QUERY}"),
            Self::Dimmer(level) => write!(f, "{DIMMER}{:02}", level.value()),
        }
    }
}

impl Command {
    /// Builds a `set volume` command, validating the level.
    pub fn set_volume(level: i32) -> EiscpResult<Self> {
        VolumeLevel::new(level).map(Self::Volume)
    }

    /// Builds a `set subwoofer` command, validating the level.
    pub fn set_subwoofer(level: i32) -> EiscpResult<Self> {
        SubwooferLevel::new(level).map(Self::Subwoofer)
    }

    /// Builds a `select input` command from a symbolic name.
    pub fn set_input(name: &str) -> EiscpResult<Self> {
        name.parse().map(Self::Input)
    }

    /// Builds a `dimmer` command, validating the level.
    pub fn set_dimmer(level: i32) -> EiscpResult<Self> {
        DimmerLevel::new(level).map(Self::Dimmer)
    }

    /// Renders the ISCP string for this command.
    #[must_use]
    pub fn iscp(&self) -> String {
        self.to_string()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Response Parsing
// ─────────────────────────────────────────────────────────────────────────────

/// Parses a `PWR` response into the power state (`true` = on).
pub fn parse_power(response: &str) -> EiscpResult<bool> {
    match response.strip_prefix(POWER).unwrap_or(response) {
        "01" => Ok(true),
        "00" => Ok(false),
        other => Err(EiscpError::transport(format!(
            "failed to parse power response '{}'",
            other
        ))),
    }
}

/// Parses an `MVL` response (hexadecimal level).
pub fn parse_volume(response: &str) -> EiscpResult<u8> {
    let hex = response.strip_prefix(MASTER_VOLUME).unwrap_or(response);
    u8::from_str_radix(hex, 16).map_err(|_| {
        EiscpError::transport(format!("failed to parse volume response '{}'", response))
    })
}

/// Parses an `SWL` response (signed decimal level, optional unit suffix).
pub fn parse_subwoofer(response: &str) -> EiscpResult<i8> {
    let level = response.strip_prefix(SUBWOOFER).unwrap_or(response);
    let level = match level.as_bytes().last() {
        Some(b) if b.is_ascii_alphabetic() => &level[..level.len() - 1],
        _ => level,
    };
    level.parse().map_err(|_| {
        EiscpError::transport(format!("failed to parse subwoofer response '{}'", response))
    })
}

/// Parses an `SLI` response into the matching input.
pub fn parse_input(response: &str) -> EiscpResult<InputSelector> {
    let code = response.strip_prefix(INPUT_SELECTOR).unwrap_or(response);
    InputSelector::from_code(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_commands() {
        assert_eq!(Command::PowerOn.iscp(), "PWR01");
        assert_eq!(Command::PowerOff.iscp(), "PWR00");
        assert_eq!(Command::QueryPower.iscp(), "PWRQSTN");
    }

    #[test]
    fn volume_encodes_as_uppercase_hex() {
        assert_eq!(Command::set_volume(32).unwrap().iscp(), "MVL20");
        assert_eq!(Command::set_volume(0).unwrap().iscp(), "MVL00");
        assert_eq!(Command::set_volume(10).unwrap().iscp(), "MVL0A");
        assert_eq!(Command::set_volume(50).unwrap().iscp(), "MVL32");
    }

    #[test]
    fn volume_round_trips_through_response_parser() {
        for v in 0..=50 {
            let encoded = Command::set_volume(v).unwrap().iscp();
            assert_eq!(parse_volume(&encoded).unwrap() as i32, v);
        }
    }

    #[test]
    fn volume_out_of_range_is_validation_error() {
        for v in [-1, 51, 255, 1000] {
            let err = Command::set_volume(v).unwrap_err();
            assert!(err.is_validation(), "{v}: {err}");
        }
    }

    #[test]
    fn volume_steps_and_query() {
        assert_eq!(Command::VolumeStep(Direction::Up).iscp(), "MVLUP");
        assert_eq!(Command::VolumeStep(Direction::Down).iscp(), "MVLDOWN");
        assert_eq!(Command::QueryVolume.iscp(), "MVLQSTN");
    }

    #[test]
    fn subwoofer_sign_prefixed_encoding() {
        assert_eq!(Command::set_subwoofer(-8).unwrap().iscp(), "SWL-08");
        assert_eq!(Command::set_subwoofer(8).unwrap().iscp(), "SWL+08");
        assert_eq!(Command::set_subwoofer(0).unwrap().iscp(), "SWL+00");
        assert_eq!(Command::set_subwoofer(-3).unwrap().iscp(), "SWL-03");
    }

    #[test]
    fn subwoofer_round_trips_through_response_parser() {
        for v in -8..=8 {
            let encoded = Command::set_subwoofer(v).unwrap().iscp();
            assert_eq!(parse_subwoofer(&encoded).unwrap() as i32, v);
        }
    }

    #[test]
    fn subwoofer_out_of_range_is_validation_error() {
        assert!(Command::set_subwoofer(-9).unwrap_err().is_validation());
        assert!(Command::set_subwoofer(9).unwrap_err().is_validation());
    }

    #[test]
    fn subwoofer_parser_drops_unit_suffix() {
        assert_eq!(parse_subwoofer("SWL-06C").unwrap(), -6);
        assert_eq!(parse_subwoofer("SWL+02").unwrap(), 2);
    }

    #[test]
    fn subwoofer_parser_rejects_garbage() {
        assert!(matches!(
            parse_subwoofer("SWLN/A"),
            Err(EiscpError::Transport(_))
        ));
    }

    #[test]
    fn input_table_is_a_bijection() {
        let expected = [
            ("tv", "12"),
            ("dj", "10"),
            ("vinyl", "22"),
            ("spotify", "01"),
        ];
        for (name, code) in expected {
            let input: InputSelector = name.parse().unwrap();
            assert_eq!(input.code(), code);
            assert_eq!(InputSelector::from_code(code).unwrap(), input);
            assert_eq!(input.name(), name);
        }
        assert_eq!(InputSelector::all().len(), expected.len());
    }

    #[test]
    fn input_encoding_and_parsing() {
        assert_eq!(Command::set_input("spotify").unwrap().iscp(), "SLI01");
        assert_eq!(Command::set_input("TV").unwrap().iscp(), "SLI12");
        assert_eq!(Command::QueryInput.iscp(), "SLIQSTN");
        assert_eq!(parse_input("SLI01").unwrap(), InputSelector::Spotify);
    }

    #[test]
    fn unknown_input_code_is_validation_error() {
        assert!(parse_input("SLI99").unwrap_err().is_validation());
    }

    #[test]
    fn unknown_input_name_is_validation_error() {
        assert!(Command::set_input("radio").unwrap_err().is_validation());
        assert!(Command::set_input("").unwrap_err().is_validation());
    }

    #[test]
    fn power_response_parsing() {
        assert!(parse_power("PWR01").unwrap());
        assert!(!parse_power("PWR00").unwrap());
        assert!(matches!(parse_power("PWRN/A"), Err(EiscpError::Transport(_))));
    }

    #[test]
    fn volume_parser_rejects_garbage() {
        assert!(matches!(
            parse_volume("MVLN/A"),
            Err(EiscpError::Transport(_))
        ));
    }

    #[test]
    fn dimmer_levels() {
        assert_eq!(Command::set_dimmer(0).unwrap().iscp(), "DIM00");
        assert_eq!(Command::set_dimmer(2).unwrap().iscp(), "DIM02");
        assert!(Command::set_dimmer(3).unwrap_err().is_validation());
        assert!(Command::set_dimmer(-1).unwrap_err().is_validation());
    }
}
