// ── Parameter identity and values ──
//
// ParameterId names one controller attribute; ParameterValue is what a
// response frame carries for it. The value width on the wire depends on
// the id, see `ValueWidth::for_response_id`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use thiserror::Error;

// ── ParameterId ─────────────────────────────────────────────────────

/// 16-bit identifier of one controller attribute.
///
/// Ids whose high byte is zero travel as a single byte in requests; the
/// rest use the `0xFF <high>` extension prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterId(u16);

impl ParameterId {
    /// Unit on/off state.
    pub const POWER: Self = Self(0x0001);
    /// Selected ventilation speed stage.
    pub const SPEED_STAGE: Self = Self(0x0002);
    /// Boost mode on/off.
    pub const BOOST: Self = Self(0x0006);
    /// Humidity set point (%).
    pub const HUMIDITY_SETPOINT: Self = Self(0x0019);
    /// Measured humidity (%).
    pub const HUMIDITY: Self = Self(0x0025);
    /// Fan 1 speed (rpm), 2 bytes little-endian.
    pub const FAN1_SPEED: Self = Self(0x004A);
    /// Fan 2 speed (rpm), 2 bytes little-endian.
    pub const FAN2_SPEED: Self = Self(0x004B);
    /// Filter replacement countdown, 3 raw bytes.
    pub const FILTER_TIMER: Self = Self(0x0064);
    /// Operating mode (ventilation, heat recovery, supply air).
    pub const OPERATING_MODE: Self = Self(0x00B7);

    /// The parameters polled when nothing else is configured.
    pub const DEFAULTS: [Self; 8] = [
        Self::POWER,
        Self::SPEED_STAGE,
        Self::BOOST,
        Self::HUMIDITY_SETPOINT,
        Self::HUMIDITY,
        Self::FAN1_SPEED,
        Self::FAN2_SPEED,
        Self::OPERATING_MODE,
    ];

    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u16 {
        self.0
    }

    pub const fn high_byte(self) -> u8 {
        self.0.to_be_bytes()[0]
    }

    pub const fn low_byte(self) -> u8 {
        self.0.to_be_bytes()[1]
    }

    /// `true` when the id needs the extension prefix in a request.
    pub const fn is_extended(self) -> bool {
        self.high_byte() != 0
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

/// Failure to parse a [`ParameterId`] from text.
#[derive(Debug, Error)]
#[error("invalid parameter id '{input}': {source}")]
pub struct ParseParameterIdError {
    input: String,
    #[source]
    source: ParseIntError,
}

impl FromStr for ParameterId {
    type Err = ParseParameterIdError;

    /// Accepts decimal (`74`) or hex with a `0x` prefix (`0x004A`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => u16::from_str_radix(hex, 16),
            None => trimmed.parse::<u16>(),
        };
        parsed.map(Self).map_err(|source| ParseParameterIdError {
            input: s.to_owned(),
            source,
        })
    }
}

impl From<u16> for ParameterId {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<u8> for ParameterId {
    fn from(raw: u8) -> Self {
        Self(u16::from(raw))
    }
}

// ── ValueWidth ──────────────────────────────────────────────────────

/// How many bytes follow an id inside a response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueWidth {
    /// Plain 1-byte integer.
    Byte,
    /// 2-byte little-endian integer (fan speeds).
    Word,
    /// 3 opaque bytes (filter timer).
    Triple,
}

impl ValueWidth {
    /// Width rule for the 1-byte ids found in response frames.
    pub const fn for_response_id(id: u8) -> Self {
        match id {
            0x64 => Self::Triple,
            0x4A | 0x4B => Self::Word,
            _ => Self::Byte,
        }
    }

    pub const fn len(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
            Self::Triple => 3,
        }
    }

    /// Decode a value from exactly `self.len()` bytes.
    ///
    /// Returns `None` when `raw` has the wrong length.
    pub fn decode(self, raw: &[u8]) -> Option<ParameterValue> {
        match (self, raw) {
            (Self::Byte, [v]) => Some(ParameterValue::Number(u16::from(*v))),
            (Self::Word, [lo, hi]) => Some(ParameterValue::Number(u16::from_le_bytes([*lo, *hi]))),
            (Self::Triple, [a, b, c]) => Some(ParameterValue::Triple([*a, *b, *c])),
            _ => None,
        }
    }
}

// ── ParameterValue ──────────────────────────────────────────────────

/// Decoded value of one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    /// 1- or 2-byte unsigned integer.
    Number(u16),
    /// 3-byte tuple, kept as received.
    Triple([u8; 3]),
}

impl ParameterValue {
    pub fn as_number(&self) -> Option<u16> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Triple(_) => None,
        }
    }

    pub fn as_triple(&self) -> Option<[u8; 3]> {
        match self {
            Self::Triple(t) => Some(*t),
            Self::Number(_) => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Triple([a, b, c]) => write!(f, "({a}, {b}, {c})"),
        }
    }
}
