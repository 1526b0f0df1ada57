//! Shift codes and their fixed clock times.
//!
//! Every roster cell is classified into a [`ShiftCell`]: a known
//! [`ShiftCode`], the "off" sentinel (`X` or an empty cell), or an unknown
//! token. Only known codes have clock times.
//!
//! All shifts start and end on the same calendar day, so callers combine
//! the returned [`NaiveTime`] with the roster date directly.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// The roster token meaning "no shift on this day".
pub const OFF_SENTINEL: &str = "X";

/// A shift type with fixed start and end times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftCode {
    K00,
    K01,
    K02,
    K03,
    K04,
    SK1,
    SK2,
    DK1,
    DK2,
    DK3,
}

impl ShiftCode {
    /// All shift codes in table order.
    pub const ALL: [ShiftCode; 10] = [
        Self::K00,
        Self::K01,
        Self::K02,
        Self::K03,
        Self::K04,
        Self::SK1,
        Self::SK2,
        Self::DK1,
        Self::DK2,
        Self::DK3,
    ];

    /// Returns the roster token for this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::K00 => "K00",
            Self::K01 => "K01",
            Self::K02 => "K02",
            Self::K03 => "K03",
            Self::K04 => "K04",
            Self::SK1 => "SK1",
            Self::SK2 => "SK2",
            Self::DK1 => "DK1",
            Self::DK2 => "DK2",
            Self::DK3 => "DK3",
        }
    }

    /// Returns the `(start, end)` clock times of this shift.
    pub fn times(&self) -> (NaiveTime, NaiveTime) {
        let (start, end) = match self {
            Self::K00 => ((3, 15), (11, 0)),
            Self::K01 => ((3, 15), (12, 15)),
            Self::K02 => ((4, 0), (13, 15)),
            Self::K03 => ((6, 0), (15, 15)),
            Self::K04 => ((7, 0), (16, 15)),
            Self::SK1 => ((2, 15), (11, 15)),
            Self::SK2 => ((3, 0), (12, 0)),
            Self::DK1 => ((1, 30), (9, 0)),
            Self::DK2 => ((2, 0), (9, 0)),
            Self::DK3 => ((3, 0), (9, 0)),
        };
        (clock(start), clock(end))
    }

    /// Returns the start clock time of this shift.
    pub fn start_time(&self) -> NaiveTime {
        self.times().0
    }

    /// Returns the end clock time of this shift.
    pub fn end_time(&self) -> NaiveTime {
        self.times().1
    }
}

fn clock((hour, minute): (u32, u32)) -> NaiveTime {
    // The table above only holds valid wall-clock times.
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

impl fmt::Display for ShiftCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a token is not a known shift code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown shift code '{0}'")]
pub struct UnknownShiftCode(pub String);

impl FromStr for ShiftCode {
    type Err = UnknownShiftCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| UnknownShiftCode(s.to_string()))
    }
}

/// Classification of a single roster cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShiftCell {
    /// No shift: the `X` sentinel or an empty cell.
    Off,
    /// A known shift code.
    Code(ShiftCode),
    /// A non-empty token outside the code table.
    Unknown(String),
}

impl ShiftCell {
    /// Classifies a raw cell value.
    pub fn classify(value: Option<&str>) -> Self {
        let token = value.map(str::trim).unwrap_or_default();
        if token.is_empty() || token == OFF_SENTINEL {
            return Self::Off;
        }
        match token.parse::<ShiftCode>() {
            Ok(code) => Self::Code(code),
            Err(UnknownShiftCode(token)) => Self::Unknown(token),
        }
    }
}

/// Looks up the start time of a shift token.
///
/// Returns `None` for the `X` sentinel and any token outside the table.
pub fn start_time(token: &str) -> Option<NaiveTime> {
    token.parse::<ShiftCode>().ok().map(|c| c.start_time())
}

/// Looks up the end time of a shift token.
///
/// Returns `None` for the `X` sentinel and any token outside the table.
pub fn end_time(token: &str) -> Option<NaiveTime> {
    token.parse::<ShiftCode>().ok().map(|c| c.end_time())
}
