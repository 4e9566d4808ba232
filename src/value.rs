//! The four-valued logic algebra.
//!
//! Everything in this module is a pure function over [`LogicValue`]. The
//! multi-driver rule [`resolve_drivers`] is the canonical combination used
//! wherever several sources feed one point; bus-specific arbitration lives
//! in [`crate::resolver`].

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::DomainError;

/// A single-bit signal level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicValue {
    /// Driven low
    #[default]
    Low,
    /// Driven high
    High,
    /// Undriven / floating
    HighZ,
    /// Conflicting drivers or indeterminate
    Unknown,
}

impl LogicValue {
    /// All four values, in declaration order.
    pub const ALL: [LogicValue; 4] = [
        LogicValue::Low,
        LogicValue::High,
        LogicValue::HighZ,
        LogicValue::Unknown,
    ];

    /// Maps a boolean onto a driven level.
    pub fn from_bool(b: bool) -> Self {
        if b {
            LogicValue::High
        } else {
            LogicValue::Low
        }
    }

    /// Returns the boolean for a driven level, `None` otherwise.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            LogicValue::Low => Some(false),
            LogicValue::High => Some(true),
            LogicValue::HighZ | LogicValue::Unknown => None,
        }
    }

    /// True for `Low` and `High`.
    pub fn is_defined(self) -> bool {
        matches!(self, LogicValue::Low | LogicValue::High)
    }

    /// The reserved character for this value: `0`, `1`, `z` or `x`.
    pub fn to_char(self) -> char {
        match self {
            LogicValue::Low => '0',
            LogicValue::High => '1',
            LogicValue::HighZ => 'z',
            LogicValue::Unknown => 'x',
        }
    }

    /// Parses one character; case-insensitive for `z` and `x`.
    pub fn from_char(ch: char) -> Result<Self, DomainError> {
        parse_char(ch, 0)
    }
}

impl std::fmt::Display for LogicValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

impl TryFrom<char> for LogicValue {
    type Error = DomainError;

    fn try_from(ch: char) -> Result<Self, Self::Error> {
        LogicValue::from_char(ch)
    }
}

impl FromStr for LogicValue {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Err(DomainError::Empty),
            (Some(ch), None) => parse_char(ch, 0),
            (Some(_), Some(extra)) => Err(DomainError::InvalidCharacter {
                ch: extra,
                position: 1,
            }),
        }
    }
}

impl From<bool> for LogicValue {
    fn from(b: bool) -> Self {
        LogicValue::from_bool(b)
    }
}

fn parse_char(ch: char, position: usize) -> Result<LogicValue, DomainError> {
    match ch {
        '0' => Ok(LogicValue::Low),
        '1' => Ok(LogicValue::High),
        'z' | 'Z' => Ok(LogicValue::HighZ),
        'x' | 'X' => Ok(LogicValue::Unknown),
        _ => Err(DomainError::InvalidCharacter { ch, position }),
    }
}

/// Flips `Low` and `High`. `HighZ` and `Unknown` have no complement.
pub fn invert(v: LogicValue) -> LogicValue {
    match v {
        LogicValue::Low => LogicValue::High,
        LogicValue::High => LogicValue::Low,
        other => other,
    }
}

/// Combines the values of every driver attached to one point.
///
/// No drivers or only floating drivers yield `HighZ`; a single distinct
/// driven value wins; disagreeing values yield `Unknown`.
pub fn resolve_drivers(values: &[LogicValue]) -> LogicValue {
    let mut resolved: Option<LogicValue> = None;
    for &v in values {
        if v == LogicValue::HighZ {
            continue;
        }
        match resolved {
            None => resolved = Some(v),
            Some(prev) if prev != v => return LogicValue::Unknown,
            Some(_) => {}
        }
    }
    resolved.unwrap_or(LogicValue::HighZ)
}

/// Conjunction. `Low` dominates; otherwise any undefined input is `Unknown`.
pub fn and_all(values: &[LogicValue]) -> LogicValue {
    if values.contains(&LogicValue::Low) {
        LogicValue::Low
    } else if values.iter().all(|v| *v == LogicValue::High) {
        LogicValue::High
    } else {
        LogicValue::Unknown
    }
}

/// Disjunction. `High` dominates; otherwise any undefined input is `Unknown`.
pub fn or_all(values: &[LogicValue]) -> LogicValue {
    if values.contains(&LogicValue::High) {
        LogicValue::High
    } else if values.iter().all(|v| *v == LogicValue::Low) {
        LogicValue::Low
    } else {
        LogicValue::Unknown
    }
}

/// Odd parity; `Unknown` as soon as one input is undefined.
pub fn xor_all(values: &[LogicValue]) -> LogicValue {
    let mut parity = false;
    for v in values {
        match v.as_bool() {
            Some(b) => parity ^= b,
            None => return LogicValue::Unknown,
        }
    }
    LogicValue::from_bool(parity)
}

/// Parses a most-significant-bit-first string of `0`, `1`, `z`, `x`.
///
/// Underscores are accepted as digit separators.
pub fn parse_bits(s: &str) -> Result<Vec<LogicValue>, DomainError> {
    let bits = s
        .chars()
        .enumerate()
        .filter(|(_, ch)| *ch != '_')
        .map(|(position, ch)| parse_char(ch, position))
        .collect::<Result<Vec<_>, _>>()?;
    if bits.is_empty() {
        return Err(DomainError::Empty);
    }
    Ok(bits)
}

/// Formats values most-significant-bit first.
pub fn format_bits(bits: &[LogicValue]) -> String {
    bits.iter().map(|b| b.to_char()).collect()
}

/// Parses a hexadecimal string into bits, four per digit, MSB first.
///
/// A `z` or `x` digit expands to four `HighZ` or `Unknown` bits.
pub fn parse_hex(s: &str) -> Result<Vec<LogicValue>, DomainError> {
    let mut bits = Vec::with_capacity(s.len() * 4);
    for (position, ch) in s.chars().enumerate() {
        if ch == '_' {
            continue;
        }
        match ch {
            'z' | 'Z' => bits.extend([LogicValue::HighZ; 4]),
            'x' | 'X' => bits.extend([LogicValue::Unknown; 4]),
            _ => {
                let digit = ch
                    .to_digit(16)
                    .ok_or(DomainError::InvalidCharacter { ch, position })?;
                for shift in (0..4).rev() {
                    bits.push(LogicValue::from_bool((digit >> shift) & 1 == 1));
                }
            }
        }
    }
    if bits.is_empty() {
        return Err(DomainError::Empty);
    }
    Ok(bits)
}

/// Formats bits as lowercase hex, MSB first, left-padding with `Low`.
///
/// A nibble that is entirely `HighZ` prints as `z`; any other nibble
/// containing an undefined bit prints as `x`.
pub fn format_hex(bits: &[LogicValue]) -> String {
    let pad = (4 - bits.len() % 4) % 4;
    let padded: Vec<LogicValue> = std::iter::repeat(LogicValue::Low)
        .take(pad)
        .chain(bits.iter().copied())
        .collect();

    padded
        .chunks(4)
        .map(|nibble| {
            if nibble.iter().all(|b| *b == LogicValue::HighZ) {
                return 'z';
            }
            let mut digit = 0u32;
            for b in nibble {
                match b.as_bool() {
                    Some(bit) => digit = (digit << 1) | bit as u32,
                    None => return 'x',
                }
            }
            std::char::from_digit(digit, 16).unwrap_or('x')
        })
        .collect()
}
