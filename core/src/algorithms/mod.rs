// Wipe methods and the patterns they write
//
// A method is a fixed, ordered list of patterns. The order is the compliance
// contract: pass N of a method always writes the same pattern.

pub mod schedule;

#[cfg(test)]
mod schedule_test;

pub use schedule::{schedule_for, ScheduledPass};

use crate::error::WipeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Byte pattern written during a single pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pattern {
    /// 0x00
    Zero,
    /// 0xFF
    Ones,
    /// 0xAA (10101010)
    AltAA,
    /// 0x55 (01010101)
    Alt55,
    /// Pseudo-random bytes, regenerated before every pass
    Random,
}

impl Pattern {
    /// Patterns backed by an immutable buffer, in pool slot order
    pub const FIXED: [Pattern; 4] = [Pattern::Zero, Pattern::Ones, Pattern::AltAA, Pattern::Alt55];

    /// Fill byte for fixed patterns, `None` for random
    pub fn fill_byte(&self) -> Option<u8> {
        match self {
            Pattern::Zero => Some(0x00),
            Pattern::Ones => Some(0xFF),
            Pattern::AltAA => Some(0xAA),
            Pattern::Alt55 => Some(0x55),
            Pattern::Random => None,
        }
    }

    pub fn is_random(&self) -> bool {
        matches!(self, Pattern::Random)
    }

    pub(crate) fn slot(&self) -> Option<usize> {
        Self::FIXED.iter().position(|p| p == self)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fill_byte() {
            Some(byte) => write!(f, "0x{:02X}", byte),
            None => write!(f, "random"),
        }
    }
}

/// Supported wipe methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WipeMethod {
    /// 1 pass: zeros
    Clear,
    /// 3 passes: zeros, ones, random
    Purge,
    /// 7 passes: zeros, ones, zeros, 0xAA, 0x55, 0xAA, random
    Destroy,
}

impl WipeMethod {
    pub const ALL: [WipeMethod; 3] = [WipeMethod::Clear, WipeMethod::Purge, WipeMethod::Destroy];

    /// Ordered pattern sequence for this method
    pub fn patterns(&self) -> &'static [Pattern] {
        match self {
            WipeMethod::Clear => &[Pattern::Zero],
            WipeMethod::Purge => &[Pattern::Zero, Pattern::Ones, Pattern::Random],
            WipeMethod::Destroy => &[
                Pattern::Zero,
                Pattern::Ones,
                Pattern::Zero,
                Pattern::AltAA,
                Pattern::Alt55,
                Pattern::AltAA,
                Pattern::Random,
            ],
        }
    }

    pub fn pass_count(&self) -> usize {
        self.patterns().len()
    }

    /// Command-line spelling of the method
    pub fn flag(&self) -> &'static str {
        match self {
            WipeMethod::Clear => "--clear",
            WipeMethod::Purge => "--purge",
            WipeMethod::Destroy => "--destroy-sw",
        }
    }
}

impl fmt::Display for WipeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag())
    }
}

impl FromStr for WipeMethod {
    type Err = WipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches("--") {
            "clear" => Ok(WipeMethod::Clear),
            "purge" => Ok(WipeMethod::Purge),
            "destroy-sw" | "destroy" => Ok(WipeMethod::Destroy),
            _ => Err(WipeError::UnsupportedMethod(s.to_string())),
        }
    }
}
