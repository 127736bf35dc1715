use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MicrowaveError;

/// Upper bound (exclusive) for a preset entered by the user: one hour.
pub const MAX_PRESET_SECS: u32 = 60 * 60;

/// A cook duration in whole seconds, displayed as `M:SS`.
///
/// Parsing enforces the preset bound; arithmetic does not, so adding time
/// can push the value past one hour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CookTime(u32);

impl CookTime {
    pub const ZERO: CookTime = CookTime(0);

    pub fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    pub fn as_secs(self) -> u32 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn add_secs(self, secs: u32) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// One tick less, stopping at zero.
    pub fn decrement(self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

impl fmt::Display for CookTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for CookTime {
    type Err = MicrowaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MicrowaveError::input(format!(
                "`{s}` is not a whole number of seconds"
            )));
        }
        match s.parse::<u32>() {
            Ok(secs) if secs < MAX_PRESET_SECS => Ok(CookTime::from_secs(secs)),
            _ => Err(MicrowaveError::input(format!(
                "cook time must be below {MAX_PRESET_SECS} seconds"
            ))),
        }
    }
}
