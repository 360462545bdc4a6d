//! Task priority.
//!
//! Priorities run from 1 (highest) to 10 (lowest). Zero, `null`, or a
//! missing field all mean "no priority".

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;

pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Priority(u8);

impl Priority {
    pub const NONE: Priority = Priority(0);

    /// Build a priority from user input; `0` means none.
    pub fn new(value: u8) -> Result<Self, CoreError> {
        if value > MAX_PRIORITY {
            return Err(CoreError::Validation(format!(
                "Priority must be between {MIN_PRIORITY} and {MAX_PRIORITY}, or 0 for none (got {value})"
            )));
        }
        Ok(Self(value))
    }

    /// Lenient conversion for values read off the wire. Out-of-range
    /// values are treated as no priority.
    pub fn from_raw(value: i64) -> Self {
        match u8::try_from(value) {
            Ok(v) if v <= MAX_PRIORITY => Self(v),
            _ => Self::NONE,
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }

    pub fn label(&self) -> &'static str {
        match self.0 {
            0 => "none",
            1..=3 => "high",
            4..=6 => "medium",
            _ => "low",
        }
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<i64>::deserialize(deserializer)?;
        Ok(Priority::from_raw(raw.unwrap_or(0)))
    }
}
