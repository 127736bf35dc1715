use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MicrowaveError;

/// Temperature every food starts at, in Kelvin.
pub const AMBIENT_TEMPERATURE_K: f64 = 300.0;

const KELVIN_OFFSET: f64 = 273.0;

/// The kinds of food that fit in the microwave. They only differ by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FoodKind {
    Bread,
    Meat,
    Milk,
}

impl fmt::Display for FoodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoodKind::Bread => write!(f, "BREAD"),
            FoodKind::Meat => write!(f, "MEAT"),
            FoodKind::Milk => write!(f, "MILK"),
        }
    }
}

impl FromStr for FoodKind {
    type Err = MicrowaveError;

    /// Accepts the food name in any case, or its menu number (1-3).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bread" | "1" => Ok(FoodKind::Bread),
            "meat" | "2" => Ok(FoodKind::Meat),
            "milk" | "3" => Ok(FoodKind::Milk),
            other => Err(MicrowaveError::input(format!(
                "unknown food `{other}`, expected bread, meat or milk"
            ))),
        }
    }
}

/// A piece of food with a temperature. Heating is the only way to change it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    kind: FoodKind,
    temperature: f64,
}

impl Food {
    pub fn new(kind: FoodKind) -> Self {
        Self {
            kind,
            temperature: AMBIENT_TEMPERATURE_K,
        }
    }

    pub fn kind(&self) -> FoodKind {
        self.kind
    }

    /// Current temperature in Kelvin.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn celsius(&self) -> f64 {
        self.temperature - KELVIN_OFFSET
    }

    /// Raise the temperature. Negative or non-finite increments are ignored
    /// so the temperature never goes down.
    pub fn heat(&mut self, incremental: f64) {
        if incremental.is_finite() && incremental > 0.0 {
            self.temperature += incremental;
        }
    }
}

impl From<FoodKind> for Food {
    fn from(kind: FoodKind) -> Self {
        Food::new(kind)
    }
}
