//! # Regulator
//!
//! Dead-band directive policy for the BioChamber actuators.
//!
//! ## Rule
//!
//! ```text
//! d = target − current
//! d >  band  → RAISE   (HEAT_ON, ADD_BASE, INCREASE_AERATION)
//! d < −band  → LOWER   (COOLING_ON, ADD_ACID, DECREASE_AERATION)
//! otherwise  → STABLE
//! ```
//!
//! The policy is a pure function of `(current, target, band)` per channel.

pub mod controller;

pub use controller::{DeadBandController, Regulator};

use biochamber_common::{BiochamberError, Result};
use serde::{Deserialize, Serialize};

/// Per-channel dead bands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadBands {
    /// Thermal band (°C)
    pub temperature: f64,
    /// pH band (pH units)
    pub ph: f64,
    /// Dissolved oxygen band (percentage points)
    pub dissolved_oxygen: f64,
}

impl Default for DeadBands {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            ph: 0.2,
            dissolved_oxygen: 5.0,
        }
    }
}

impl DeadBands {
    /// Every band must be finite and strictly positive
    pub fn validate(&self) -> Result<()> {
        for (name, band) in [
            ("temperature", self.temperature),
            ("ph", self.ph),
            ("dissolved_oxygen", self.dissolved_oxygen),
        ] {
            if !band.is_finite() || band <= 0.0 {
                return Err(BiochamberError::Config(format!(
                    "dead band for {} must be finite and positive, got {}",
                    name, band
                )));
            }
        }
        Ok(())
    }
}
