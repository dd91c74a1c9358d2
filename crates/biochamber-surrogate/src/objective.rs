//! Objective model: the "true" efficiency surface
//!
//! ```text
//! η = exp(-(t - t*)² / w_t) × exp(-(p - p*)² / w_p) × exp(-(do - do*)² / w_do)
//! ```
//!
//! Optical density is part of the feature vector but never part of η.

use biochamber_common::Profile;
use serde::{Deserialize, Serialize};

/// Gaussian widths in squared-difference units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveWidths {
    pub temperature: f64,
    pub ph: f64,
    pub dissolved_oxygen: f64,
}

impl Default for ObjectiveWidths {
    fn default() -> Self {
        Self {
            temperature: 50.0,
            ph: 2.0,
            dissolved_oxygen: 1000.0,
        }
    }
}

impl ObjectiveWidths {
    pub fn is_valid(&self) -> bool {
        [self.temperature, self.ph, self.dissolved_oxygen]
            .iter()
            .all(|w| w.is_finite() && *w > 0.0)
    }
}

/// Efficiency surface centred on one profile's setpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveModel {
    ideal: [f64; 3],
    widths: ObjectiveWidths,
}

impl ObjectiveModel {
    pub fn new(profile: &Profile, widths: ObjectiveWidths) -> Self {
        Self {
            ideal: profile.setpoints(),
            widths,
        }
    }

    /// Ideal `[temperature, ph, dissolved_oxygen]`
    pub fn ideal(&self) -> [f64; 3] {
        self.ideal
    }

    pub fn widths(&self) -> ObjectiveWidths {
        self.widths
    }

    /// Analytic efficiency in [0, 1]; exactly 1 only at the ideal point
    pub fn efficiency(&self, temperature: f64, ph: f64, dissolved_oxygen: f64) -> f64 {
        let [t0, p0, d0] = self.ideal;
        penalty(temperature - t0, self.widths.temperature)
            * penalty(ph - p0, self.widths.ph)
            * penalty(dissolved_oxygen - d0, self.widths.dissolved_oxygen)
    }

    /// Efficiency of a full feature vector; optical density is ignored
    pub fn efficiency_of(&self, features: &[f64; biochamber_common::FEATURE_COUNT]) -> f64 {
        self.efficiency(features[0], features[1], features[2])
    }
}

fn penalty(delta: f64, width: f64) -> f64 {
    (-(delta * delta) / width).exp()
}
