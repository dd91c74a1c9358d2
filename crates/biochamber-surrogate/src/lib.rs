//! # BioChamber Surrogate
//!
//! Learned estimate of the bioreactor's growth efficiency.
//!
//! ## Objective
//!
//! ```text
//! η(t, p, do) = exp(-(t - t*)² / 50) × exp(-(p - p*)² / 2) × exp(-(do - do*)² / 1000)
//! ```
//!
//! Where `t*`, `p*`, `do*` are the active profile's setpoints. The analytic
//! surface only exists to synthesize training data; production inference
//! always goes through the fitted forest.
//!
//! ## Estimator
//!
//! A bagged ensemble of CART regression trees over
//! `[temperature, ph, dissolved_oxygen, optical_density]`, fitted once per
//! process (or per explicit reset) through [`SurrogateCache`].

pub mod estimator;
pub mod forest;
pub mod objective;
pub mod training;

pub use estimator::{EfficiencyModel, ModelInfo, SurrogateCache};
pub use forest::{ForestParams, RandomForest};
pub use objective::{ObjectiveModel, ObjectiveWidths};
pub use training::{synthesize, TrainingSample};

use biochamber_common::TrainingDataError;
use serde::{Deserialize, Serialize};

/// Surrogate configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurrogateConfig {
    /// Number of synthesized training samples
    pub samples: usize,
    /// Seed for training-set synthesis
    pub seed: u64,
    /// Gaussian widths of the objective
    pub widths: ObjectiveWidths,
    /// Ensemble construction
    pub forest: ForestParams,
}

impl Default for SurrogateConfig {
    fn default() -> Self {
        Self {
            samples: 1000,
            seed: 42,
            widths: ObjectiveWidths::default(),
            forest: ForestParams::default(),
        }
    }
}

impl SurrogateConfig {
    pub fn validate(&self) -> Result<(), TrainingDataError> {
        if self.samples == 0 {
            return Err(TrainingDataError::Empty);
        }
        if !self.widths.is_valid() {
            return Err(TrainingDataError::InvalidParameter(
                "objective widths must be finite and positive".into(),
            ));
        }
        self.forest.validate()
    }
}
