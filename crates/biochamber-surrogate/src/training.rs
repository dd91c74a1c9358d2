//! Training-set synthesis
//!
//! Samples are drawn uniformly over the fixed feature domain and labelled by
//! the objective model. Optical density is sampled like every other feature
//! but the label never depends on it, so the fitted ensemble learns to treat
//! it as noise.

use biochamber_common::{
    DISSOLVED_OXYGEN_RANGE, FEATURE_COUNT, OPTICAL_DENSITY_RANGE, PH_RANGE, TEMPERATURE_RANGE,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::objective::ObjectiveModel;

/// Sampling bounds per feature, in feature-vector order
pub const FEATURE_BOUNDS: [(f64, f64); FEATURE_COUNT] = [
    TEMPERATURE_RANGE,
    PH_RANGE,
    DISSOLVED_OXYGEN_RANGE,
    OPTICAL_DENSITY_RANGE,
];

/// One labelled feature vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingSample {
    pub features: [f64; FEATURE_COUNT],
    pub efficiency: f64,
}

/// Draw `count` labelled samples from a seeded generator
pub fn synthesize(objective: &ObjectiveModel, count: usize, seed: u64) -> Vec<TrainingSample> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let mut features = [0.0; FEATURE_COUNT];
            for (value, (lo, hi)) in features.iter_mut().zip(FEATURE_BOUNDS) {
                *value = rng.gen_range(lo..hi);
            }
            TrainingSample {
                features,
                efficiency: objective.efficiency_of(&features),
            }
        })
        .collect()
}
