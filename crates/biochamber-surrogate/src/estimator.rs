//! Efficiency estimator
//!
//! [`EfficiencyModel`] is the fitted surrogate: immutable after `fit`, shared
//! behind `Arc` and read concurrently by every cycle and inspection request.
//!
//! [`SurrogateCache`] is the single initialization barrier of the service.
//! The first caller triggers the fit on the blocking pool; every concurrent
//! caller waits on the same fit instead of starting its own. The model is
//! then reused until [`SurrogateCache::reset`] is called.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use biochamber_common::{BiochamberError, Profile, TrainingDataError, FEATURE_COUNT};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

use crate::forest::RandomForest;
use crate::objective::ObjectiveModel;
use crate::training::{synthesize, TrainingSample};
use crate::SurrogateConfig;

/// Fitted efficiency surrogate
#[derive(Debug, Clone)]
pub struct EfficiencyModel {
    forest: RandomForest,
    info: ModelInfo,
}

/// Summary of a fitted model, safe to expose to operators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Profile whose objective produced the training labels
    pub trained_for: String,
    pub samples: usize,
    pub trees: usize,
    pub label_min: f64,
    pub label_max: f64,
    pub fitted_at: DateTime<Utc>,
}

impl EfficiencyModel {
    /// Fit on labelled samples.
    ///
    /// Labels must be finite and inside [0, 1]; anything else is a
    /// [`TrainingDataError`].
    pub fn fit(
        samples: &[TrainingSample],
        trained_for: &str,
        config: &SurrogateConfig,
    ) -> Result<Self, TrainingDataError> {
        if samples.is_empty() {
            return Err(TrainingDataError::Empty);
        }
        for (row, sample) in samples.iter().enumerate() {
            let y = sample.efficiency;
            if !y.is_finite() {
                return Err(TrainingDataError::NonFiniteLabel { row });
            }
            if !(0.0..=1.0).contains(&y) {
                return Err(TrainingDataError::LabelOutOfRange { row, value: y });
            }
        }

        let features: Vec<[f64; FEATURE_COUNT]> = samples.iter().map(|s| s.features).collect();
        let labels: Vec<f64> = samples.iter().map(|s| s.efficiency).collect();
        let forest = RandomForest::fit(&features, &labels, &config.forest)?;
        let (label_min, label_max) = forest.label_range();

        Ok(Self {
            info: ModelInfo {
                trained_for: trained_for.to_string(),
                samples: samples.len(),
                trees: forest.n_trees(),
                label_min,
                label_max,
                fitted_at: Utc::now(),
            },
            forest,
        })
    }

    /// Synthesize a training set for `profile` and fit on it.
    ///
    /// The samples are dropped once the forest is built.
    pub fn train(profile: &Profile, config: &SurrogateConfig) -> Result<Self, TrainingDataError> {
        config.validate()?;
        let objective = ObjectiveModel::new(profile, config.widths);
        let samples = synthesize(&objective, config.samples, config.seed);
        Self::fit(&samples, &profile.name, config)
    }

    /// Estimated efficiency for `[temperature, ph, dissolved_oxygen, optical_density]`.
    ///
    /// Not clamped: the result stays inside the training label range, which
    /// is [0, 1] for synthesized data, but callers should not rely on exact
    /// closure for inputs far outside the training domain.
    pub fn predict(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        self.forest.predict(features)
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }
}

/// Lazily fitted, resettable model shared by the control loop and the API
pub struct SurrogateCache {
    config: SurrogateConfig,
    cell: RwLock<Arc<OnceCell<Arc<EfficiencyModel>>>>,
    fits: AtomicU64,
}

impl SurrogateCache {
    pub fn new(config: SurrogateConfig) -> Self {
        Self {
            config,
            cell: RwLock::new(Arc::new(OnceCell::new())),
            fits: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SurrogateConfig {
        &self.config
    }

    /// Fitted model, fitting against `profile` first if none exists yet.
    ///
    /// `profile` is ignored once a model is cached.
    #[instrument(skip(self, profile), fields(profile = %profile.name))]
    pub async fn model(&self, profile: &Profile) -> Result<Arc<EfficiencyModel>, BiochamberError> {
        let cell = self.cell.read().clone();
        let model = cell
            .get_or_try_init(|| async {
                let config = self.config.clone();
                let profile = profile.clone();
                let started = Instant::now();
                info!(
                    samples = config.samples,
                    trees = config.forest.n_trees,
                    "Fitting efficiency surrogate"
                );

                let model = tokio::task::spawn_blocking(move || {
                    EfficiencyModel::train(&profile, &config)
                })
                .await
                .map_err(|e| BiochamberError::Internal(format!("Surrogate fit task failed: {}", e)))??;

                self.fits.fetch_add(1, Ordering::Relaxed);
                info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Efficiency surrogate ready"
                );
                Ok::<_, BiochamberError>(Arc::new(model))
            })
            .await?;
        Ok(model.clone())
    }

    /// Model if one is already fitted, without waiting
    pub fn current(&self) -> Option<Arc<EfficiencyModel>> {
        self.cell.read().get().cloned()
    }

    /// Drop the cached model; the next [`model`](Self::model) call refits.
    ///
    /// Callers already holding the old model keep using it.
    pub fn reset(&self) {
        warn!("Efficiency surrogate reset requested");
        *self.cell.write() = Arc::new(OnceCell::new());
    }

    /// Number of fits completed since creation
    pub fn fits_completed(&self) -> u64 {
        self.fits.load(Ordering::Relaxed)
    }
}
