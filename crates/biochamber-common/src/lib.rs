//! # BioChamber Common
//!
//! Shared data model and error types for the BioChamber control loop.
//!
//! ## Core Types
//!
//! - [`Profile`]: active microorganism setpoints (temperature, pH, dissolved oxygen)
//! - [`SensorReading`]: lenient view of the latest live reading
//! - [`Directive`]: discrete actuator command for one channel
//! - [`ControlCyclePayload`]: the unit written to the store each cycle
//! - [`ControlSnapshot`]: last published state for the presentation layer
//!
//! ## Feature Vector
//!
//! ```text
//! [temperature, ph, dissolved_oxygen, optical_density]
//! ```
//!
//! Optical density is carried for shape compatibility only; no objective
//! term depends on it.

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{BiochamberError, ProfileError, Result, TrainingDataError};
pub use types::{
    directive::{Channel, Correction, Directive, Directives},
    payload::{ControlCyclePayload, ControlSnapshot, CycleStatus, Deviations},
    profile::{Preset, Profile},
    reading::{DecodedReading, FallbackPolicy, ResolvedReading, SensorReading},
};

/// BioChamber version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of features fed to the efficiency estimator
pub const FEATURE_COUNT: usize = 4;

/// Temperature domain in degrees Celsius
pub const TEMPERATURE_RANGE: (f64, f64) = (15.0, 50.0);

/// pH domain
pub const PH_RANGE: (f64, f64) = (3.0, 10.0);

/// Dissolved oxygen domain in percent saturation
pub const DISSOLVED_OXYGEN_RANGE: (f64, f64) = (0.0, 100.0);

/// Optical density domain
pub const OPTICAL_DENSITY_RANGE: (f64, f64) = (0.0, 5.0);

/// Decimal places kept for efficiency in store documents
pub const EFFICIENCY_DECIMALS: i32 = 4;

/// Timestamp format written to the store
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
