//! Error types for the BioChamber control loop
//!
//! Provides a unified error type and domain-specific error variants

use thiserror::Error;

/// Result type alias using BiochamberError
pub type Result<T> = std::result::Result<T, BiochamberError>;

/// Unified error type for BioChamber operations
#[derive(Debug, Error)]
pub enum BiochamberError {
    // Store errors
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("No reading available at {0}")]
    NoReading(String),

    #[error("Malformed reading: {0}")]
    MalformedReading(String),

    // Estimator errors
    #[error("Training data error: {0}")]
    TrainingData(#[from] TrainingDataError),

    // Operator input errors
    #[error("Invalid profile: {0}")]
    InvalidProfile(#[from] ProfileError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BiochamberError {
    /// Whether the error should stop the process instead of degrading one cycle
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::TrainingData(_) | Self::Config(_))
    }
}

/// Fit-time errors for the efficiency estimator
#[derive(Debug, Error, PartialEq)]
pub enum TrainingDataError {
    #[error("Training set is empty")]
    Empty,

    #[error("Non-finite feature at row {row}, column {column}")]
    NonFiniteFeature { row: usize, column: usize },

    #[error("Non-finite label at row {row}")]
    NonFiniteLabel { row: usize },

    #[error("Label {value} at row {row} outside [0, 1]")]
    LabelOutOfRange { row: usize, value: f64 },

    #[error("Invalid ensemble parameter: {0}")]
    InvalidParameter(String),
}

/// Rejected operator setpoints
#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("{field} = {value} outside [{min}, {max}]")]
    OutOfBounds {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Unknown profile preset: {0}")]
    UnknownPreset(String),
}

impl From<serde_json::Error> for BiochamberError {
    fn from(err: serde_json::Error) -> Self {
        BiochamberError::Serialization(err.to_string())
    }
}
