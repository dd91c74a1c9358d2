//! Control cycle payload and published state
//!
//! Each cycle produces exactly one [`ControlCyclePayload`], which replaces
//! the previous one both in the store and in the [`ControlSnapshot`] handed
//! to the presentation layer. No history is kept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::directive::{Channel, Directives};
use super::profile::Profile;
use super::reading::ResolvedReading;
use crate::{EFFICIENCY_DECIMALS, TIMESTAMP_FORMAT};

/// Signed `target - current` per channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Deviations {
    pub temperature: f64,
    pub ph: f64,
    pub dissolved_oxygen: f64,
}

impl Deviations {
    pub fn between(profile: &Profile, reading: &ResolvedReading) -> Self {
        Self {
            temperature: profile.target_temperature - reading.temperature,
            ph: profile.target_ph - reading.ph,
            dissolved_oxygen: profile.target_dissolved_oxygen - reading.dissolved_oxygen,
        }
    }

    pub fn get(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Thermal => self.temperature,
            Channel::Ph => self.ph,
            Channel::Oxygen => self.dissolved_oxygen,
        }
    }
}

/// Output of one control cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlCyclePayload {
    /// Monotonic cycle number within this process
    pub cycle: u64,
    /// Profile snapshot the cycle ran against
    pub profile: Profile,
    /// Reading after fallback substitution
    pub reading: ResolvedReading,
    /// Estimated growth efficiency, nominally in [0, 1]
    pub efficiency: f64,
    pub deviations: Deviations,
    pub directives: Directives,
    /// Fields filled from the fallback because they were missing or malformed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded_fields: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl ControlCyclePayload {
    /// Partial-update document written to the directive path
    pub fn store_document(&self) -> Value {
        let mut doc = json!({
            "thermal": self.directives.thermal.label(),
            "ph": self.directives.ph.label(),
            "oxygen": self.directives.oxygen.label(),
            "efficiency": round_to(self.efficiency, EFFICIENCY_DECIMALS),
            "deviations": {
                "temperature": round_to(self.deviations.temperature, 3),
                "ph": round_to(self.deviations.ph, 3),
                "dissolved_oxygen": round_to(self.deviations.dissolved_oxygen, 3),
            },
            "profile": self.profile.name,
            "cycle": self.cycle,
            "timestamp": self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        });
        if !self.degraded_fields.is_empty() {
            doc["degraded_fields"] = json!(self.degraded_fields);
        }
        doc
    }

    /// Equal in everything the cycle computed, ignoring cycle number and time
    pub fn same_outcome(&self, other: &Self) -> bool {
        self.profile == other.profile
            && self.reading == other.reading
            && self.efficiency == other.efficiency
            && self.deviations == other.deviations
            && self.directives == other.directives
            && self.degraded_fields == other.degraded_fields
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded_fields.is_empty()
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Health of the control loop as seen by the operator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    /// No cycle has completed yet
    #[default]
    AwaitingData,
    /// Last cycle completed on a full reading and was stored
    Nominal,
    /// Last cycle failed, ran on substituted fields, or could not be stored
    Degraded,
}

/// Last published state of the control loop
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlSnapshot {
    pub status: CycleStatus,
    /// Last successfully computed payload
    pub payload: Option<ControlCyclePayload>,
    pub last_error: Option<String>,
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ControlSnapshot {
    /// Record a computed payload, optionally with a store write failure
    pub fn record_success(&mut self, payload: ControlCyclePayload, push_error: Option<String>) {
        self.status = if payload.is_degraded() || push_error.is_some() {
            CycleStatus::Degraded
        } else {
            CycleStatus::Nominal
        };
        self.last_error = push_error.or_else(|| {
            payload
                .is_degraded()
                .then(|| format!("substituted fields: {}", payload.degraded_fields.join(", ")))
        });
        self.updated_at = Some(payload.timestamp);
        self.payload = Some(payload);
        self.cycles_completed += 1;
    }

    /// Record a cycle that produced nothing; the previous payload is kept
    pub fn record_failure(&mut self, error: String, at: DateTime<Utc>) {
        self.status = CycleStatus::Degraded;
        self.last_error = Some(error);
        self.updated_at = Some(at);
        self.cycles_failed += 1;
    }
}
