//! Sensor readings
//!
//! The store hands back a loosely shaped JSON object. Decoding is lenient:
//! a field that is absent or `null` is simply missing, and a field of the
//! wrong type is missing *and* recorded as rejected. Resolution then fills
//! every gap from a fallback reading so a cycle can always proceed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field names as they appear in the store
pub const TEMPERATURE: &str = "temperature";
pub const PH: &str = "ph";
pub const DISSOLVED_OXYGEN: &str = "dissolved_oxygen";
pub const OPTICAL_DENSITY: &str = "optical_density";

/// Latest live reading, any field possibly missing
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ph: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dissolved_oxygen: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optical_density: Option<f64>,
}

/// Result of decoding a store document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedReading {
    pub reading: SensorReading,
    /// Fields present in the document but not usable as numbers
    pub rejected: Vec<String>,
}

impl DecodedReading {
    /// Document present but unusable: every field rejected
    pub fn unreadable() -> Self {
        Self {
            reading: SensorReading::default(),
            rejected: SensorReading::FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn is_malformed(&self) -> bool {
        !self.rejected.is_empty()
    }
}

impl SensorReading {
    pub const FIELDS: [&'static str; 4] = [TEMPERATURE, PH, DISSOLVED_OXYGEN, OPTICAL_DENSITY];

    /// Fully populated reading
    pub fn new(temperature: f64, ph: f64, dissolved_oxygen: f64, optical_density: f64) -> Self {
        Self {
            temperature: Some(temperature),
            ph: Some(ph),
            dissolved_oxygen: Some(dissolved_oxygen),
            optical_density: Some(optical_density),
        }
    }

    /// Decode a store document.
    ///
    /// Returns `None` when the store holds no reading at all (`null`). A
    /// document that is not an object decodes to an empty reading with every
    /// field rejected.
    pub fn decode(value: &Value) -> Option<DecodedReading> {
        let map = match value {
            Value::Null => return None,
            Value::Object(map) => map,
            _ => return Some(DecodedReading::unreadable()),
        };

        let mut rejected = Vec::new();
        let mut field = |name: &'static str| -> Option<f64> {
            match map.get(name) {
                None | Some(Value::Null) => None,
                Some(v) => match v.as_f64().filter(|x| x.is_finite()) {
                    Some(x) => Some(x),
                    None => {
                        rejected.push(name.to_string());
                        None
                    }
                },
            }
        };

        let reading = SensorReading {
            temperature: field(TEMPERATURE),
            ph: field(PH),
            dissolved_oxygen: field(DISSOLVED_OXYGEN),
            optical_density: field(OPTICAL_DENSITY),
        };

        Some(DecodedReading { reading, rejected })
    }

    /// Names of the fields that are missing
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let values = [
            self.temperature,
            self.ph,
            self.dissolved_oxygen,
            self.optical_density,
        ];
        Self::FIELDS
            .iter()
            .zip(values)
            .filter(|(_, v)| v.is_none())
            .map(|(name, _)| *name)
            .collect()
    }

    /// Fill every missing field from `fallback`
    pub fn resolve(&self, fallback: &ResolvedReading) -> ResolvedReading {
        ResolvedReading {
            temperature: self.temperature.unwrap_or(fallback.temperature),
            ph: self.ph.unwrap_or(fallback.ph),
            dissolved_oxygen: self.dissolved_oxygen.unwrap_or(fallback.dissolved_oxygen),
            optical_density: self.optical_density.unwrap_or(fallback.optical_density),
        }
    }
}

/// Reading with every field populated
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedReading {
    pub temperature: f64,
    pub ph: f64,
    pub dissolved_oxygen: f64,
    pub optical_density: f64,
}

impl ResolvedReading {
    /// All-zero reading used as the default fallback
    pub const ZERO: ResolvedReading = ResolvedReading {
        temperature: 0.0,
        ph: 0.0,
        dissolved_oxygen: 0.0,
        optical_density: 0.0,
    };

    /// Estimator feature vector
    pub fn features(&self) -> [f64; crate::FEATURE_COUNT] {
        [
            self.temperature,
            self.ph,
            self.dissolved_oxygen,
            self.optical_density,
        ]
    }
}

impl From<ResolvedReading> for SensorReading {
    fn from(r: ResolvedReading) -> Self {
        SensorReading::new(r.temperature, r.ph, r.dissolved_oxygen, r.optical_density)
    }
}

/// How missing fields are filled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Substitute 0.0
    #[default]
    Zero,
    /// Reuse the field's value from the last resolved reading
    LastKnownGood,
}

impl FallbackPolicy {
    /// Pick the fallback reading given the previous resolved reading
    pub fn fallback(self, last: Option<&ResolvedReading>) -> ResolvedReading {
        match (self, last) {
            (FallbackPolicy::LastKnownGood, Some(prev)) => *prev,
            _ => ResolvedReading::ZERO,
        }
    }
}
