//! Profile - setpoints for the active microorganism
//!
//! Exactly one profile is active at a time. A profile is never edited in
//! place; switching presets or entering custom values replaces it wholesale.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ProfileError;
use crate::{DISSOLVED_OXYGEN_RANGE, PH_RANGE, TEMPERATURE_RANGE};

/// Display name used for operator-entered setpoints
pub const CUSTOM_PROFILE_NAME: &str = "Custom";

/// Built-in microorganism presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    EColi,
    Yeast,
}

impl Preset {
    pub const ALL: [Preset; 2] = [Preset::EColi, Preset::Yeast];

    /// Human-readable organism name
    pub fn display_name(self) -> &'static str {
        match self {
            Preset::EColi => "E. coli",
            Preset::Yeast => "S. cerevisiae (Yeast)",
        }
    }

    /// Profile carrying this preset's setpoints
    pub fn profile(self) -> Profile {
        let (t, p, d) = match self {
            Preset::EColi => (37.0, 7.0, 40.0),
            Preset::Yeast => (30.0, 5.0, 20.0),
        };
        Profile {
            name: self.display_name().to_string(),
            target_temperature: t,
            target_ph: p,
            target_dissolved_oxygen: d,
        }
    }
}

impl FromStr for Preset {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "e_coli" | "ecoli" | "e. coli" => Ok(Preset::EColi),
            "yeast" | "s_cerevisiae" | "s. cerevisiae (yeast)" => Ok(Preset::Yeast),
            other => Err(ProfileError::UnknownPreset(other.to_string())),
        }
    }
}

/// Target setpoints for one microorganism
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Organism name shown to the operator
    pub name: String,
    /// Target temperature (°C)
    pub target_temperature: f64,
    /// Target pH
    pub target_ph: f64,
    /// Target dissolved oxygen (% saturation)
    pub target_dissolved_oxygen: f64,
}

impl Profile {
    pub fn e_coli() -> Self {
        Preset::EColi.profile()
    }

    pub fn yeast() -> Self {
        Preset::Yeast.profile()
    }

    /// Build a profile from operator-entered setpoints
    pub fn custom(
        target_temperature: f64,
        target_ph: f64,
        target_dissolved_oxygen: f64,
    ) -> Result<Self, ProfileError> {
        let profile = Self {
            name: CUSTOM_PROFILE_NAME.to_string(),
            target_temperature,
            target_ph,
            target_dissolved_oxygen,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Require every setpoint to be finite and inside the objective domain
    pub fn validate(&self) -> Result<(), ProfileError> {
        check("target_temperature", self.target_temperature, TEMPERATURE_RANGE)?;
        check("target_ph", self.target_ph, PH_RANGE)?;
        check(
            "target_dissolved_oxygen",
            self.target_dissolved_oxygen,
            DISSOLVED_OXYGEN_RANGE,
        )
    }

    /// Setpoints as `[temperature, ph, dissolved_oxygen]`
    pub fn setpoints(&self) -> [f64; 3] {
        [
            self.target_temperature,
            self.target_ph,
            self.target_dissolved_oxygen,
        ]
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::e_coli()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({:.1}°C, pH {:.2}, DO {:.1}%)",
            self.name, self.target_temperature, self.target_ph, self.target_dissolved_oxygen
        )
    }
}

fn check(field: &'static str, value: f64, (min, max): (f64, f64)) -> Result<(), ProfileError> {
    if !value.is_finite() {
        return Err(ProfileError::NonFinite { field });
    }
    if value < min || value > max {
        return Err(ProfileError::OutOfBounds {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let ecoli = Profile::e_coli();
        assert_eq!(ecoli.setpoints(), [37.0, 7.0, 40.0]);
        assert_eq!(ecoli.name, "E. coli");

        let yeast = Profile::yeast();
        assert_eq!(yeast.setpoints(), [30.0, 5.0, 20.0]);
        assert!(ecoli.validate().is_ok());
        assert!(yeast.validate().is_ok());
    }

    #[test]
    fn test_display() {
        assert_eq!(Profile::e_coli().to_string(), "E. coli (37.0°C, pH 7.00, DO 40.0%)");
        let custom = Profile::custom(32.5, 6.25, 55.0).unwrap();
        assert_eq!(custom.to_string(), format!("{CUSTOM_PROFILE_NAME} (32.5°C, pH 6.25, DO 55.0%)"));
    }

    #[test]
    fn test_default_is_e_coli() {
        assert_eq!(Profile::default(), Profile::e_coli());
    }

    #[test]
    fn test_custom_profile() {
        let profile = Profile::custom(32.5, 6.2, 55.0).unwrap();
        assert_eq!(profile.name, CUSTOM_PROFILE_NAME);
        assert_eq!(profile.target_ph, 6.2);
    }

    #[test]
    fn test_custom_rejects_out_of_domain() {
        let err = Profile::custom(37.0, 11.0, 40.0).unwrap_err();
        assert!(matches!(err, ProfileError::OutOfBounds { field: "target_ph", .. }));

        let err = Profile::custom(f64::NAN, 7.0, 40.0).unwrap_err();
        assert_eq!(err, ProfileError::NonFinite { field: "target_temperature" });

        assert!(Profile::custom(37.0, 7.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_domain_edges_accepted() {
        assert!(Profile::custom(15.0, 3.0, 0.0).is_ok());
        assert!(Profile::custom(50.0, 10.0, 100.0).is_ok());
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!("e_coli".parse::<Preset>().unwrap(), Preset::EColi);
        assert_eq!("E. coli".parse::<Preset>().unwrap(), Preset::EColi);
        assert_eq!("yeast".parse::<Preset>().unwrap(), Preset::Yeast);
        assert!("spirulina".parse::<Preset>().is_err());
    }

    #[test]
    fn test_preset_serde() {
        let json = serde_json::to_string(&Preset::EColi).unwrap();
        assert_eq!(json, "\"e_coli\"");
    }
}
