//! Service configuration
//!
//! Layered, lowest priority first: serde defaults, an optional
//! `biochamber.{toml,yaml,json}` file (path overridable through
//! `BIOCHAMBER_CONFIG`), `BIOCHAMBER__*` environment variables
//! (e.g. `BIOCHAMBER__STORE__BASE_URL`), and finally `PORT`.

use std::time::Duration;

use anyhow::Result;
use biochamber_common::{BiochamberError, FallbackPolicy, Preset, Profile};
use biochamber_regulator::DeadBands;
use biochamber_surrogate::SurrogateConfig;
use serde::{Deserialize, Serialize};

/// Service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// API host
    pub host: String,
    /// API port
    pub port: u16,
    /// Control cycle period in milliseconds
    pub tick_interval_ms: u64,
    /// How missing reading fields are filled
    pub fallback: FallbackPolicy,
    /// Profile active at startup
    pub profile: ProfileSettings,
    /// Per-channel dead bands
    pub dead_bands: DeadBands,
    /// External store
    pub store: StoreSettings,
    /// Efficiency surrogate
    pub surrogate: SurrogateConfig,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
            tick_interval_ms: crate::DEFAULT_TICK_INTERVAL_MS,
            fallback: FallbackPolicy::default(),
            profile: ProfileSettings::default(),
            dead_bands: DeadBands::default(),
            store: StoreSettings::default(),
            surrogate: SurrogateConfig::default(),
        }
    }
}

impl ControlConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let path = std::env::var("BIOCHAMBER_CONFIG").unwrap_or_else(|_| "biochamber".into());
        let mut cfg: Self = config::Config::builder()
            .add_source(config::File::with_name(&path).required(false))
            .add_source(
                config::Environment::with_prefix("BIOCHAMBER")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        // Platform-provided PORT wins
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(p) = port.parse::<u16>() {
                cfg.port = p;
            }
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings the loop cannot run with
    pub fn validate(&self) -> biochamber_common::Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(BiochamberError::Config(
                "tick_interval_ms must be positive".into(),
            ));
        }
        if self.store.request_timeout_ms == 0 {
            return Err(BiochamberError::Config(
                "store.request_timeout_ms must be positive".into(),
            ));
        }
        self.dead_bands.validate()?;
        self.surrogate
            .validate()
            .map_err(|e| BiochamberError::Config(format!("surrogate: {}", e)))?;
        self.initial_profile()?;
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Profile active at startup; custom setpoints win over the preset
    pub fn initial_profile(&self) -> biochamber_common::Result<Profile> {
        match &self.profile.custom {
            Some(c) => Ok(Profile::custom(
                c.target_temperature,
                c.target_ph,
                c.target_dissolved_oxygen,
            )?),
            None => Ok(self.profile.preset.profile()),
        }
    }
}

/// Startup profile selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSettings {
    pub preset: Preset,
    pub custom: Option<CustomSetpoints>,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            preset: Preset::EColi,
            custom: None,
        }
    }
}

/// Operator-entered setpoints
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CustomSetpoints {
    pub target_temperature: f64,
    pub target_ph: f64,
    pub target_dissolved_oxygen: f64,
}

/// Store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Realtime-database REST API
    Firebase,
    /// Process-local store seeded with a demo reading
    Memory,
}

/// External store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    /// Database root URL
    pub base_url: String,
    /// Node holding the live reading
    pub readings_path: String,
    /// Node receiving directives
    pub directives_path: String,
    /// Database secret or ID token, sent as the `auth` query parameter
    pub auth: Option<String>,
    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Firebase,
            base_url: String::new(),
            readings_path: "live_readings".to_string(),
            directives_path: "control_directives".to_string(),
            auth: None,
            request_timeout_ms: 4000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = ControlConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.tick_interval(), Duration::from_secs(5));
        assert_eq!(cfg.initial_profile().unwrap(), Profile::e_coli());
    }

    #[test]
    fn test_custom_profile_wins() {
        let cfg = ControlConfig {
            profile: ProfileSettings {
                preset: Preset::Yeast,
                custom: Some(CustomSetpoints {
                    target_temperature: 33.0,
                    target_ph: 6.5,
                    target_dissolved_oxygen: 30.0,
                }),
            },
            ..Default::default()
        };
        let profile = cfg.initial_profile().unwrap();
        assert_eq!(profile.setpoints(), [33.0, 6.5, 30.0]);
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let cfg = ControlConfig {
            tick_interval_ms: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let mut cfg = ControlConfig::default();
        cfg.dead_bands.ph = -0.1;
        assert!(cfg.validate().is_err());

        let mut cfg = ControlConfig::default();
        cfg.profile.custom = Some(CustomSetpoints {
            target_temperature: 80.0,
            target_ph: 7.0,
            target_dissolved_oxygen: 40.0,
        });
        assert!(cfg.validate().is_err());

        let mut cfg = ControlConfig::default();
        cfg.surrogate.forest.n_trees = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_toml_shape() {
        let cfg: ControlConfig = serde_json::from_value(serde_json::json!({
            "tick_interval_ms": 1000,
            "fallback": "last_known_good",
            "profile": { "preset": "yeast" },
            "store": { "backend": "memory" }
        }))
        .unwrap();
        assert_eq!(cfg.tick_interval_ms, 1000);
        assert_eq!(cfg.fallback, FallbackPolicy::LastKnownGood);
        assert_eq!(cfg.profile.preset, Preset::Yeast);
        assert_eq!(cfg.store.backend, StoreBackend::Memory);
        assert_eq!(cfg.store.readings_path, "live_readings");
        assert_eq!(cfg.dead_bands, DeadBands::default());
    }
}
