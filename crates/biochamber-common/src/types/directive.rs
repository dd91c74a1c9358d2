//! Actuator directives
//!
//! Every controlled channel shares the same three-way shape
//! (`Stable`/`Raise`/`Lower`) but publishes channel-specific labels.

use serde::{Deserialize, Serialize};

/// Controlled channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Thermal,
    Ph,
    Oxygen,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Thermal, Channel::Ph, Channel::Oxygen];

    /// Key used in store documents
    pub fn key(self) -> &'static str {
        match self {
            Channel::Thermal => "thermal",
            Channel::Ph => "ph",
            Channel::Oxygen => "oxygen",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Channel-independent correction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Correction {
    /// Inside the dead band
    Stable,
    /// Below target
    Raise,
    /// Above target
    Lower,
}

/// Discrete actuator command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Directive {
    Stable,
    HeatOn,
    CoolingOn,
    AddBase,
    AddAcid,
    IncreaseAeration,
    DecreaseAeration,
}

impl Directive {
    /// Label a correction for a specific channel
    pub fn for_channel(channel: Channel, correction: Correction) -> Self {
        match (channel, correction) {
            (_, Correction::Stable) => Directive::Stable,
            (Channel::Thermal, Correction::Raise) => Directive::HeatOn,
            (Channel::Thermal, Correction::Lower) => Directive::CoolingOn,
            (Channel::Ph, Correction::Raise) => Directive::AddBase,
            (Channel::Ph, Correction::Lower) => Directive::AddAcid,
            (Channel::Oxygen, Correction::Raise) => Directive::IncreaseAeration,
            (Channel::Oxygen, Correction::Lower) => Directive::DecreaseAeration,
        }
    }

    pub fn correction(self) -> Correction {
        match self {
            Directive::Stable => Correction::Stable,
            Directive::HeatOn | Directive::AddBase | Directive::IncreaseAeration => {
                Correction::Raise
            }
            Directive::CoolingOn | Directive::AddAcid | Directive::DecreaseAeration => {
                Correction::Lower
            }
        }
    }

    /// Label written to the store
    pub fn label(self) -> &'static str {
        match self {
            Directive::Stable => "STABLE",
            Directive::HeatOn => "HEAT_ON",
            Directive::CoolingOn => "COOLING_ON",
            Directive::AddBase => "ADD_BASE",
            Directive::AddAcid => "ADD_ACID",
            Directive::IncreaseAeration => "INCREASE_AERATION",
            Directive::DecreaseAeration => "DECREASE_AERATION",
        }
    }

    pub fn is_stable(self) -> bool {
        self == Directive::Stable
    }
}

impl std::fmt::Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One directive per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directives {
    pub thermal: Directive,
    pub ph: Directive,
    pub oxygen: Directive,
}

impl Directives {
    pub const STABLE: Directives = Directives {
        thermal: Directive::Stable,
        ph: Directive::Stable,
        oxygen: Directive::Stable,
    };

    pub fn get(&self, channel: Channel) -> Directive {
        match channel {
            Channel::Thermal => self.thermal,
            Channel::Ph => self.ph,
            Channel::Oxygen => self.oxygen,
        }
    }

    /// Channels that need an actuator change
    pub fn active(&self) -> impl Iterator<Item = (Channel, Directive)> + '_ {
        Channel::ALL
            .into_iter()
            .map(|c| (c, self.get(c)))
            .filter(|(_, d)| !d.is_stable())
    }
}
