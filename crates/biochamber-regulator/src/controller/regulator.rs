//! Three-channel regulator

use biochamber_common::{
    Channel, Deviations, Directive, Directives, Profile, ResolvedReading,
};
use tracing::debug;

use super::deadband::DeadBandController;
use crate::DeadBands;

/// One dead-band controller per controlled channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regulator {
    thermal: DeadBandController,
    ph: DeadBandController,
    oxygen: DeadBandController,
}

impl Regulator {
    pub fn new(bands: DeadBands) -> Self {
        Self {
            thermal: DeadBandController::new(Channel::Thermal, bands.temperature),
            ph: DeadBandController::new(Channel::Ph, bands.ph),
            oxygen: DeadBandController::new(Channel::Oxygen, bands.dissolved_oxygen),
        }
    }

    pub fn controller(&self, channel: Channel) -> &DeadBandController {
        match channel {
            Channel::Thermal => &self.thermal,
            Channel::Ph => &self.ph,
            Channel::Oxygen => &self.oxygen,
        }
    }

    /// Deviations and directives of `reading` against `profile`
    pub fn evaluate(&self, profile: &Profile, reading: &ResolvedReading) -> (Deviations, Directives) {
        let deviations = Deviations::between(profile, reading);
        let directives = Directives {
            thermal: self
                .thermal
                .directive(reading.temperature, profile.target_temperature),
            ph: self.ph.directive(reading.ph, profile.target_ph),
            oxygen: self
                .oxygen
                .directive(reading.dissolved_oxygen, profile.target_dissolved_oxygen),
        };

        for (channel, directive) in directives.active() {
            debug!(
                %channel,
                %directive,
                deviation = deviations.get(channel),
                dead_band = self.controller(channel).dead_band(),
                "Correction required"
            );
        }

        (deviations, directives)
    }

    /// Directive for a single channel
    pub fn directive(&self, channel: Channel, current: f64, target: f64) -> Directive {
        self.controller(channel).directive(current, target)
    }
}

impl Default for Regulator {
    fn default() -> Self {
        Self::new(DeadBands::default())
    }
}
