//! Dead-band controller for one channel

use biochamber_common::{Channel, Correction, Directive};

/// Slack on the band edge so `7.0 - 7.2` still counts as exactly 0.2
const BAND_EPSILON: f64 = 1e-9;

/// Maps `(current, target)` to a directive with a symmetric dead band.
///
/// Stateless: each decision depends only on the deviation passed in, so a
/// value hovering on the band edge can flip between directives on
/// consecutive cycles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadBandController {
    channel: Channel,
    dead_band: f64,
}

impl DeadBandController {
    pub fn new(channel: Channel, dead_band: f64) -> Self {
        Self { channel, dead_band }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn dead_band(&self) -> f64 {
        self.dead_band
    }

    /// `d = target - current`; strictly outside the band corrects, on the
    /// edge stays stable
    pub fn correction(&self, current: f64, target: f64) -> Correction {
        let deviation = target - current;
        if deviation > self.dead_band + BAND_EPSILON {
            Correction::Raise
        } else if deviation < -self.dead_band - BAND_EPSILON {
            Correction::Lower
        } else {
            Correction::Stable
        }
    }

    pub fn directive(&self, current: f64, target: f64) -> Directive {
        Directive::for_channel(self.channel, self.correction(current, target))
    }
}
