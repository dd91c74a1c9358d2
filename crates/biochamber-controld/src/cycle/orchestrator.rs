//! Control cycle orchestrator
//!
//! One cycle: snapshot profile, fetch reading, resolve fallbacks, estimate
//! efficiency, derive directives, push, publish. Publication is the last
//! step, so a cycle abandoned mid-flight leaves the published state alone.

use std::sync::Arc;

use biochamber_common::{
    BiochamberError, ControlCyclePayload, ControlSnapshot, DecodedReading, FallbackPolicy,
    Profile, ResolvedReading, Result,
};
use biochamber_regulator::Regulator;
use biochamber_surrogate::{EfficiencyModel, SurrogateCache};
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::state::ProfileHandle;
use crate::infra::ControlStore;

/// Runs control cycles and publishes their outcome
pub struct ControlCycle {
    store: Arc<dyn ControlStore>,
    surrogate: Arc<SurrogateCache>,
    regulator: Regulator,
    profile: ProfileHandle,
    fallback: FallbackPolicy,
    published: watch::Sender<ControlSnapshot>,
    last_reading: Option<ResolvedReading>,
    cycle: u64,
}

impl ControlCycle {
    pub fn new(
        store: Arc<dyn ControlStore>,
        surrogate: Arc<SurrogateCache>,
        regulator: Regulator,
        profile: ProfileHandle,
        fallback: FallbackPolicy,
    ) -> Self {
        let (published, _) = watch::channel(ControlSnapshot::default());
        Self {
            store,
            surrogate,
            regulator,
            profile,
            fallback,
            published,
            last_reading: None,
            cycle: 0,
        }
    }

    /// Receiver for the published snapshot
    pub fn subscribe(&self) -> watch::Receiver<ControlSnapshot> {
        self.published.subscribe()
    }

    /// Cycles attempted so far
    pub fn cycles_started(&self) -> u64 {
        self.cycle
    }

    /// Compute a payload without touching the store or published state.
    ///
    /// Identical inputs give identical content; only `cycle` and `at` differ
    /// between calls.
    pub fn evaluate(
        &self,
        model: &EfficiencyModel,
        profile: &Profile,
        decoded: &DecodedReading,
        cycle: u64,
        at: DateTime<Utc>,
    ) -> ControlCyclePayload {
        let fallback = self.fallback.fallback(self.last_reading.as_ref());
        let reading = decoded.reading.resolve(&fallback);
        let efficiency = model.predict(&reading.features());
        let (deviations, directives) = self.regulator.evaluate(profile, &reading);

        ControlCyclePayload {
            cycle,
            profile: profile.clone(),
            reading,
            efficiency,
            deviations,
            directives,
            degraded_fields: decoded
                .reading
                .missing_fields()
                .into_iter()
                .map(String::from)
                .collect(),
            timestamp: at,
        }
    }

    /// Run one full cycle
    #[instrument(skip(self), fields(cycle = self.cycle + 1))]
    pub async fn run_once(&mut self) -> Result<ControlCyclePayload> {
        self.cycle += 1;
        let cycle = self.cycle;
        let profile = self.profile.snapshot();

        let decoded = match self.store.fetch_reading().await {
            Ok(Some(decoded)) => decoded,
            Ok(None) => return Err(self.fail(BiochamberError::NoReading(self.store.describe()))),
            Err(e) => return Err(self.fail(e.into())),
        };

        if decoded.is_malformed() {
            let err = BiochamberError::MalformedReading(decoded.rejected.join(", "));
            warn!(error = %err, policy = ?self.fallback, "Substituting malformed fields");
        }

        let model = match self.surrogate.model(&profile).await {
            Ok(model) => model,
            Err(e) => return Err(self.fail(e)),
        };

        let payload = self.evaluate(&model, &profile, &decoded, cycle, Utc::now());
        debug!(
            efficiency = payload.efficiency,
            thermal = %payload.directives.thermal,
            ph = %payload.directives.ph,
            oxygen = %payload.directives.oxygen,
            "Cycle evaluated"
        );

        let push_error = match self.store.push_payload(&payload).await {
            Ok(()) => None,
            Err(e) => {
                let err = BiochamberError::from(e);
                warn!(error = %err, "Directive write failed; publishing anyway");
                Some(err.to_string())
            }
        };

        self.last_reading = Some(payload.reading);
        let published = payload.clone();
        self.published
            .send_modify(|snapshot| snapshot.record_success(published, push_error));

        if payload.directives.active().next().is_some() {
            info!(directives = ?payload.directives, "Corrections issued");
        }
        Ok(payload)
    }

    fn fail(&self, err: BiochamberError) -> BiochamberError {
        warn!(error = %err, "Control cycle failed");
        let message = err.to_string();
        self.published
            .send_modify(|snapshot| snapshot.record_failure(message, Utc::now()));
        err
    }
}
