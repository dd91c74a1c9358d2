//! Periodic, single-flight cycle scheduler

use std::time::Duration;

use biochamber_common::ControlSnapshot;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use super::orchestrator::ControlCycle;

/// Drives a [`ControlCycle`] on a fixed period until shutdown.
///
/// Cycles run inline in the loop task, so at most one is ever in flight.
/// Ticks missed while a cycle is still waiting on the store are skipped.
pub struct ControlLoop {
    cycle: ControlCycle,
    period: Duration,
}

impl ControlLoop {
    pub fn new(cycle: ControlCycle, period: Duration) -> Self {
        Self { cycle, period }
    }

    pub fn subscribe(&self) -> watch::Receiver<ControlSnapshot> {
        self.cycle.subscribe()
    }

    /// Run until `shutdown` turns `true` or its sender is dropped.
    ///
    /// A cycle in flight when shutdown arrives is dropped before it can
    /// publish anything.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(period_ms = self.period.as_millis() as u64, "Control loop started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown_requested(&mut shutdown) => break,
            }

            tokio::select! {
                result = self.cycle.run_once() => {
                    if let Err(e) = result {
                        if e.is_fatal() {
                            error!(error = %e, "Cycle hit a non-recoverable error");
                        }
                    }
                }
                _ = shutdown_requested(&mut shutdown) => {
                    warn!("Shutdown during an in-flight cycle; abandoning it");
                    break;
                }
            }
        }

        info!(cycles = self.cycle.cycles_started(), "Control loop stopped");
    }
}

async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use biochamber_common::{
        ControlCyclePayload, DecodedReading, FallbackPolicy, Profile,
    };
    use biochamber_regulator::Regulator;
    use biochamber_surrogate::{ForestParams, SurrogateCache, SurrogateConfig};
    use serde_json::json;

    use crate::cycle::ProfileHandle;
    use crate::infra::{ControlStore, InMemoryStore, StoreError};

    async fn fitted_surrogate() -> Arc<SurrogateCache> {
        let cache = Arc::new(SurrogateCache::new(SurrogateConfig {
            samples: 200,
            forest: ForestParams {
                n_trees: 5,
                ..Default::default()
            },
            ..Default::default()
        }));
        cache.model(&Profile::e_coli()).await.unwrap();
        cache
    }

    async fn control_loop(store: Arc<dyn ControlStore>) -> ControlLoop {
        let cycle = ControlCycle::new(
            store,
            fitted_surrogate().await,
            Regulator::default(),
            ProfileHandle::default(),
            FallbackPolicy::Zero,
        );
        ControlLoop::new(cycle, Duration::from_secs(5))
    }

    /// Store whose reads never complete
    struct StalledStore;

    #[async_trait]
    impl ControlStore for StalledStore {
        async fn fetch_reading(&self) -> Result<Option<DecodedReading>, StoreError> {
            std::future::pending().await
        }

        async fn push_payload(&self, _payload: &ControlCyclePayload) -> Result<(), StoreError> {
            Ok(())
        }

        fn describe(&self) -> String {
            "stalled".into()
        }
    }

    /// Store whose first read takes 12s; later reads are instant
    struct SlowFirstReadStore {
        inner: InMemoryStore,
        reads: AtomicU64,
    }

    #[async_trait]
    impl ControlStore for SlowFirstReadStore {
        async fn fetch_reading(&self) -> Result<Option<DecodedReading>, StoreError> {
            if self.reads.fetch_add(1, Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_secs(12)).await;
            }
            self.inner.fetch_reading().await
        }

        async fn push_payload(&self, payload: &ControlCyclePayload) -> Result<(), StoreError> {
            self.inner.push_payload(payload).await
        }

        fn describe(&self) -> String {
            "slow-first-read".into()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_missed_during_slow_cycle_are_skipped() {
        let store = Arc::new(SlowFirstReadStore {
            inner: InMemoryStore::with_reading(json!({
                "temperature": 37.0, "ph": 7.0, "dissolved_oxygen": 40.0, "optical_density": 1.0
            })),
            reads: AtomicU64::new(0),
        });
        let control = control_loop(store.clone()).await;
        let rx = control.subscribe();
        let (tx, shutdown) = watch::channel(false);
        let handle = tokio::spawn(control.run(shutdown));

        // First cycle spans 0s..12s; the 5s and 10s ticks collapse into one
        // catch-up cycle at 12s instead of two queued ones
        tokio::time::sleep(Duration::from_secs(14)).await;
        assert_eq!(rx.borrow().cycles_completed, 2);

        // Back on the 5s grid afterwards
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(rx.borrow().cycles_completed, 3);
        assert_eq!(store.reads.load(Ordering::SeqCst), 3);
        assert_eq!(store.inner.write_count(), 3);

        tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_on_period() {
        let store = Arc::new(InMemoryStore::with_reading(json!({
            "temperature": 37.0, "ph": 7.0, "dissolved_oxygen": 40.0, "optical_density": 1.0
        })));
        let control = control_loop(store.clone()).await;
        let rx = control.subscribe();
        let (tx, shutdown) = watch::channel(false);

        let handle = tokio::spawn(control.run(shutdown));
        // Ticks at 0s, 5s and 10s
        tokio::time::sleep(Duration::from_secs(11)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(rx.borrow().cycles_completed, 3);
        assert_eq!(store.write_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_before_first_tick() {
        let store = Arc::new(InMemoryStore::new());
        let control = control_loop(store.clone()).await;
        let (_tx, shutdown) = watch::channel(true);

        control.run(shutdown).await;
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_abandons_in_flight_cycle() {
        let control = control_loop(Arc::new(StalledStore)).await;
        let rx = control.subscribe();
        let (tx, shutdown) = watch::channel(false);

        let handle = tokio::spawn(control.run(shutdown));
        tokio::time::sleep(Duration::from_secs(30)).await;
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop did not stop")
            .unwrap();

        let snapshot = rx.borrow().clone();
        assert!(snapshot.payload.is_none());
        assert_eq!(snapshot.cycles_completed + snapshot.cycles_failed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_sender_stops_loop() {
        let control = control_loop(Arc::new(InMemoryStore::new())).await;
        let (tx, shutdown) = watch::channel(false);
        drop(tx);

        tokio::time::timeout(Duration::from_secs(1), control.run(shutdown))
            .await
            .expect("loop did not stop");
    }
}
