//! Control Store
//!
//! Minimal read/write contract with the external store: read the latest
//! sensor reading, write the cycle payload as a partial update.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use biochamber_common::{BiochamberError, ControlCyclePayload, DecodedReading, SensorReading};
use parking_lot::RwLock;
use serde_json::Value;

/// Trait for external store backends
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ControlStore: Send + Sync {
    /// Latest reading, or `None` when the store holds no data
    async fn fetch_reading(&self) -> Result<Option<DecodedReading>, StoreError>;

    /// Partial update of the directive document
    async fn push_payload(&self, payload: &ControlCyclePayload) -> Result<(), StoreError>;

    /// Where readings come from, for logs and error messages
    fn describe(&self) -> String;
}

/// Errors from store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Unexpected status {status} from {path}")]
    Status { status: u16, path: String },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for BiochamberError {
    fn from(err: StoreError) -> Self {
        BiochamberError::StoreUnavailable(err.to_string())
    }
}

/// In-memory store
///
/// Holds one reading document and the last directive document. Reads and
/// writes can be made to fail on demand.
pub struct InMemoryStore {
    reading: RwLock<Value>,
    directives: RwLock<Option<Value>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicU64,
}

impl InMemoryStore {
    /// Create an empty store (no reading yet)
    pub fn new() -> Self {
        Self {
            reading: RwLock::new(Value::Null),
            directives: RwLock::new(None),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            writes: AtomicU64::new(0),
        }
    }

    /// Store seeded with a reading document
    pub fn with_reading(reading: Value) -> Self {
        let store = Self::new();
        store.set_reading(reading);
        store
    }

    pub fn set_reading(&self, reading: Value) {
        *self.reading.write() = reading;
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Directive document as last written
    pub fn directives(&self) -> Option<Value> {
        self.directives.read().clone()
    }

    /// Successful writes so far
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ControlStore for InMemoryStore {
    async fn fetch_reading(&self) -> Result<Option<DecodedReading>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads disabled".into()));
        }
        Ok(SensorReading::decode(&self.reading.read()))
    }

    async fn push_payload(&self, payload: &ControlCyclePayload) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }

        let update = payload.store_document();
        let mut directives = self.directives.write();
        match (&mut *directives, update) {
            (Some(Value::Object(existing)), Value::Object(fields)) => existing.extend(fields),
            (slot, update) => *slot = Some(update),
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory://live_readings".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biochamber_common::{Directives, Profile, ResolvedReading};
    use chrono::Utc;
    use serde_json::json;

    fn payload(cycle: u64) -> ControlCyclePayload {
        ControlCyclePayload {
            cycle,
            profile: Profile::e_coli(),
            reading: ResolvedReading::ZERO,
            efficiency: 0.5,
            deviations: Default::default(),
            directives: Directives::STABLE,
            degraded_fields: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_empty_store_has_no_reading() {
        let store = InMemoryStore::new();
        assert!(store.fetch_reading().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_decodes_reading() {
        let store = InMemoryStore::with_reading(json!({"temperature": 36.9, "ph": "bad"}));
        let decoded = store.fetch_reading().await.unwrap().unwrap();
        assert_eq!(decoded.reading.temperature, Some(36.9));
        assert_eq!(decoded.rejected, vec!["ph".to_string()]);
    }

    #[tokio::test]
    async fn test_push_merges_fields() {
        let store = InMemoryStore::new();
        *store.directives.write() = Some(json!({"operator_note": "keep"}));

        store.push_payload(&payload(1)).await.unwrap();
        store.push_payload(&payload(2)).await.unwrap();

        let doc = store.directives().unwrap();
        assert_eq!(doc["operator_note"], "keep");
        assert_eq!(doc["cycle"], 2);
        assert_eq!(doc["thermal"], "STABLE");
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = InMemoryStore::with_reading(json!({}));
        store.set_fail_reads(true);
        assert!(store.fetch_reading().await.is_err());

        store.set_fail_writes(true);
        let err = store.push_payload(&payload(1)).await.unwrap_err();
        assert!(BiochamberError::from(err).to_string().contains("writes disabled"));
        assert_eq!(store.write_count(), 0);
    }
}
