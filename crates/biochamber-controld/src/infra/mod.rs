//! Store adapters

pub mod firebase;
pub mod store;

use std::sync::Arc;

use biochamber_common::{BiochamberError, Result};
use serde_json::json;

use crate::config::{StoreBackend, StoreSettings};

pub use firebase::FirebaseStore;
pub use store::{ControlStore, InMemoryStore, StoreError};

/// Build the configured store backend
pub fn build_store(settings: &StoreSettings) -> Result<Arc<dyn ControlStore>> {
    match settings.backend {
        StoreBackend::Firebase => {
            if settings.base_url.is_empty() {
                return Err(BiochamberError::Config(
                    "store.base_url is required for the firebase backend".into(),
                ));
            }
            Ok(Arc::new(FirebaseStore::new(settings)?))
        }
        StoreBackend::Memory => Ok(Arc::new(InMemoryStore::with_reading(json!({
            "temperature": 37.2,
            "ph": 7.1,
            "dissolved_oxygen": 45,
            "optical_density": 1.5
        })))),
    }
}
