//! # BioChamber Control Daemon
//!
//! Closed control loop for a bioreactor: every tick the daemon reads the
//! live sensor document from the store, estimates growth efficiency with
//! the fitted surrogate, derives one directive per actuator channel, and
//! writes the result back.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                     biochamber-controld                   │
//! │                                                           │
//! │  ControlLoop ──tick──> ControlCycle ──watch──> API (axum) │
//! │                          │     │   │                      │
//! │              ProfileHandle   Regulator   SurrogateCache   │
//! │                          │                                │
//! │                    ControlStore                           │
//! │             (Firebase REST / in-memory)                   │
//! └───────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod cycle;
pub mod infra;

pub use config::ControlConfig;
pub use cycle::{ControlCycle, ControlLoop, ProfileHandle};
pub use infra::{build_store, ControlStore, FirebaseStore, InMemoryStore, StoreError};

/// Daemon version
pub const CONTROLD_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default control cycle period in milliseconds
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 5_000;
