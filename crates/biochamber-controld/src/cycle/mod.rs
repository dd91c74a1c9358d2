//! Control cycle: orchestration, scheduling, and shared state

pub mod orchestrator;
pub mod scheduler;
pub mod state;

pub use orchestrator::ControlCycle;
pub use scheduler::ControlLoop;
pub use state::ProfileHandle;
