//! Directive controllers
pub mod deadband;
pub mod regulator;

pub use self::deadband::DeadBandController;
pub use self::regulator::Regulator;
