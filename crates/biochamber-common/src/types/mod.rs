//! Core data types for the BioChamber control loop

pub mod directive;
pub mod payload;
pub mod profile;
pub mod reading;
