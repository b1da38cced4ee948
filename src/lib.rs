//! ecotune library crate
//!
//! Exposes the tuning-loop modules so integration tests and external
//! tooling can drive them without going through CLI startup.

pub mod balance;
pub mod config;
pub mod context;
pub mod counts;
pub mod llm;
pub mod patch;
pub mod report;
pub mod sim;
pub mod tuner;
