pub mod config;
pub mod control_system;
pub mod error;
pub mod global_variables;
pub mod models;
pub mod monitoring;
pub mod simulation;

pub use error::{Result, SignalError};
