//! Configuration Module
//!
//! Handles loading, validation, and saving of the funnel configuration.

pub mod secrets;
mod types;

pub use secrets::SecretString;
pub use types::*;
