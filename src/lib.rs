//! leadfunnel - Clinic lead capture in the terminal
//!
//! A five-step funnel that qualifies a visitor, verifies their phone number
//! with a one-time code, and hands the conversation off to the clinic over
//! WhatsApp, SMS or email with a prefilled summary.
//!
//! ## Quick Start
//!
//! ```bash
//! # Try it without a lead service (code is 123456)
//! leadfunnel run --demo --context "Dental implants"
//!
//! # Print a handoff link without running the funnel
//! leadfunnel link --channel whatsapp --timeframe asap --goal price_quote
//! ```

pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod funnel;
pub mod geo;
pub mod logging;
pub mod otp;
pub mod tui;

// Re-export commonly used types
pub use error::{BackendError, ContactError, FunnelError};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
