//! Error types
//!
//! Typed errors for the funnel and its collaborators. Application plumbing
//! (config files, CLI) uses `anyhow` instead.

use thiserror::Error;

/// Failure of a single backend round-trip.
///
/// `Rejected` carries the server-provided message and displays it verbatim,
/// since it is shown inline next to the control that triggered the call.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Rejected(String),

    #[error("Unexpected response from lead service: {0}")]
    Decode(String),
}

/// Clinic contact configuration cannot serve the requested channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContactError {
    #[error("This clinic has no WhatsApp number configured")]
    MissingWhatsAppNumber,

    #[error("This clinic has no SMS number configured")]
    MissingSmsNumber,

    #[error("This clinic has no email address configured")]
    MissingEmail,

    #[error("Invalid phone number in clinic configuration: {0}")]
    InvalidNumber(String),
}

/// Errors returned by funnel operations.
///
/// Backend failures the user should see are recorded in the funnel state
/// rather than returned; what comes back here is misuse of the API or the
/// funnel having been torn down.
#[derive(Debug, Error)]
pub enum FunnelError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Contact(#[from] ContactError),

    #[error("Operation not allowed: {0}")]
    Precondition(&'static str),

    #[error("Funnel was closed")]
    Unmounted,
}

pub type Result<T> = std::result::Result<T, FunnelError>;
