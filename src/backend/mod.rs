//! Lead Service Abstraction
//!
//! The funnel persists its progress through five operations on an opaque
//! lead service. Every response uses the same envelope:
//! `{"ok": true, ...}` on success, `{"ok": false, "error": "..."}` otherwise.

mod http;
mod memory;

pub use http::HttpBackend;
pub use memory::{InMemoryBackend, LeadRecord, Operation};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::funnel::{Channel, GoalTemplate, Timeframe};

/// Input for `startLead`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartLeadRequest {
    pub clinic_id: String,
    pub clinic_slug: String,
    pub page_context: String,
}

/// Output of `startLead`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedLead {
    pub lead_id: String,
    /// Country the service geolocated the visitor to, if any
    #[serde(default)]
    pub country: Option<String>,
}

/// Partial lead fields for `saveStep`; unset fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_selected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_context_final: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<Timeframe>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_template: Option<GoalTemplate>,
}

impl StepUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// The lead service the funnel talks to
#[async_trait]
pub trait LeadBackend: Send + Sync {
    /// Create a lead record for this visit
    async fn start_lead(&self, request: StartLeadRequest) -> Result<StartedLead, BackendError>;

    /// Persist answers collected so far
    async fn save_step(&self, lead_id: &str, update: StepUpdate) -> Result<(), BackendError>;

    /// Send a one-time code to `phone`
    async fn send_otp(&self, lead_id: &str, phone: &str) -> Result<(), BackendError>;

    /// Check the code the visitor typed
    async fn verify_otp(&self, lead_id: &str, phone: &str, code: &str)
    -> Result<(), BackendError>;

    /// Record the channel chosen at handoff
    async fn set_channel(&self, lead_id: &str, channel: Channel) -> Result<(), BackendError>;

    /// Backend name for logs
    fn name(&self) -> &str;
}

/// Decode a response envelope into `T`.
pub(crate) fn parse_envelope<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, BackendError> {
    let ok = value
        .get("ok")
        .and_then(serde_json::Value::as_bool)
        .ok_or_else(|| BackendError::Decode("missing \"ok\" field".to_string()))?;

    if !ok {
        let message = value
            .get("error")
            .and_then(serde_json::Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or("Something went wrong, please try again")
            .to_string();
        return Err(BackendError::Rejected(message));
    }

    serde_json::from_value(value).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Success payload of operations that return nothing
#[derive(Debug, Deserialize)]
pub(crate) struct Ack {}
