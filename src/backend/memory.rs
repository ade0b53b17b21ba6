//! In-process lead service for `--demo` runs and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use tokio::sync::Mutex;

use super::{LeadBackend, StartLeadRequest, StartedLead, StepUpdate};
use crate::error::BackendError;
use crate::funnel::{Channel, GoalTemplate, Timeframe};
use crate::otp::{is_valid_e164, mask_phone};

/// Backend operation, for call counting and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    StartLead,
    SaveStep,
    SendOtp,
    VerifyOtp,
    SetChannel,
}

/// A lead as the in-memory service stores it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadRecord {
    pub id: String,
    pub clinic_slug: String,
    pub page_context: String,
    pub category_selected: Option<String>,
    pub page_context_final: Option<String>,
    pub extra_details: Option<String>,
    pub timeframe: Option<Timeframe>,
    pub goal_template: Option<GoalTemplate>,
    pub phone: Option<String>,
    pub phone_verified: bool,
    pub channel: Option<Channel>,
    pub created_at: DateTime<Utc>,
}

impl LeadRecord {
    fn new(request: StartLeadRequest) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            clinic_slug: request.clinic_slug,
            page_context: request.page_context,
            category_selected: None,
            page_context_final: None,
            extra_details: None,
            timeframe: None,
            goal_template: None,
            phone: None,
            phone_verified: false,
            channel: None,
            created_at: Utc::now(),
        }
    }

    fn apply(&mut self, update: StepUpdate) {
        if update.category_selected.is_some() {
            self.category_selected = update.category_selected;
        }
        if update.page_context_final.is_some() {
            self.page_context_final = update.page_context_final;
        }
        if update.extra_details.is_some() {
            self.extra_details = update.extra_details;
        }
        if update.timeframe.is_some() {
            self.timeframe = update.timeframe;
        }
        if update.goal_template.is_some() {
            self.goal_template = update.goal_template;
        }
    }
}

#[derive(Default)]
struct Inner {
    leads: HashMap<String, LeadRecord>,
    /// Outstanding code per lead, with the phone it was sent to
    codes: HashMap<String, (String, String)>,
    calls: HashMap<Operation, usize>,
    failures: HashMap<Operation, String>,
}

/// Lead service kept entirely in memory.
///
/// Codes are random unless a fixed one is configured. Any operation can be
/// made to fail with a given message.
pub struct InMemoryBackend {
    inner: Mutex<Inner>,
    fixed_code: Option<String>,
    country: Option<String>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            fixed_code: None,
            country: None,
        }
    }

    /// Always send this code instead of a random one
    pub fn with_fixed_code(mut self, code: impl Into<String>) -> Self {
        self.fixed_code = Some(code.into());
        self
    }

    /// Country reported back from `startLead`
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Make `op` fail with `message` until cleared
    pub async fn fail(&self, op: Operation, message: impl Into<String>) {
        self.inner.lock().await.failures.insert(op, message.into());
    }

    pub async fn clear_failure(&self, op: Operation) {
        self.inner.lock().await.failures.remove(&op);
    }

    /// Number of times `op` was called, failed calls included
    pub async fn calls(&self, op: Operation) -> usize {
        self.inner.lock().await.calls.get(&op).copied().unwrap_or(0)
    }

    pub async fn lead(&self, id: &str) -> Option<LeadRecord> {
        self.inner.lock().await.leads.get(id).cloned()
    }

    /// Code currently outstanding for `lead_id` (demo hint)
    pub async fn pending_code(&self, lead_id: &str) -> Option<String> {
        self.inner
            .lock()
            .await
            .codes
            .get(lead_id)
            .map(|(code, _)| code.clone())
    }

    fn generate_code(&self) -> String {
        match self.fixed_code {
            Some(ref code) => code.clone(),
            None => format!("{:06}", rand::rng().random_range(0..1_000_000)),
        }
    }
}

impl Inner {
    /// Count the call, then fail it if a failure is injected
    fn enter(&mut self, op: Operation) -> Result<(), BackendError> {
        *self.calls.entry(op).or_insert(0) += 1;
        match self.failures.get(&op) {
            Some(message) => Err(BackendError::Rejected(message.clone())),
            None => Ok(()),
        }
    }

    fn lead_mut(&mut self, id: &str) -> Result<&mut LeadRecord, BackendError> {
        self.leads
            .get_mut(id)
            .ok_or_else(|| BackendError::Rejected("Unknown lead".to_string()))
    }
}

#[async_trait]
impl LeadBackend for InMemoryBackend {
    async fn start_lead(&self, request: StartLeadRequest) -> Result<StartedLead, BackendError> {
        let mut inner = self.inner.lock().await;
        inner.enter(Operation::StartLead)?;

        let record = LeadRecord::new(request);
        let lead_id = record.id.clone();
        tracing::debug!("[memory] startLead -> {}", lead_id);
        inner.leads.insert(lead_id.clone(), record);

        Ok(StartedLead {
            lead_id,
            country: self.country.clone(),
        })
    }

    async fn save_step(&self, lead_id: &str, update: StepUpdate) -> Result<(), BackendError> {
        let mut inner = self.inner.lock().await;
        inner.enter(Operation::SaveStep)?;
        inner.lead_mut(lead_id)?.apply(update);
        Ok(())
    }

    async fn send_otp(&self, lead_id: &str, phone: &str) -> Result<(), BackendError> {
        let mut inner = self.inner.lock().await;
        inner.enter(Operation::SendOtp)?;

        if !is_valid_e164(phone) {
            return Err(BackendError::Rejected(
                "Please enter a valid phone number".to_string(),
            ));
        }
        let lead = inner.lead_mut(lead_id)?;
        lead.phone = Some(phone.to_string());
        lead.phone_verified = false;

        let code = self.generate_code();
        tracing::info!("[memory] code for {} is {}", mask_phone(phone), code);
        inner
            .codes
            .insert(lead_id.to_string(), (code, phone.to_string()));
        Ok(())
    }

    async fn verify_otp(&self, lead_id: &str, phone: &str, code: &str) -> Result<(), BackendError> {
        let mut inner = self.inner.lock().await;
        inner.enter(Operation::VerifyOtp)?;

        let matches = inner
            .codes
            .get(lead_id)
            .is_some_and(|(expected, sent_to)| expected == code && sent_to == phone);
        if !matches {
            return Err(BackendError::Rejected(
                "That code is not right. Please try again.".to_string(),
            ));
        }

        inner.codes.remove(lead_id);
        inner.lead_mut(lead_id)?.phone_verified = true;
        Ok(())
    }

    async fn set_channel(&self, lead_id: &str, channel: Channel) -> Result<(), BackendError> {
        let mut inner = self.inner.lock().await;
        inner.enter(Operation::SetChannel)?;

        let lead = inner.lead_mut(lead_id)?;
        if !lead.phone_verified {
            return Err(BackendError::Rejected("Phone is not verified".to_string()));
        }
        lead.channel = Some(channel);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
