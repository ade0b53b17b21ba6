//! Funnel controller
//!
//! `LeadFunnel` owns one funnel session. Each operation checks its
//! preconditions, talks to the lead service, and feeds the outcome to the
//! reducer. Verification failures land in `state.error`; step-data saves
//! only log.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use super::message::{MessageParts, build_message, resolve_handoff};
use super::navigator::Navigator;
use super::reducer::{FunnelAction, reduce};
use super::state::{FunnelSeed, FunnelState};
use super::types::*;
use crate::backend::{LeadBackend, StartLeadRequest, StepUpdate};
use crate::config::ClinicConfig;
use crate::error::{BackendError, FunnelError, Result};
use crate::geo::GeoHint;
use crate::otp::{is_complete_code, is_valid_e164, mask_phone};

/// One funnel session bound to a lead service.
///
/// Operations take `&self`, so a host can share the funnel through an
/// `Arc` and run calls on spawned tasks while it keeps rendering. The
/// `loading` flag rejects a second blocking call while one is in flight.
pub struct LeadFunnel {
    state: Mutex<FunnelState>,
    backend: Arc<dyn LeadBackend>,
    clinic: ClinicConfig,
    navigator: Arc<dyn Navigator>,
    cancel: CancellationToken,
    /// Serializes lead creation so concurrent saves never start two leads
    lead_gate: tokio::sync::Mutex<()>,
}

impl LeadFunnel {
    pub fn new(
        seed: FunnelSeed,
        geo: GeoHint,
        backend: Arc<dyn LeadBackend>,
        clinic: ClinicConfig,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        tracing::debug!(
            "[funnel] new session context={:?} backend={}",
            seed.page_context,
            backend.name()
        );
        Self {
            state: Mutex::new(FunnelState::new(seed, geo)),
            backend,
            clinic,
            navigator,
            cancel: CancellationToken::new(),
            lead_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> FunnelState {
        self.lock().clone()
    }

    pub fn clinic(&self) -> &ClinicConfig {
        &self.clinic
    }

    /// Apply `action` unless the funnel has been unmounted
    pub fn dispatch(&self, action: FunnelAction) {
        if self.cancel.is_cancelled() {
            tracing::debug!("[funnel] dropped {:?} after unmount", action);
            return;
        }
        reduce(&mut self.lock(), action);
    }

    /// Tear the session down. In-flight calls resolve to
    /// `FunnelError::Unmounted` and later dispatches are dropped.
    pub fn unmount(&self) {
        tracing::debug!("[funnel] unmount");
        self.cancel.cancel();
    }

    pub fn is_mounted(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Token that unmounts this funnel when cancelled
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    // ─── Operations ──────────────────────────────────────────

    /// "Yes": make sure a lead exists, then move on to the timeframe.
    ///
    /// Without a lead nothing later can be saved, so a failed `startLead`
    /// is shown and the funnel stays put.
    pub async fn entry_yes(&self) -> Result<()> {
        self.begin(|s| s.step == FunnelStep::Entry, "entry_yes")?;
        match self.ensure_lead(None).await {
            Ok(_) => {
                self.dispatch(FunnelAction::EntryConfirmed);
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    /// "Not exactly": open the category detour
    pub fn entry_no(&self) -> Result<()> {
        self.require(|s| s.step == FunnelStep::Entry && !s.loading, "entry_no")?;
        self.dispatch(FunnelAction::EntryDeclined);
        Ok(())
    }

    /// Category picked in the detour. The choice is saved first, then the
    /// funnel returns to the entry question; a failed save is only logged.
    pub async fn submit_category(&self, category: &str, label: &str, note: &str) -> Result<()> {
        self.begin(|s| s.step == FunnelStep::Category, "submit_category")?;

        let label = match label.trim() {
            "" => category_by_slug(category)
                .map(|c| c.label)
                .unwrap_or(category)
                .to_string(),
            label => label.to_string(),
        };
        let note = note.trim().to_string();

        let update = StepUpdate {
            category_selected: Some(category.to_string()),
            page_context_final: Some(label.clone()),
            extra_details: Some(note.clone()),
            ..Default::default()
        };
        self.save_quietly(update, true).await?;

        self.dispatch(FunnelAction::CategorySubmitted {
            category: category.to_string(),
            label,
            note,
        });
        Ok(())
    }

    pub async fn select_timeframe(&self, timeframe: Timeframe) -> Result<()> {
        self.begin(|s| s.step == FunnelStep::Timeframe, "select_timeframe")?;
        let update = StepUpdate {
            timeframe: Some(timeframe),
            ..Default::default()
        };
        self.save_quietly(update, true).await?;
        self.dispatch(FunnelAction::TimeframeSelected(timeframe));
        Ok(())
    }

    /// Goal and free-text details. Saved only if a lead already exists.
    /// Empty details keep whatever the category detour collected.
    pub async fn submit_goal(&self, goal: GoalTemplate, details: &str) -> Result<()> {
        self.begin(|s| s.step == FunnelStep::Goal, "submit_goal")?;

        let details = match details.trim() {
            "" => self.read(|s| s.extra_details.clone()),
            details => details.to_string(),
        };
        let update = StepUpdate {
            goal_template: Some(goal),
            extra_details: Some(details.clone()),
            ..Default::default()
        };
        self.save_quietly(update, false).await?;
        self.dispatch(FunnelAction::GoalSubmitted { goal, details });
        Ok(())
    }

    /// Record the phone number as typed (dial code included)
    pub fn set_phone(&self, phone: impl Into<String>) {
        self.dispatch(FunnelAction::PhoneChanged(phone.into()));
    }

    /// Send a one-time code to the current phone number.
    ///
    /// Also serves "resend" from the code entry. Returns `true` when the
    /// code went out; the caller then clears its code cells and restarts
    /// the resend countdown.
    pub async fn send_code(&self) -> Result<bool> {
        self.begin(|s| s.step == FunnelStep::Verify, "send_code")?;

        let phone = self.read(|s| s.phone.clone());
        if !is_valid_e164(&phone) {
            self.dispatch(FunnelAction::RequestFailed(
                "Please enter a valid phone number".to_string(),
            ));
            return Ok(false);
        }

        // One recovery attempt if the entry step never got a lead
        let lead_id = match self.ensure_lead(None).await {
            Ok(id) => id,
            Err(e) => return self.fail(e).map(|_| false),
        };

        tracing::info!("[funnel] sending code to {}", mask_phone(&phone));
        match self.call(self.backend.send_otp(&lead_id, &phone)).await {
            Ok(()) => {
                self.dispatch(FunnelAction::CodeSent);
                Ok(true)
            }
            Err(e) => self.fail(e).map(|_| false),
        }
    }

    /// Check a complete code. Returns `true` once the phone is verified;
    /// on `false` the caller clears its code cells for another try.
    pub async fn verify_code(&self, code: &str) -> Result<bool> {
        if !is_complete_code(code) {
            // RequestFailed clears `loading`, so never while a call is out
            self.require(|s| s.step == FunnelStep::Verify && !s.loading, "verify_code")?;
            self.dispatch(FunnelAction::RequestFailed(
                "Enter the 6-digit code we sent you".to_string(),
            ));
            return Ok(false);
        }

        self.begin(
            |s| {
                s.step == FunnelStep::Verify
                    && s.verify_sub_state == VerifySubState::CodeEntry
                    && s.lead_id.is_some()
            },
            "verify_code",
        )?;
        let (lead_id, phone) = self.read(|s| (s.lead_id.clone().unwrap_or_default(), s.phone.clone()));

        match self.call(self.backend.verify_otp(&lead_id, &phone, code)).await {
            Ok(()) => {
                tracing::info!("[funnel] phone {} verified", mask_phone(&phone));
                self.dispatch(FunnelAction::PhoneVerified);
                Ok(true)
            }
            Err(e) => self.fail(e).map(|_| false),
        }
    }

    /// "Change number": back to the phone field, number kept
    pub fn back_to_phone(&self) -> Result<()> {
        self.require(
            |s| s.step == FunnelStep::Verify && !s.loading,
            "back_to_phone",
        )?;
        self.dispatch(FunnelAction::BackToPhone);
        Ok(())
    }

    /// Terminal step: persist the channel, compose the message and open the
    /// channel's link.
    pub async fn select_channel(&self, channel: Channel) -> Result<()> {
        self.begin(
            |s| s.step == FunnelStep::Channel && s.phone_verified && s.lead_id.is_some(),
            "select_channel",
        )?;
        let lead_id = self.read(|s| s.lead_id.clone().unwrap_or_default());

        match self.call(self.backend.set_channel(&lead_id, channel)).await {
            Ok(()) => {}
            Err(FunnelError::Backend(e)) => {
                tracing::warn!("[funnel] setChannel failed for {}: {}", lead_id, e);
            }
            Err(e) => return Err(e),
        }

        let message = self.read(|s| build_message(&MessageParts::from(s)));
        let handoff = match resolve_handoff(
            channel,
            &self.clinic.contact,
            &self.clinic.name,
            message,
        ) {
            Ok(handoff) => handoff,
            Err(e) => return self.fail(e.into()),
        };

        self.ensure_mounted()?;
        if let HandoffAction::Open { ref url, target } = handoff.action
            && let Err(e) = self.navigator.open(url, target)
        {
            // The link is still shown on the completion screen
            tracing::warn!("[funnel] could not open {} link: {:#}", channel.label(), e);
        }

        tracing::info!("[funnel] lead {} handed off via {}", lead_id, channel.as_str());
        self.dispatch(FunnelAction::ChannelSelected(handoff));
        Ok(())
    }

    // ─── Internals ───────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, FunnelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<R>(&self, f: impl FnOnce(&FunnelState) -> R) -> R {
        f(&self.lock())
    }

    fn ensure_mounted(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(FunnelError::Unmounted);
        }
        Ok(())
    }

    fn require(&self, allowed: impl FnOnce(&FunnelState) -> bool, op: &'static str) -> Result<()> {
        self.ensure_mounted()?;
        if !self.read(allowed) {
            tracing::debug!("[funnel] {} not allowed in {:?}", op, self.read(|s| s.step));
            return Err(FunnelError::Precondition(op));
        }
        Ok(())
    }

    /// Check preconditions and raise `loading` in one step
    fn begin(&self, allowed: impl FnOnce(&FunnelState) -> bool, op: &'static str) -> Result<()> {
        self.ensure_mounted()?;
        let mut state = self.lock();
        if state.loading || !allowed(&state) {
            tracing::debug!("[funnel] {} not allowed in {:?}", op, state.step);
            return Err(FunnelError::Precondition(op));
        }
        reduce(&mut state, FunnelAction::RequestStarted);
        Ok(())
    }

    /// Show a user-facing failure; pass everything else up
    fn fail(&self, error: FunnelError) -> Result<()> {
        match error {
            FunnelError::Backend(_) | FunnelError::Contact(_) => {
                tracing::warn!("[funnel] {}", error);
                self.dispatch(FunnelAction::RequestFailed(error.to_string()));
                Ok(())
            }
            other => Err(other),
        }
    }

    /// Run a backend call unless the funnel is unmounted first
    async fn call<T>(
        &self,
        fut: impl Future<Output = std::result::Result<T, BackendError>>,
    ) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(FunnelError::Unmounted),
            result = fut => result.map_err(FunnelError::from),
        }
    }

    /// The current lead id, creating the lead on first use. `page_context`
    /// overrides the state's final context for a context not yet dispatched.
    async fn ensure_lead(&self, page_context: Option<&str>) -> Result<String> {
        let _gate = self.lead_gate.lock().await;
        if let Some(id) = self.read(|s| s.lead_id.clone()) {
            return Ok(id);
        }

        let request = StartLeadRequest {
            clinic_id: self.clinic.id.clone(),
            clinic_slug: self.clinic.slug.clone(),
            page_context: match page_context {
                Some(context) => context.to_string(),
                None => self.read(|s| s.page_context_final.clone()),
            },
        };
        let started = self.call(self.backend.start_lead(request)).await?;
        tracing::info!(
            "[funnel] lead {} started via {}",
            started.lead_id,
            self.backend.name()
        );
        self.dispatch(FunnelAction::LeadStarted {
            lead_id: started.lead_id,
            country: started.country,
        });
        self.read(|s| s.lead_id.clone()).ok_or(FunnelError::Unmounted)
    }

    /// Persist step data. Failures are logged and otherwise ignored.
    async fn save_quietly(&self, update: StepUpdate, create_lead: bool) -> Result<()> {
        let lead_id = if create_lead {
            match self.ensure_lead(update.page_context_final.as_deref()).await {
                Ok(id) => Some(id),
                Err(FunnelError::Backend(e)) => {
                    tracing::warn!("[funnel] could not start lead, step not saved: {}", e);
                    None
                }
                Err(e) => return Err(e),
            }
        } else {
            self.read(|s| s.lead_id.clone())
        };

        let Some(lead_id) = lead_id else {
            tracing::debug!("[funnel] no lead yet, skipping save {:?}", update);
            return Ok(());
        };

        match self.call(self.backend.save_step(&lead_id, update)).await {
            Ok(()) => Ok(()),
            Err(FunnelError::Backend(e)) => {
                tracing::warn!("[funnel] saveStep failed for {}: {}", lead_id, e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
