//! TUI application state
//!
//! Routes key presses to the widget of the current step and runs the
//! resulting funnel operations on spawned tasks. Their outcomes come back
//! through a channel so the loop keeps drawing while a call is in flight.

use std::future::Future;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use super::steps::*;
use super::verify::VerifyPhone;
use crate::error::FunnelError;
use crate::funnel::{FunnelState, FunnelStep, LeadFunnel};

/// Result of a funnel call run in the background
#[derive(Debug)]
pub enum CallOutcome {
    CodeSent(Result<bool, FunnelError>),
    Verified(Result<bool, FunnelError>),
    Finished(&'static str, Result<(), FunnelError>),
}

pub struct FunnelApp {
    pub funnel: Arc<LeadFunnel>,

    pub entry: EntryQuestion,
    pub category: CategorySelect,
    pub timeframe: TimeHorizon,
    pub goal: GoalSelect,
    pub verify: VerifyPhone,
    pub channel: ChannelHandoff,

    /// Code to show on the verify step in demo mode
    pub demo_code: Option<String>,
    pub should_quit: bool,

    outcome_tx: mpsc::UnboundedSender<CallOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<CallOutcome>,
}

impl FunnelApp {
    pub fn new(funnel: Arc<LeadFunnel>, default_country: &str, cooldown_secs: u32) -> Self {
        let state = funnel.state();
        let country = state.country.as_deref().unwrap_or(default_country);

        let mut category = CategorySelect::default();
        category.preselect(state.category_selected.as_deref());

        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            funnel,
            entry: EntryQuestion::default(),
            category,
            timeframe: TimeHorizon::default(),
            goal: GoalSelect::default(),
            verify: VerifyPhone::new(country, cooldown_secs),
            channel: ChannelHandoff::default(),
            demo_code: None,
            should_quit: false,
            outcome_tx,
            outcome_rx,
        }
    }

    pub fn with_demo_code(mut self, code: impl Into<String>) -> Self {
        self.demo_code = Some(code.into());
        self
    }

    pub fn state(&self) -> FunnelState {
        self.funnel.state()
    }

    pub fn quit(&mut self) {
        self.funnel.unmount();
        self.should_quit = true;
    }

    pub fn handle_key(&mut self, event: KeyEvent) {
        if event.code == KeyCode::Char('c') && event.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit();
            return;
        }

        let state = self.state();
        let selector_open = self.verify.phone.selector_open;

        if event.code == KeyCode::Esc && !(state.step == FunnelStep::Verify && selector_open) {
            self.quit();
            return;
        }

        let step_event = match state.step {
            FunnelStep::Entry => self.entry.handle_key(event),
            FunnelStep::Category => self.category.handle_key(event),
            FunnelStep::Timeframe => self.timeframe.handle_key(event),
            FunnelStep::Goal => self.goal.handle_key(event),
            FunnelStep::Verify => {
                self.verify
                    .handle_key(state.verify_sub_state, state.loading, event)
            }
            FunnelStep::Channel => self.channel.handle_key(&state.channel_order(), event),
            FunnelStep::Completed => {
                if matches!(event.code, KeyCode::Enter | KeyCode::Char('q')) {
                    self.quit();
                }
                None
            }
        };

        if let Some(step_event) = step_event {
            self.on_step_event(step_event);
        }
    }

    pub fn handle_paste(&mut self, text: &str) {
        let state = self.state();
        let step_event = match state.step {
            FunnelStep::Category => {
                self.category.handle_paste(text);
                None
            }
            FunnelStep::Goal => {
                self.goal.handle_paste(text);
                None
            }
            FunnelStep::Verify => {
                self.verify
                    .handle_paste(state.verify_sub_state, state.loading, text)
            }
            _ => None,
        };
        if let Some(step_event) = step_event {
            self.on_step_event(step_event);
        }
    }

    /// One-second tick from the runner
    pub fn tick(&mut self) {
        self.verify.tick();
    }

    /// Wait for the next background call to finish
    pub async fn next_outcome(&mut self) -> Option<CallOutcome> {
        self.outcome_rx.recv().await
    }

    pub fn apply_outcome(&mut self, outcome: CallOutcome) {
        match outcome {
            CallOutcome::CodeSent(Ok(true)) => self.verify.on_code_sent(),
            CallOutcome::Verified(Ok(false)) => self.verify.on_code_rejected(),
            CallOutcome::CodeSent(Ok(false))
            | CallOutcome::Verified(Ok(true))
            | CallOutcome::Finished(_, Ok(())) => {}
            CallOutcome::CodeSent(Err(e))
            | CallOutcome::Verified(Err(e))
            | CallOutcome::Finished(_, Err(e)) => log_call_error(e),
        }

        let state = self.state();
        if state.step == FunnelStep::Verify
            && let Some(event) = self
                .verify
                .resume_submission(state.verify_sub_state, state.loading)
        {
            self.on_step_event(event);
        }
    }

    fn on_step_event(&mut self, event: StepEvent) {
        tracing::debug!("[tui] {:?}", event);
        match event {
            StepEvent::EntryYes => self.spawn_call(|f| async move {
                CallOutcome::Finished("entry_yes", f.entry_yes().await)
            }),
            StepEvent::EntryNo => {
                if let Err(e) = self.funnel.entry_no() {
                    log_call_error(e);
                }
            }
            StepEvent::CategorySubmit {
                category,
                label,
                note,
            } => self.spawn_call(|f| async move {
                let result = f.submit_category(&category, &label, &note).await;
                CallOutcome::Finished("submit_category", result)
            }),
            StepEvent::TimeframeSelect(timeframe) => self.spawn_call(move |f| async move {
                CallOutcome::Finished("select_timeframe", f.select_timeframe(timeframe).await)
            }),
            StepEvent::GoalSubmit { goal, details } => self.spawn_call(move |f| async move {
                CallOutcome::Finished("submit_goal", f.submit_goal(goal, &details).await)
            }),
            StepEvent::PhoneChanged(phone) => self.funnel.set_phone(phone),
            StepEvent::SendCode => self.spawn_call(|f| async move {
                CallOutcome::CodeSent(f.send_code().await)
            }),
            StepEvent::VerifyCode(code) => self.spawn_call(|f| async move {
                CallOutcome::Verified(f.verify_code(&code).await)
            }),
            StepEvent::ChangeNumber => {
                if let Err(e) = self.funnel.back_to_phone() {
                    log_call_error(e);
                }
            }
            StepEvent::ChannelSelect(channel) => self.spawn_call(move |f| async move {
                CallOutcome::Finished("select_channel", f.select_channel(channel).await)
            }),
        }
    }

    fn spawn_call<F, Fut>(&self, call: F)
    where
        F: FnOnce(Arc<LeadFunnel>) -> Fut,
        Fut: Future<Output = CallOutcome> + Send + 'static,
    {
        let fut = call(self.funnel.clone());
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            // Receiver is gone only when the app is shutting down
            let _ = tx.send(fut.await);
        });
    }
}

fn log_call_error(error: FunnelError) {
    match error {
        FunnelError::Unmounted | FunnelError::Precondition(_) => {
            tracing::debug!("[tui] call skipped: {}", error)
        }
        other => tracing::warn!("[tui] call failed: {}", other),
    }
}
