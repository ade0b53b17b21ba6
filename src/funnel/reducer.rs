//! Pure state transitions for the funnel.
//!
//! `reduce` never performs I/O. The driver issues backend calls and feeds
//! their outcomes back in as actions.

use super::state::FunnelState;
use super::types::*;

/// Everything that can change a `FunnelState`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunnelAction {
    /// An async call is about to start
    RequestStarted,
    /// An async call failed in a way the user should see
    RequestFailed(String),
    /// `startLead` succeeded
    LeadStarted {
        lead_id: String,
        country: Option<String>,
    },
    /// "Yes, that's what I'm looking for"
    EntryConfirmed,
    /// "Not exactly"
    EntryDeclined,
    /// Category picked in the detour
    CategorySubmitted {
        category: String,
        label: String,
        note: String,
    },
    TimeframeSelected(Timeframe),
    GoalSubmitted {
        goal: GoalTemplate,
        details: String,
    },
    PhoneChanged(String),
    /// `sendOtp` succeeded
    CodeSent,
    /// "Change number"
    BackToPhone,
    /// `verifyOtp` succeeded
    PhoneVerified,
    /// Channel persisted and handoff resolved
    ChannelSelected(Handoff),
}

/// Apply `action` to `state`.
///
/// Actions that would break an invariant are ignored (and logged) rather
/// than applied.
pub fn reduce(state: &mut FunnelState, action: FunnelAction) {
    match action {
        FunnelAction::RequestStarted => {
            state.loading = true;
            state.error = None;
        }
        FunnelAction::RequestFailed(message) => {
            state.loading = false;
            state.error = Some(message);
        }
        FunnelAction::LeadStarted { lead_id, country } => {
            if state.lead_id.is_none() {
                state.lead_id = Some(lead_id);
            } else {
                tracing::debug!("[reduce] lead already set, ignoring {}", lead_id);
            }
            if let Some(country) = country {
                let hint = crate::geo::GeoHint::from_country(Some(&country));
                if hint.country.is_some() {
                    state.country = hint.country;
                    state.is_us = hint.is_us;
                }
            }
        }
        FunnelAction::EntryConfirmed => {
            if state.step != FunnelStep::Entry {
                return ignored(state, "EntryConfirmed");
            }
            succeed(state);
            state.step = FunnelStep::Timeframe;
        }
        FunnelAction::EntryDeclined => {
            if state.step != FunnelStep::Entry {
                return ignored(state, "EntryDeclined");
            }
            succeed(state);
            state.step = FunnelStep::Category;
        }
        FunnelAction::CategorySubmitted {
            category,
            label,
            note,
        } => {
            if state.step != FunnelStep::Category {
                return ignored(state, "CategorySubmitted");
            }
            succeed(state);
            state.category_selected = Some(category);
            state.page_context_final = label;
            state.extra_details = note;
            state.step = FunnelStep::Entry;
        }
        FunnelAction::TimeframeSelected(timeframe) => {
            if state.step != FunnelStep::Timeframe {
                return ignored(state, "TimeframeSelected");
            }
            succeed(state);
            state.timeframe = Some(timeframe);
            state.step = FunnelStep::Goal;
        }
        FunnelAction::GoalSubmitted { goal, details } => {
            if state.step != FunnelStep::Goal {
                return ignored(state, "GoalSubmitted");
            }
            succeed(state);
            state.goal_template = Some(goal);
            state.extra_details = details;
            state.step = FunnelStep::Verify;
            state.verify_sub_state = VerifySubState::PhoneEntry;
        }
        FunnelAction::PhoneChanged(phone) => {
            if state.phone_verified {
                return ignored(state, "PhoneChanged");
            }
            state.phone = phone;
        }
        FunnelAction::CodeSent => {
            if state.step != FunnelStep::Verify {
                return ignored(state, "CodeSent");
            }
            succeed(state);
            state.verify_sub_state = VerifySubState::CodeEntry;
        }
        FunnelAction::BackToPhone => {
            if state.step != FunnelStep::Verify {
                return ignored(state, "BackToPhone");
            }
            succeed(state);
            state.verify_sub_state = VerifySubState::PhoneEntry;
        }
        FunnelAction::PhoneVerified => {
            if state.step != FunnelStep::Verify
                || state.verify_sub_state != VerifySubState::CodeEntry
            {
                return ignored(state, "PhoneVerified");
            }
            succeed(state);
            state.phone_verified = true;
            state.step = FunnelStep::Channel;
        }
        FunnelAction::ChannelSelected(handoff) => {
            if state.step != FunnelStep::Channel || !state.phone_verified {
                return ignored(state, "ChannelSelected");
            }
            succeed(state);
            state.preferred_channel = Some(handoff.channel);
            state.handoff = Some(handoff);
            state.step = FunnelStep::Completed;
        }
    }
}

fn succeed(state: &mut FunnelState) {
    state.loading = false;
    state.error = None;
}

fn ignored(state: &FunnelState, action: &str) {
    tracing::debug!(
        "[reduce] {} ignored in step {:?} ({:?})",
        action,
        state.step,
        state.verify_sub_state
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funnel::state::FunnelSeed;
    use crate::geo::GeoHint;
    use proptest::prelude::*;

    fn fresh() -> FunnelState {
        FunnelState::new(FunnelSeed::new("Dental implants"), GeoHint::default())
    }

    fn handoff(channel: Channel) -> Handoff {
        Handoff {
            channel,
            message: "Hello".to_string(),
            action: HandoffAction::PlatformReply,
        }
    }

    #[test]
    fn test_seed_sets_both_contexts() {
        let state = fresh();
        assert_eq!(state.step, FunnelStep::Entry);
        assert_eq!(state.page_context_original, "Dental implants");
        assert_eq!(state.page_context_final, "Dental implants");
        assert!(state.lead_id.is_none());
    }

    #[test]
    fn test_seed_without_context_uses_category_label() {
        let state = FunnelState::new(
            FunnelSeed::new("").with_category("dental"),
            GeoHint::default(),
        );
        assert_eq!(state.category_selected.as_deref(), Some("dental"));
        assert_eq!(state.page_context_final, "Dental treatment");
    }

    #[test]
    fn test_category_detour_returns_to_entry() {
        let mut state = fresh();
        reduce(&mut state, FunnelAction::EntryDeclined);
        assert_eq!(state.step, FunnelStep::Category);

        reduce(
            &mut state,
            FunnelAction::CategorySubmitted {
                category: "dental".to_string(),
                label: "Dental treatment".to_string(),
                note: "implants".to_string(),
            },
        );
        assert_eq!(state.step, FunnelStep::Entry);
        assert_eq!(state.page_context_final, "Dental treatment");
        assert_eq!(state.page_context_original, "Dental implants");
        assert_eq!(state.extra_details, "implants");
        assert_eq!(state.entry_prompt(), "Are you looking for Dental treatment?");
    }

    #[test]
    fn test_lead_id_set_once() {
        let mut state = fresh();
        reduce(
            &mut state,
            FunnelAction::LeadStarted {
                lead_id: "lead-1".to_string(),
                country: None,
            },
        );
        reduce(
            &mut state,
            FunnelAction::LeadStarted {
                lead_id: "lead-2".to_string(),
                country: None,
            },
        );
        assert_eq!(state.lead_id.as_deref(), Some("lead-1"));
    }

    #[test]
    fn test_lead_country_updates_geo_hint() {
        let mut state = fresh();
        assert!(!state.is_us);
        reduce(
            &mut state,
            FunnelAction::LeadStarted {
                lead_id: "lead-1".to_string(),
                country: Some("US".to_string()),
            },
        );
        assert!(state.is_us);
        assert_eq!(state.channel_order()[0], Channel::Sms);
    }

    #[test]
    fn test_code_entry_requires_verify_step() {
        let mut state = fresh();
        reduce(&mut state, FunnelAction::CodeSent);
        assert_eq!(state.verify_sub_state, VerifySubState::PhoneEntry);
    }

    #[test]
    fn test_verified_requires_code_entry() {
        let mut state = fresh();
        state.step = FunnelStep::Verify;
        reduce(&mut state, FunnelAction::PhoneVerified);
        assert!(!state.phone_verified);
        assert_eq!(state.step, FunnelStep::Verify);
    }

    #[test]
    fn test_back_to_phone_keeps_number() {
        let mut state = fresh();
        state.step = FunnelStep::Verify;
        reduce(&mut state, FunnelAction::PhoneChanged("+14155551234".to_string()));
        reduce(&mut state, FunnelAction::CodeSent);
        assert_eq!(state.verify_sub_state, VerifySubState::CodeEntry);

        reduce(&mut state, FunnelAction::BackToPhone);
        assert_eq!(state.verify_sub_state, VerifySubState::PhoneEntry);
        assert_eq!(state.phone, "+14155551234");
    }

    #[test]
    fn test_request_failed_keeps_step() {
        let mut state = fresh();
        state.step = FunnelStep::Verify;
        reduce(&mut state, FunnelAction::RequestStarted);
        assert!(state.loading);
        reduce(&mut state, FunnelAction::RequestFailed("Invalid number".to_string()));
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("Invalid number"));
        assert_eq!(state.step, FunnelStep::Verify);
    }

    #[test]
    fn test_successful_transition_clears_error() {
        let mut state = fresh();
        reduce(&mut state, FunnelAction::RequestFailed("boom".to_string()));
        reduce(&mut state, FunnelAction::EntryConfirmed);
        assert!(state.error.is_none());
        assert_eq!(state.step, FunnelStep::Timeframe);
    }

    #[test]
    fn test_channel_selected_without_verification_ignored() {
        let mut state = fresh();
        state.step = FunnelStep::Channel;
        reduce(&mut state, FunnelAction::ChannelSelected(handoff(Channel::Email)));
        assert_eq!(state.step, FunnelStep::Channel);
        assert!(state.preferred_channel.is_none());
    }

    fn arb_action() -> impl Strategy<Value = FunnelAction> {
        prop_oneof![
            Just(FunnelAction::RequestStarted),
            "[a-z ]{0,12}".prop_map(FunnelAction::RequestFailed),
            "[a-z0-9]{1,8}".prop_map(|id| FunnelAction::LeadStarted {
                lead_id: id,
                country: None,
            }),
            Just(FunnelAction::EntryConfirmed),
            Just(FunnelAction::EntryDeclined),
            Just(FunnelAction::CategorySubmitted {
                category: "dental".to_string(),
                label: "Dental treatment".to_string(),
                note: String::new(),
            }),
            Just(FunnelAction::TimeframeSelected(Timeframe::Asap)),
            Just(FunnelAction::GoalSubmitted {
                goal: GoalTemplate::PriceQuote,
                details: String::new(),
            }),
            Just(FunnelAction::PhoneChanged("+447700900000".to_string())),
            Just(FunnelAction::CodeSent),
            Just(FunnelAction::BackToPhone),
            Just(FunnelAction::PhoneVerified),
            Just(FunnelAction::ChannelSelected(Handoff {
                channel: Channel::Whatsapp,
                message: String::new(),
                action: HandoffAction::PlatformReply,
            })),
        ]
    }

    proptest! {
        #[test]
        fn prop_lead_id_never_replaced(actions in proptest::collection::vec(arb_action(), 0..40)) {
            let mut state = fresh();
            let mut first: Option<String> = None;
            for action in actions {
                reduce(&mut state, action);
                if let Some(expected) = &first {
                    prop_assert_eq!(Some(expected), state.lead_id.as_ref());
                } else {
                    first = state.lead_id.clone();
                }
            }
        }

        #[test]
        fn prop_channel_requires_verified_phone(actions in proptest::collection::vec(arb_action(), 0..40)) {
            let mut state = fresh();
            let mut saw_verified = false;
            for action in actions {
                if action == FunnelAction::PhoneVerified
                    && state.step == FunnelStep::Verify
                    && state.verify_sub_state == VerifySubState::CodeEntry
                {
                    saw_verified = true;
                }
                reduce(&mut state, action);
                if matches!(state.step, FunnelStep::Channel | FunnelStep::Completed) {
                    prop_assert!(state.phone_verified);
                    prop_assert!(saw_verified);
                }
            }
        }

        #[test]
        fn prop_code_entry_requires_code_sent(actions in proptest::collection::vec(arb_action(), 0..40)) {
            let mut state = fresh();
            let mut sent = false;
            for action in actions {
                if action == FunnelAction::CodeSent && state.step == FunnelStep::Verify {
                    sent = true;
                }
                reduce(&mut state, action);
                if state.verify_sub_state == VerifySubState::CodeEntry {
                    prop_assert!(sent);
                }
            }
        }
    }
}
