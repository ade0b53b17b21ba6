//! Handoff message and channel URL builders.
//!
//! Everything here is a pure function of its arguments.

use super::state::FunnelState;
use super::types::*;
use crate::config::ClinicContactConfig;
use crate::error::ContactError;

/// The fields of a funnel session that end up in the handoff message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageParts<'a> {
    pub lead_id: Option<&'a str>,
    pub page_context: &'a str,
    pub timeframe: Option<Timeframe>,
    pub goal: Option<GoalTemplate>,
    pub extra_details: &'a str,
}

impl<'a> From<&'a FunnelState> for MessageParts<'a> {
    fn from(state: &'a FunnelState) -> Self {
        Self {
            lead_id: state.lead_id.as_deref(),
            page_context: &state.page_context_final,
            timeframe: state.timeframe,
            goal: state.goal_template,
            extra_details: &state.extra_details,
        }
    }
}

/// Compose the human-readable summary sent to the clinic.
pub fn build_message(parts: &MessageParts<'_>) -> String {
    let mut lines = Vec::with_capacity(5);

    let context = parts.page_context.trim();
    if context.is_empty() {
        lines.push("Hi, I'm interested in treatment with your clinic.".to_string());
    } else {
        lines.push(format!("Hi, I'm interested in {}.", context));
    }

    if let Some(timeframe) = parts.timeframe {
        lines.push(format!("Timeframe: {}", timeframe.label()));
    }
    if let Some(goal) = parts.goal {
        lines.push(format!("Goal: {}", goal.label()));
    }
    let details = parts.extra_details.trim();
    if !details.is_empty() {
        lines.push(format!("Details: {}", details));
    }
    if let Some(lead_id) = parts.lead_id {
        lines.push(format!("Reference: {}", lead_id));
    }

    lines.join("\n")
}

/// `https://wa.me/<digits>?text=<message>`
pub fn whatsapp_url(number: &str, message: &str) -> Result<String, ContactError> {
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(ContactError::MissingWhatsAppNumber);
    }
    if !is_plausible_number(&digits) {
        return Err(ContactError::InvalidNumber(number.to_string()));
    }
    Ok(format!(
        "https://wa.me/{}?text={}",
        digits,
        urlencoding::encode(message)
    ))
}

/// `sms:<number>?body=<message>`
pub fn sms_url(number: &str, message: &str) -> Result<String, ContactError> {
    let trimmed = number.trim();
    if trimmed.is_empty() {
        return Err(ContactError::MissingSmsNumber);
    }
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if !is_plausible_number(&digits) {
        return Err(ContactError::InvalidNumber(number.to_string()));
    }
    let prefix = if trimmed.starts_with('+') { "+" } else { "" };
    Ok(format!(
        "sms:{}{}?body={}",
        prefix,
        digits,
        urlencoding::encode(message)
    ))
}

/// `mailto:<address>?subject=<clinic name>&body=<message>`
pub fn mailto_url(address: &str, clinic_name: &str, message: &str) -> Result<String, ContactError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ContactError::MissingEmail);
    }
    Ok(format!(
        "mailto:{}?subject={}&body={}",
        address,
        urlencoding::encode(clinic_name),
        urlencoding::encode(message)
    ))
}

/// Resolve what the terminal step does for `channel`.
///
/// SMS never borrows the WhatsApp number: without an SMS number or
/// platform reply it is a configuration error.
pub fn resolve_handoff(
    channel: Channel,
    contact: &ClinicContactConfig,
    clinic_name: &str,
    message: String,
) -> Result<Handoff, ContactError> {
    let action = match channel {
        Channel::Whatsapp => {
            let number = contact
                .whatsapp_number
                .as_deref()
                .ok_or(ContactError::MissingWhatsAppNumber)?;
            HandoffAction::Open {
                url: whatsapp_url(number, &message)?,
                target: HandoffTarget::NewTab,
            }
        }
        Channel::Sms if contact.sms_use_platform_reply => HandoffAction::PlatformReply,
        Channel::Sms => {
            let number = contact
                .sms_number
                .as_deref()
                .ok_or(ContactError::MissingSmsNumber)?;
            HandoffAction::Open {
                url: sms_url(number, &message)?,
                target: HandoffTarget::SameTab,
            }
        }
        Channel::Email => {
            let address = contact
                .email
                .as_deref()
                .ok_or(ContactError::MissingEmail)?;
            HandoffAction::Open {
                url: mailto_url(address, clinic_name, &message)?,
                target: HandoffTarget::SameTab,
            }
        }
    };

    Ok(Handoff {
        channel,
        message,
        action,
    })
}

/// E.164 allows at most 15 digits; anything under 7 is not a real number.
fn is_plausible_number(digits: &str) -> bool {
    (7..=15).contains(&digits.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funnel::state::FunnelSeed;
    use crate::geo::GeoHint;
    use proptest::prelude::*;
    use rstest::rstest;

    fn contact() -> ClinicContactConfig {
        ClinicContactConfig {
            whatsapp_number: Some("447700900000".to_string()),
            sms_number: Some("+15551234567".to_string()),
            sms_use_platform_reply: false,
            email: Some("hello@clinic.example".to_string()),
        }
    }

    #[test]
    fn test_whatsapp_url_plain() {
        let url = whatsapp_url("447700900000", "Hello").unwrap();
        assert_eq!(url, "https://wa.me/447700900000?text=Hello");
    }

    #[test]
    fn test_whatsapp_url_strips_formatting_and_encodes() {
        let url = whatsapp_url("+44 7700 900000", "Hi there\nReference: 42").unwrap();
        assert_eq!(
            url,
            "https://wa.me/447700900000?text=Hi%20there%0AReference%3A%2042"
        );
    }

    #[test]
    fn test_whatsapp_url_requires_number() {
        assert_eq!(
            whatsapp_url("", "Hello"),
            Err(ContactError::MissingWhatsAppNumber)
        );
        assert!(matches!(
            whatsapp_url("12", "Hello"),
            Err(ContactError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_sms_url_keeps_plus() {
        let url = sms_url("+1 (555) 123-4567", "Hi & bye").unwrap();
        assert_eq!(url, "sms:+15551234567?body=Hi%20%26%20bye");
    }

    #[test]
    fn test_mailto_url() {
        let url = mailto_url("hello@clinic.example", "Smile Clinic", "Hello").unwrap();
        assert_eq!(
            url,
            "mailto:hello@clinic.example?subject=Smile%20Clinic&body=Hello"
        );
    }

    #[rstest]
    #[case(Channel::Whatsapp, HandoffTarget::NewTab, "https://wa.me/")]
    #[case(Channel::Sms, HandoffTarget::SameTab, "sms:")]
    #[case(Channel::Email, HandoffTarget::SameTab, "mailto:")]
    fn test_resolve_handoff_targets(
        #[case] channel: Channel,
        #[case] expected_target: HandoffTarget,
        #[case] prefix: &str,
    ) {
        let handoff =
            resolve_handoff(channel, &contact(), "Smile Clinic", "Hello".to_string()).unwrap();
        match handoff.action {
            HandoffAction::Open { url, target } => {
                assert!(url.starts_with(prefix), "{url}");
                assert_eq!(target, expected_target);
            }
            HandoffAction::PlatformReply => panic!("expected a link"),
        }
    }

    #[test]
    fn test_sms_platform_reply_needs_no_number() {
        let contact = ClinicContactConfig {
            sms_number: None,
            sms_use_platform_reply: true,
            ..contact()
        };
        let handoff =
            resolve_handoff(Channel::Sms, &contact, "Smile Clinic", "Hello".to_string()).unwrap();
        assert_eq!(handoff.action, HandoffAction::PlatformReply);
        assert!(handoff.url().is_none());
    }

    #[test]
    fn test_sms_without_number_does_not_fall_back_to_whatsapp() {
        let contact = ClinicContactConfig {
            sms_number: None,
            sms_use_platform_reply: false,
            ..contact()
        };
        let err = resolve_handoff(Channel::Sms, &contact, "Smile Clinic", "Hello".to_string())
            .unwrap_err();
        assert_eq!(err, ContactError::MissingSmsNumber);
    }

    #[test]
    fn test_message_contains_all_answers() {
        let parts = MessageParts {
            lead_id: Some("lead-42"),
            page_context: "Dental implants",
            timeframe: Some(Timeframe::Within3Months),
            goal: Some(GoalTemplate::PriceQuote),
            extra_details: "Two upper implants",
        };
        let msg = build_message(&parts);
        assert!(msg.contains("Dental implants"));
        assert!(msg.contains(Timeframe::Within3Months.label()));
        assert!(msg.contains(GoalTemplate::PriceQuote.label()));
        assert!(msg.contains("Two upper implants"));
        assert!(msg.contains("lead-42"));
    }

    #[test]
    fn test_goal_line_states_goal_once() {
        let msg = build_message(&MessageParts {
            page_context: "Dental implants",
            goal: Some(GoalTemplate::PriceQuote),
            ..Default::default()
        });
        let goal_lines: Vec<&str> = msg.lines().filter(|l| l.starts_with("Goal:")).collect();
        assert_eq!(goal_lines, vec!["Goal: Get a price estimate"]);
    }

    #[test]
    fn test_message_skips_missing_answers() {
        let msg = build_message(&MessageParts {
            page_context: "Hair transplant",
            ..Default::default()
        });
        assert_eq!(msg, "Hi, I'm interested in Hair transplant.");
    }

    #[test]
    fn test_message_from_state() {
        let mut state = FunnelState::new(FunnelSeed::new("Eye surgery"), GeoHint::default());
        state.timeframe = Some(Timeframe::Asap);
        state.extra_details = "LASIK".to_string();
        let msg = build_message(&MessageParts::from(&state));
        assert!(msg.starts_with("Hi, I'm interested in Eye surgery."));
        assert!(msg.contains("Timeframe: As soon as possible"));
        assert!(msg.contains("Details: LASIK"));
    }

    proptest! {
        #[test]
        fn prop_message_deterministic_and_complete(
            context in "[A-Za-z ]{1,20}",
            details in "[A-Za-z0-9 ]{0,30}",
            tf in 0usize..5,
            goal in 0usize..4,
        ) {
            let parts = MessageParts {
                lead_id: Some("lead-1"),
                page_context: &context,
                timeframe: Some(Timeframe::ALL[tf]),
                goal: Some(GoalTemplate::ALL[goal]),
                extra_details: &details,
            };
            let first = build_message(&parts);
            let second = build_message(&parts);
            prop_assert_eq!(&first, &second);
            prop_assert!(first.contains(context.trim()));
            prop_assert!(first.contains(details.trim()));
            prop_assert!(first.contains(Timeframe::ALL[tf].label()));
            prop_assert!(first.contains(GoalTemplate::ALL[goal].label()));
        }
    }
}
