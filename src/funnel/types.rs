use serde::{Deserialize, Serialize};

/// Current step in the lead funnel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStep {
    Entry,
    Category,
    Timeframe,
    Goal,
    Verify,
    Channel,
    Completed,
}

impl FunnelStep {
    /// Step number (1-based) for the progress indicator
    pub fn number(&self) -> usize {
        match self {
            Self::Entry => 1,
            Self::Category => 1, // detour of Entry
            Self::Timeframe => 2,
            Self::Goal => 3,
            Self::Verify => 4,
            Self::Channel => 5,
            Self::Completed => 6,
        }
    }

    /// Total number of steps (excluding Completed)
    pub fn total() -> usize {
        5
    }

    /// Step title
    pub fn title(&self) -> &'static str {
        match self {
            Self::Entry => "Is this what you're looking for?",
            Self::Category => "What are you looking for?",
            Self::Timeframe => "When are you hoping to travel?",
            Self::Goal => "What would help most right now?",
            Self::Verify => "Verify your phone",
            Self::Channel => "How should the clinic reach you?",
            Self::Completed => "You're all set",
        }
    }
}

/// Sub-state of the Verify step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerifySubState {
    #[default]
    PhoneEntry,
    CodeEntry,
}

/// Communication channel the patient continues on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Whatsapp,
    Sms,
    Email,
}

impl Channel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Whatsapp => "WhatsApp",
            Self::Sms => "SMS",
            Self::Email => "Email",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Whatsapp => "whatsapp",
            Self::Sms => "sms",
            Self::Email => "email",
        }
    }
}

impl std::str::FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "whatsapp" | "wa" => Ok(Self::Whatsapp),
            "sms" | "text" => Ok(Self::Sms),
            "email" | "mail" => Ok(Self::Email),
            other => Err(format!("unknown channel: {other}")),
        }
    }
}

/// Channel presentation order.
///
/// North American visitors get SMS first, everyone else WhatsApp first.
pub fn channel_order(is_us: bool) -> [Channel; 3] {
    if is_us {
        [Channel::Sms, Channel::Whatsapp, Channel::Email]
    } else {
        [Channel::Whatsapp, Channel::Sms, Channel::Email]
    }
}

/// Travel time horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Asap,
    #[serde(rename = "within_3_months")]
    Within3Months,
    #[serde(rename = "within_6_months")]
    Within6Months,
    WithinYear,
    Researching,
}

impl Timeframe {
    pub const ALL: [Timeframe; 5] = [
        Self::Asap,
        Self::Within3Months,
        Self::Within6Months,
        Self::WithinYear,
        Self::Researching,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Asap => "As soon as possible",
            Self::Within3Months => "Within 3 months",
            Self::Within6Months => "Within 6 months",
            Self::WithinYear => "Within a year",
            Self::Researching => "Just researching",
        }
    }
}

impl std::str::FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asap" => Ok(Self::Asap),
            "within_3_months" | "3m" => Ok(Self::Within3Months),
            "within_6_months" | "6m" => Ok(Self::Within6Months),
            "within_year" | "12m" => Ok(Self::WithinYear),
            "researching" => Ok(Self::Researching),
            other => Err(format!("unknown timeframe: {other}")),
        }
    }
}

/// Canned goal the patient picks before verifying
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalTemplate {
    PriceQuote,
    TreatmentPlan,
    CompareOptions,
    AskQuestion,
}

impl GoalTemplate {
    pub const ALL: [GoalTemplate; 4] = [
        Self::PriceQuote,
        Self::TreatmentPlan,
        Self::CompareOptions,
        Self::AskQuestion,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::PriceQuote => "Get a price estimate",
            Self::TreatmentPlan => "Get a personalised treatment plan",
            Self::CompareOptions => "Compare clinics and options",
            Self::AskQuestion => "Ask a specific question",
        }
    }
}

impl std::str::FromStr for GoalTemplate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price_quote" | "price" => Ok(Self::PriceQuote),
            "treatment_plan" | "plan" => Ok(Self::TreatmentPlan),
            "compare_options" | "compare" => Ok(Self::CompareOptions),
            "ask_question" | "question" => Ok(Self::AskQuestion),
            other => Err(format!("unknown goal: {other}")),
        }
    }
}

/// Treatment category offered in the "not exactly" detour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub slug: &'static str,
    pub label: &'static str,
}

/// Category definitions for the CategorySelect step
pub const CATEGORIES: &[Category] = &[
    Category {
        slug: "dental",
        label: "Dental treatment",
    },
    Category {
        slug: "hair-transplant",
        label: "Hair transplant",
    },
    Category {
        slug: "cosmetic-surgery",
        label: "Cosmetic surgery",
    },
    Category {
        slug: "weight-loss",
        label: "Weight-loss surgery",
    },
    Category {
        slug: "eye-surgery",
        label: "Eye surgery",
    },
    Category {
        slug: "fertility",
        label: "Fertility treatment",
    },
    Category {
        slug: "orthopedics",
        label: "Orthopedic surgery",
    },
    Category {
        slug: "other",
        label: "Something else",
    },
];

/// Look up a category by slug
pub fn category_by_slug(slug: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.slug.eq_ignore_ascii_case(slug))
}

/// How the chosen channel is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffTarget {
    /// Open alongside the funnel (WhatsApp)
    NewTab,
    /// Replace the funnel (SMS, email)
    SameTab,
}

/// What happens at the end of the funnel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandoffAction {
    /// Open a composed deep link
    Open { url: String, target: HandoffTarget },
    /// The clinic's messaging platform texts the patient; nothing to open
    PlatformReply,
}

/// Result of the terminal channel step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handoff {
    pub channel: Channel,
    pub message: String,
    pub action: HandoffAction,
}

impl Handoff {
    pub fn url(&self) -> Option<&str> {
        match &self.action {
            HandoffAction::Open { url, .. } => Some(url),
            HandoffAction::PlatformReply => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(true, [Channel::Sms, Channel::Whatsapp, Channel::Email])]
    #[case(false, [Channel::Whatsapp, Channel::Sms, Channel::Email])]
    fn test_channel_order(#[case] is_us: bool, #[case] expected: [Channel; 3]) {
        assert_eq!(channel_order(is_us), expected);
        // Same input, same order
        assert_eq!(channel_order(is_us), channel_order(is_us));
    }

    #[rstest]
    #[case("WhatsApp", Channel::Whatsapp)]
    #[case("wa", Channel::Whatsapp)]
    #[case("text", Channel::Sms)]
    #[case(" email ", Channel::Email)]
    fn test_channel_from_str(#[case] input: &str, #[case] expected: Channel) {
        assert_eq!(input.parse::<Channel>().unwrap(), expected);
    }

    #[test]
    fn test_timeframe_serde_names() {
        let value = serde_json::to_value(Timeframe::Within3Months).unwrap();
        assert_eq!(value, "within_3_months");
        assert_eq!("6m".parse::<Timeframe>().unwrap(), Timeframe::Within6Months);
    }

    #[test]
    fn test_step_numbers_cover_progress() {
        assert_eq!(FunnelStep::Entry.number(), 1);
        assert_eq!(FunnelStep::Channel.number(), FunnelStep::total());
    }

    #[test]
    fn test_category_lookup() {
        assert!(category_by_slug("hair-transplant").is_some());
        assert!(category_by_slug("nope").is_none());
    }
}
