use super::types::*;
use crate::geo::GeoHint;

/// Static context the host page hands to a new funnel
#[derive(Debug, Clone, Default)]
pub struct FunnelSeed {
    /// Label of the procedure/category the page is about
    pub page_context: String,
    /// Category slug chosen before the funnel opened, if any
    pub preselected_category: Option<String>,
}

impl FunnelSeed {
    pub fn new(page_context: impl Into<String>) -> Self {
        Self {
            page_context: page_context.into(),
            preselected_category: None,
        }
    }

    pub fn with_category(mut self, slug: impl Into<String>) -> Self {
        self.preselected_category = Some(slug.into());
        self
    }
}

/// State of one funnel session.
///
/// Only the reducer mutates this; everything else reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunnelState {
    pub step: FunnelStep,
    /// Only meaningful while `step == Verify`
    pub verify_sub_state: VerifySubState,
    /// Set once by the first successful `startLead`, never cleared
    pub lead_id: Option<String>,

    pub page_context_original: String,
    /// Overwritten by the "not exactly" category detour
    pub page_context_final: String,

    pub category_selected: Option<String>,
    pub timeframe: Option<Timeframe>,
    pub goal_template: Option<GoalTemplate>,
    pub extra_details: String,

    /// E.164-like, dial code included
    pub phone: String,
    pub phone_verified: bool,

    pub preferred_channel: Option<Channel>,

    /// Presentation hints only
    pub country: Option<String>,
    pub is_us: bool,

    pub error: Option<String>,
    pub loading: bool,

    /// Filled in by the terminal step
    pub handoff: Option<Handoff>,
}

impl FunnelState {
    pub fn new(seed: FunnelSeed, geo: GeoHint) -> Self {
        let context = seed.page_context.trim().to_string();
        let category_selected = seed
            .preselected_category
            .filter(|slug| !slug.trim().is_empty());

        // Without a page label, fall back to the preselected category's label
        let context = if context.is_empty() {
            category_selected
                .as_deref()
                .and_then(category_by_slug)
                .map(|c| c.label.to_string())
                .unwrap_or_default()
        } else {
            context
        };

        Self {
            step: FunnelStep::Entry,
            verify_sub_state: VerifySubState::PhoneEntry,
            lead_id: None,
            page_context_original: context.clone(),
            page_context_final: context,
            category_selected,
            timeframe: None,
            goal_template: None,
            extra_details: String::new(),
            phone: String::new(),
            phone_verified: false,
            preferred_channel: None,
            country: geo.country,
            is_us: geo.is_us,
            error: None,
            loading: false,
            handoff: None,
        }
    }

    /// The entry question, phrased around the current context label
    pub fn entry_prompt(&self) -> String {
        if self.page_context_final.is_empty() {
            "Are you looking for treatment abroad?".to_string()
        } else {
            format!("Are you looking for {}?", self.page_context_final)
        }
    }

    /// Channels in presentation order for this visitor
    pub fn channel_order(&self) -> [Channel; 3] {
        channel_order(self.is_us)
    }

    pub fn is_completed(&self) -> bool {
        self.step == FunnelStep::Completed
    }
}
