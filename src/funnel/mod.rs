//! Lead Funnel
//!
//! Entry question (with a category detour), timeframe, goal, phone
//! verification, then handoff to WhatsApp, SMS or email.

mod driver;
mod message;
mod navigator;
mod reducer;
mod state;
mod types;


pub use driver::LeadFunnel;
pub use message::{MessageParts, build_message, mailto_url, resolve_handoff, sms_url, whatsapp_url};
pub use navigator::{Navigator, RecordingNavigator, SystemNavigator};
pub use reducer::{FunnelAction, reduce};
pub use state::{FunnelSeed, FunnelState};
pub use types::{
    CATEGORIES, Category, Channel, FunnelStep, GoalTemplate, Handoff, HandoffAction,
    HandoffTarget, Timeframe, VerifySubState, category_by_slug, channel_order,
};
