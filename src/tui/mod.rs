//! Terminal UI
//!
//! Hosts a `LeadFunnel` in the terminal: one widget per step, a ratatui
//! renderer, and a crossterm event loop.

mod app;
mod render;
mod runner;
mod steps;
mod verify;

#[cfg(test)]
mod tests;

pub use app::{CallOutcome, FunnelApp};
pub use render::render;
pub use runner::run;
pub use steps::{
    CategoryField, CategorySelect, ChannelHandoff, EntryQuestion, GoalField, GoalSelect,
    StepEvent, TimeHorizon,
};
pub use verify::VerifyPhone;
