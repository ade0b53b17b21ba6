//! Step widgets
//!
//! Each step keeps only its own input state and turns key presses into at
//! most one `StepEvent`. None of them touch the funnel directly.

use crossterm::event::{KeyCode, KeyEvent};

use crate::funnel::{CATEGORIES, Channel, GoalTemplate, Timeframe};

/// Decision emitted by a step widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepEvent {
    EntryYes,
    EntryNo,
    CategorySubmit {
        category: String,
        label: String,
        note: String,
    },
    TimeframeSelect(Timeframe),
    GoalSubmit {
        goal: GoalTemplate,
        details: String,
    },
    PhoneChanged(String),
    SendCode,
    VerifyCode(String),
    ChangeNumber,
    ChannelSelect(Channel),
}

/// Longest free-text answer accepted
pub const MAX_NOTE_LEN: usize = 500;

fn cursor_up(selected: &mut usize) {
    *selected = selected.saturating_sub(1);
}

fn cursor_down(selected: &mut usize, len: usize) {
    if *selected + 1 < len {
        *selected += 1;
    }
}

/// 1-based digit shortcut into a list of `len` entries
fn digit_index(c: char, len: usize) -> Option<usize> {
    let n = c.to_digit(10)? as usize;
    (1..=len).contains(&n).then(|| n - 1)
}

fn push_text(buf: &mut String, c: char) {
    if buf.chars().count() < MAX_NOTE_LEN && !c.is_control() {
        buf.push(c);
    }
}

/// First line of pasted text, trimmed
pub fn clean_paste(text: &str) -> &str {
    text.split(['\r', '\n']).next().unwrap_or("").trim()
}

// ─── Entry ──────────────────────────────────────────────────

/// "Are you looking for …?" with Yes / Not exactly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryQuestion {
    /// `true` while "Yes" is highlighted
    pub yes_selected: bool,
}

impl Default for EntryQuestion {
    fn default() -> Self {
        Self { yes_selected: true }
    }
}

impl EntryQuestion {
    pub fn handle_key(&mut self, event: KeyEvent) -> Option<StepEvent> {
        match event.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(StepEvent::EntryYes),
            KeyCode::Char('n') | KeyCode::Char('N') => Some(StepEvent::EntryNo),
            KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down | KeyCode::Tab => {
                self.yes_selected = !self.yes_selected;
                None
            }
            KeyCode::Enter if self.yes_selected => Some(StepEvent::EntryYes),
            KeyCode::Enter => Some(StepEvent::EntryNo),
            _ => None,
        }
    }
}

// ─── Category detour ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryField {
    #[default]
    List,
    Note,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySelect {
    pub selected: usize,
    pub note: String,
    pub field: CategoryField,
}

impl CategorySelect {
    /// Start with `slug` highlighted if it is a known category
    pub fn preselect(&mut self, slug: Option<&str>) {
        if let Some(i) = slug.and_then(|s| CATEGORIES.iter().position(|c| c.slug == s)) {
            self.selected = i;
        }
    }

    pub fn handle_key(&mut self, event: KeyEvent) -> Option<StepEvent> {
        match (self.field, event.code) {
            (_, KeyCode::Tab) | (_, KeyCode::BackTab) => {
                self.field = match self.field {
                    CategoryField::List => CategoryField::Note,
                    CategoryField::Note => CategoryField::List,
                };
                None
            }
            (_, KeyCode::Enter) => {
                let category = CATEGORIES.get(self.selected)?;
                Some(StepEvent::CategorySubmit {
                    category: category.slug.to_string(),
                    label: category.label.to_string(),
                    note: self.note.trim().to_string(),
                })
            }
            (CategoryField::List, KeyCode::Up | KeyCode::Char('k')) => {
                cursor_up(&mut self.selected);
                None
            }
            (CategoryField::List, KeyCode::Down | KeyCode::Char('j')) => {
                cursor_down(&mut self.selected, CATEGORIES.len());
                None
            }
            (CategoryField::List, KeyCode::Char(c)) => {
                if let Some(i) = digit_index(c, CATEGORIES.len()) {
                    self.selected = i;
                }
                None
            }
            (CategoryField::Note, KeyCode::Char(c)) => {
                push_text(&mut self.note, c);
                None
            }
            (CategoryField::Note, KeyCode::Backspace) => {
                self.note.pop();
                None
            }
            _ => None,
        }
    }

    pub fn handle_paste(&mut self, text: &str) {
        if self.field == CategoryField::Note {
            clean_paste(text).chars().for_each(|c| push_text(&mut self.note, c));
        }
    }
}

// ─── Timeframe ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeHorizon {
    pub selected: usize,
}

impl TimeHorizon {
    pub fn handle_key(&mut self, event: KeyEvent) -> Option<StepEvent> {
        match event.code {
            KeyCode::Up | KeyCode::Char('k') => cursor_up(&mut self.selected),
            KeyCode::Down | KeyCode::Char('j') => {
                cursor_down(&mut self.selected, Timeframe::ALL.len())
            }
            KeyCode::Char(c) => {
                // Digit shortcuts pick and submit in one press
                let i = digit_index(c, Timeframe::ALL.len())?;
                self.selected = i;
                return Some(StepEvent::TimeframeSelect(Timeframe::ALL[i]));
            }
            KeyCode::Enter => {
                return Some(StepEvent::TimeframeSelect(Timeframe::ALL[self.selected]));
            }
            _ => {}
        }
        None
    }
}

// ─── Goal ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GoalField {
    #[default]
    List,
    Details,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalSelect {
    pub selected: usize,
    pub details: String,
    pub field: GoalField,
}

impl GoalSelect {
    pub fn handle_key(&mut self, event: KeyEvent) -> Option<StepEvent> {
        match (self.field, event.code) {
            (_, KeyCode::Tab) | (_, KeyCode::BackTab) => {
                self.field = match self.field {
                    GoalField::List => GoalField::Details,
                    GoalField::Details => GoalField::List,
                };
                None
            }
            (_, KeyCode::Enter) => Some(StepEvent::GoalSubmit {
                goal: GoalTemplate::ALL[self.selected],
                details: self.details.trim().to_string(),
            }),
            (GoalField::List, KeyCode::Up | KeyCode::Char('k')) => {
                cursor_up(&mut self.selected);
                None
            }
            (GoalField::List, KeyCode::Down | KeyCode::Char('j')) => {
                cursor_down(&mut self.selected, GoalTemplate::ALL.len());
                None
            }
            (GoalField::List, KeyCode::Char(c)) => {
                if let Some(i) = digit_index(c, GoalTemplate::ALL.len()) {
                    self.selected = i;
                }
                None
            }
            (GoalField::Details, KeyCode::Char(c)) => {
                push_text(&mut self.details, c);
                None
            }
            (GoalField::Details, KeyCode::Backspace) => {
                self.details.pop();
                None
            }
            _ => None,
        }
    }

    pub fn handle_paste(&mut self, text: &str) {
        if self.field == GoalField::Details {
            clean_paste(text)
                .chars()
                .for_each(|c| push_text(&mut self.details, c));
        }
    }
}

// ─── Channel ────────────────────────────────────────────────

/// Channel picker. The order comes from the funnel state, so it is passed
/// in rather than stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelHandoff {
    pub selected: usize,
}

impl ChannelHandoff {
    pub fn handle_key(&mut self, order: &[Channel; 3], event: KeyEvent) -> Option<StepEvent> {
        match event.code {
            KeyCode::Up | KeyCode::Char('k') => cursor_up(&mut self.selected),
            KeyCode::Down | KeyCode::Char('j') => cursor_down(&mut self.selected, order.len()),
            KeyCode::Char(c) => {
                let i = digit_index(c, order.len())?;
                self.selected = i;
                return Some(StepEvent::ChannelSelect(order[i]));
            }
            KeyCode::Enter => return Some(StepEvent::ChannelSelect(order[self.selected])),
            _ => {}
        }
        None
    }
}
