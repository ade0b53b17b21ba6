//! Verify step: phone number entry, then the six-cell code.

use crossterm::event::{KeyCode, KeyEvent};

use super::steps::{StepEvent, clean_paste};
use crate::funnel::VerifySubState;
use crate::otp::{CodeInput, PhoneInput, ResendCooldown};

#[derive(Debug, Clone)]
pub struct VerifyPhone {
    pub phone: PhoneInput,
    pub code: CodeInput,
    pub cooldown: ResendCooldown,
}

impl VerifyPhone {
    pub fn new(default_country: &str, cooldown_secs: u32) -> Self {
        Self {
            phone: PhoneInput::new(default_country),
            code: CodeInput::new(),
            cooldown: ResendCooldown::new(cooldown_secs),
        }
    }

    /// `loading` is the funnel's in-flight flag; auto-submit and resend
    /// wait for it to clear.
    pub fn handle_key(
        &mut self,
        sub: VerifySubState,
        loading: bool,
        event: KeyEvent,
    ) -> Option<StepEvent> {
        match sub {
            VerifySubState::PhoneEntry if self.phone.selector_open => self.handle_selector_key(event),
            VerifySubState::PhoneEntry => self.handle_phone_key(loading, event),
            VerifySubState::CodeEntry => self.handle_code_key(loading, event),
        }
    }

    pub fn handle_paste(&mut self, sub: VerifySubState, loading: bool, text: &str) -> Option<StepEvent> {
        let clean = clean_paste(text);
        if clean.is_empty() {
            return None;
        }
        match sub {
            VerifySubState::PhoneEntry => {
                tracing::debug!("[paste] phone ({} chars)", clean.len());
                Some(StepEvent::PhoneChanged(self.phone.set_value(clean)))
            }
            VerifySubState::CodeEntry => {
                self.code.paste(clean);
                self.code.take_submission(loading).map(StepEvent::VerifyCode)
            }
        }
    }

    /// A code went out: fresh cells, countdown restarted
    pub fn on_code_sent(&mut self) {
        self.code.clear();
        self.cooldown.start();
    }

    /// The code was rejected; let the visitor type it again
    pub fn on_code_rejected(&mut self) {
        self.code.clear();
    }

    /// Submit a full code that was held back while a call was in flight
    pub fn resume_submission(&mut self, sub: VerifySubState, loading: bool) -> Option<StepEvent> {
        if sub != VerifySubState::CodeEntry {
            return None;
        }
        self.code.take_submission(loading).map(StepEvent::VerifyCode)
    }

    pub fn tick(&mut self) {
        self.cooldown.tick();
    }

    fn handle_phone_key(&mut self, loading: bool, event: KeyEvent) -> Option<StepEvent> {
        match event.code {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                self.phone.push_char(c).map(StepEvent::PhoneChanged)
            }
            KeyCode::Backspace => Some(StepEvent::PhoneChanged(self.phone.backspace())),
            KeyCode::Tab | KeyCode::Char('+') => {
                self.phone.open_selector();
                None
            }
            KeyCode::Enter if !loading => Some(StepEvent::SendCode),
            _ => None,
        }
    }

    fn handle_selector_key(&mut self, event: KeyEvent) -> Option<StepEvent> {
        match event.code {
            KeyCode::Esc | KeyCode::Tab => {
                self.phone.close_selector();
                None
            }
            KeyCode::Up => {
                self.phone.select_prev();
                None
            }
            KeyCode::Down => {
                self.phone.select_next();
                None
            }
            KeyCode::Backspace => {
                self.phone.search_pop();
                None
            }
            KeyCode::Char(c) => {
                self.phone.search_push(c);
                None
            }
            KeyCode::Enter => self.phone.confirm_selection().map(StepEvent::PhoneChanged),
            _ => None,
        }
    }

    fn handle_code_key(&mut self, loading: bool, event: KeyEvent) -> Option<StepEvent> {
        match event.code {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                self.code.input(c);
                self.code.take_submission(loading).map(StepEvent::VerifyCode)
            }
            KeyCode::Backspace => {
                self.code.backspace();
                None
            }
            KeyCode::Left => {
                self.code.set_focus(self.code.focus().saturating_sub(1));
                None
            }
            KeyCode::Right => {
                self.code.set_focus(self.code.focus() + 1);
                None
            }
            KeyCode::Char('r') | KeyCode::Char('R') if self.cooldown.can_resend() && !loading => {
                Some(StepEvent::SendCode)
            }
            KeyCode::Char('c') | KeyCode::Char('C') if !loading => Some(StepEvent::ChangeNumber),
            // A full buffer that was held back while loading
            KeyCode::Enter => self.code.take_submission(loading).map(StepEvent::VerifyCode),
            _ => None,
        }
    }
}
