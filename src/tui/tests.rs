use super::*;
use crate::backend::InMemoryBackend;
use crate::config::ClinicConfig;
use crate::funnel::{
    Channel, FunnelAction, FunnelSeed, FunnelStep, GoalTemplate, LeadFunnel, RecordingNavigator,
    Timeframe, VerifySubState,
};
use crate::geo::GeoHint;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{Terminal, backend::TestBackend};
use std::sync::Arc;

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::empty())
}

fn type_str(verify: &mut VerifyPhone, sub: VerifySubState, text: &str) -> Vec<StepEvent> {
    text.chars()
        .filter_map(|c| verify.handle_key(sub, false, key(KeyCode::Char(c))))
        .collect()
}

fn app() -> FunnelApp {
    let funnel = LeadFunnel::new(
        FunnelSeed::new("Dental implants"),
        GeoHint::default(),
        Arc::new(InMemoryBackend::new().with_fixed_code("123456")),
        ClinicConfig::default(),
        Arc::new(RecordingNavigator::new()),
    );
    FunnelApp::new(Arc::new(funnel), "GB", 30)
}

fn screen(app: &FunnelApp) -> String {
    let mut terminal = Terminal::new(TestBackend::new(80, 40)).unwrap();
    terminal.draw(|f| render(f, app)).unwrap();
    terminal
        .backend()
        .buffer()
        .content
        .iter()
        .map(|cell| cell.symbol())
        .collect()
}

// ─── Step widgets ───────────────────────────────────────────

#[test]
fn test_entry_shortcuts() {
    let mut entry = EntryQuestion::default();
    assert_eq!(entry.handle_key(key(KeyCode::Char('y'))), Some(StepEvent::EntryYes));
    assert_eq!(entry.handle_key(key(KeyCode::Char('n'))), Some(StepEvent::EntryNo));
}

#[test]
fn test_entry_toggle_then_enter() {
    let mut entry = EntryQuestion::default();
    assert_eq!(entry.handle_key(key(KeyCode::Enter)), Some(StepEvent::EntryYes));
    assert_eq!(entry.handle_key(key(KeyCode::Down)), None);
    assert!(!entry.yes_selected);
    assert_eq!(entry.handle_key(key(KeyCode::Enter)), Some(StepEvent::EntryNo));
}

#[test]
fn test_category_select_with_note() {
    let mut category = CategorySelect::default();
    category.handle_key(key(KeyCode::Down));
    category.handle_key(key(KeyCode::Tab));
    assert_eq!(category.field, CategoryField::Note);
    for c in "FUE".chars() {
        category.handle_key(key(KeyCode::Char(c)));
    }
    // 'j' is text while the note has focus
    category.handle_key(key(KeyCode::Char('j')));
    category.handle_key(key(KeyCode::Backspace));

    assert_eq!(
        category.handle_key(key(KeyCode::Enter)),
        Some(StepEvent::CategorySubmit {
            category: "hair-transplant".to_string(),
            label: "Hair transplant".to_string(),
            note: "FUE".to_string(),
        })
    );
}

#[test]
fn test_category_preselect() {
    let mut category = CategorySelect::default();
    category.preselect(Some("eye-surgery"));
    assert_eq!(category.selected, 4);
    category.preselect(Some("unknown"));
    assert_eq!(category.selected, 4);
}

#[test]
fn test_list_cursor_stays_in_bounds() {
    let mut timeframe = TimeHorizon::default();
    timeframe.handle_key(key(KeyCode::Up));
    assert_eq!(timeframe.selected, 0);
    for _ in 0..10 {
        timeframe.handle_key(key(KeyCode::Down));
    }
    assert_eq!(timeframe.selected, Timeframe::ALL.len() - 1);
}

#[test]
fn test_timeframe_digit_submits() {
    let mut timeframe = TimeHorizon::default();
    assert_eq!(
        timeframe.handle_key(key(KeyCode::Char('3'))),
        Some(StepEvent::TimeframeSelect(Timeframe::Within6Months))
    );
    assert_eq!(timeframe.handle_key(key(KeyCode::Char('9'))), None);
}

#[test]
fn test_goal_submit_with_details() {
    let mut goal = GoalSelect::default();
    goal.handle_key(key(KeyCode::Char('2')));
    goal.handle_key(key(KeyCode::Tab));
    goal.handle_paste("Full arch\nsecond line ignored");
    assert_eq!(goal.field, GoalField::Details);
    assert_eq!(
        goal.handle_key(key(KeyCode::Enter)),
        Some(StepEvent::GoalSubmit {
            goal: GoalTemplate::TreatmentPlan,
            details: "Full arch".to_string(),
        })
    );
}

#[test]
fn test_channel_uses_given_order() {
    let mut channel = ChannelHandoff::default();
    let us_order = crate::funnel::channel_order(true);
    assert_eq!(
        channel.handle_key(&us_order, key(KeyCode::Enter)),
        Some(StepEvent::ChannelSelect(Channel::Sms))
    );
    let intl_order = crate::funnel::channel_order(false);
    assert_eq!(
        channel.handle_key(&intl_order, key(KeyCode::Char('1'))),
        Some(StepEvent::ChannelSelect(Channel::Whatsapp))
    );
}

// ─── Verify ─────────────────────────────────────────────────

#[test]
fn test_phone_typing_emits_value() {
    let mut verify = VerifyPhone::new("US", 30);
    let events = type_str(&mut verify, VerifySubState::PhoneEntry, "415x");
    assert_eq!(events.len(), 3);
    assert_eq!(events[2], StepEvent::PhoneChanged("+1415".to_string()));
}

#[test]
fn test_phone_enter_sends_unless_loading() {
    let mut verify = VerifyPhone::new("US", 30);
    assert_eq!(
        verify.handle_key(VerifySubState::PhoneEntry, false, key(KeyCode::Enter)),
        Some(StepEvent::SendCode)
    );
    assert_eq!(
        verify.handle_key(VerifySubState::PhoneEntry, true, key(KeyCode::Enter)),
        None
    );
}

#[test]
fn test_country_selector_via_keys() {
    let mut verify = VerifyPhone::new("US", 30);
    type_str(&mut verify, VerifySubState::PhoneEntry, "7700900123");
    verify.handle_key(VerifySubState::PhoneEntry, false, key(KeyCode::Tab));
    assert!(verify.phone.selector_open);

    // Digits go to the search while the selector is open
    let events = type_str(&mut verify, VerifySubState::PhoneEntry, "+44");
    assert!(events.is_empty());
    assert_eq!(
        verify.handle_key(VerifySubState::PhoneEntry, false, key(KeyCode::Enter)),
        Some(StepEvent::PhoneChanged("+447700900123".to_string()))
    );
    assert!(!verify.phone.selector_open);
}

#[test]
fn test_sixth_digit_auto_submits_once() {
    let mut verify = VerifyPhone::new("GB", 30);
    let events = type_str(&mut verify, VerifySubState::CodeEntry, "123456");
    assert_eq!(events, vec![StepEvent::VerifyCode("123456".to_string())]);

    // Typing over the last cell does not submit again
    let events = type_str(&mut verify, VerifySubState::CodeEntry, "7");
    assert!(events.is_empty());
}

#[test]
fn test_paste_code_auto_submits() {
    let mut verify = VerifyPhone::new("GB", 30);
    assert_eq!(
        verify.handle_paste(VerifySubState::CodeEntry, false, " 123 456 "),
        Some(StepEvent::VerifyCode("123456".to_string()))
    );
}

#[test]
fn test_full_code_held_while_loading() {
    let mut verify = VerifyPhone::new("GB", 30);
    for c in "12345".chars() {
        verify.handle_key(VerifySubState::CodeEntry, false, key(KeyCode::Char(c)));
    }
    assert_eq!(
        verify.handle_key(VerifySubState::CodeEntry, true, key(KeyCode::Char('6'))),
        None
    );
    assert_eq!(
        verify.handle_key(VerifySubState::CodeEntry, false, key(KeyCode::Enter)),
        Some(StepEvent::VerifyCode("123456".to_string()))
    );
}

#[test]
fn test_rejected_code_rearms_entry() {
    let mut verify = VerifyPhone::new("GB", 30);
    type_str(&mut verify, VerifySubState::CodeEntry, "111111");
    verify.on_code_rejected();
    assert_eq!(verify.code.code(), "");
    let events = type_str(&mut verify, VerifySubState::CodeEntry, "123456");
    assert_eq!(events.len(), 1);
}

#[test]
fn test_resend_waits_for_cooldown() {
    let mut verify = VerifyPhone::new("GB", 2);
    verify.on_code_sent();
    let resend = |v: &mut VerifyPhone| {
        v.handle_key(VerifySubState::CodeEntry, false, key(KeyCode::Char('r')))
    };

    assert_eq!(resend(&mut verify), None);
    verify.tick();
    assert_eq!(resend(&mut verify), None);
    verify.tick();
    assert_eq!(resend(&mut verify), Some(StepEvent::SendCode));
}

#[test]
fn test_change_number_key() {
    let mut verify = VerifyPhone::new("GB", 30);
    assert_eq!(
        verify.handle_key(VerifySubState::CodeEntry, false, key(KeyCode::Char('c'))),
        Some(StepEvent::ChangeNumber)
    );
}

// ─── App ────────────────────────────────────────────────────

#[tokio::test]
async fn test_app_entry_yes_round_trip() {
    let mut app = app();
    app.handle_key(key(KeyCode::Char('y')));

    let outcome = app.next_outcome().await.unwrap();
    assert!(matches!(outcome, CallOutcome::Finished("entry_yes", Ok(()))));
    app.apply_outcome(outcome);
    assert_eq!(app.state().step, FunnelStep::Timeframe);
}

#[tokio::test]
async fn test_app_code_sent_starts_cooldown() {
    let mut app = app();
    app.funnel.dispatch(FunnelAction::EntryConfirmed);
    app.funnel.dispatch(FunnelAction::TimeframeSelected(Timeframe::Asap));
    app.funnel.dispatch(FunnelAction::GoalSubmitted {
        goal: GoalTemplate::PriceQuote,
        details: String::new(),
    });
    for c in "7700900123".chars() {
        app.handle_key(key(KeyCode::Char(c)));
    }
    assert_eq!(app.state().phone, "+447700900123");

    app.handle_key(key(KeyCode::Enter));
    let outcome = app.next_outcome().await.unwrap();
    app.apply_outcome(outcome);

    assert_eq!(app.state().verify_sub_state, VerifySubState::CodeEntry);
    assert!(app.verify.cooldown.is_active());
}

#[tokio::test]
async fn test_held_code_submits_when_call_finishes() {
    let mut app = app();
    app.handle_key(key(KeyCode::Char('y')));
    let outcome = app.next_outcome().await.unwrap();
    app.apply_outcome(outcome);
    app.funnel.dispatch(FunnelAction::TimeframeSelected(Timeframe::Asap));
    app.funnel.dispatch(FunnelAction::GoalSubmitted {
        goal: GoalTemplate::PriceQuote,
        details: String::new(),
    });
    for c in "7700900123".chars() {
        app.handle_key(key(KeyCode::Char(c)));
    }
    app.handle_key(key(KeyCode::Enter));
    let outcome = app.next_outcome().await.unwrap();
    app.apply_outcome(outcome);
    assert_eq!(app.state().verify_sub_state, VerifySubState::CodeEntry);

    // A resend is in flight while the code is typed
    app.funnel.dispatch(FunnelAction::RequestStarted);
    for c in "123456".chars() {
        app.handle_key(key(KeyCode::Char(c)));
    }
    assert_eq!(app.verify.code.code(), "123456");

    // The resend fails; the held code goes out without another key press
    app.funnel
        .dispatch(FunnelAction::RequestFailed("Too many requests".to_string()));
    app.apply_outcome(CallOutcome::CodeSent(Ok(false)));

    let outcome = app.next_outcome().await.unwrap();
    assert!(matches!(outcome, CallOutcome::Verified(Ok(true))));
    app.apply_outcome(outcome);
    assert_eq!(app.state().step, FunnelStep::Channel);
}

#[test]
fn test_ctrl_c_unmounts() {
    let mut app = app();
    app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
    assert!(!app.funnel.is_mounted());
}

#[test]
fn test_entry_no_is_synchronous() {
    let mut app = app();
    app.handle_key(key(KeyCode::Char('n')));
    assert_eq!(app.state().step, FunnelStep::Category);
}

#[test]
fn test_render_entry_screen() {
    let app = app();
    let text = screen(&app);
    assert!(text.contains("Are you looking for Dental implants?"));
    assert!(text.contains("Demo Clinic (1/5)"));
}

#[test]
fn test_render_shows_error() {
    let app = app();
    app.funnel
        .dispatch(FunnelAction::RequestFailed("Service unavailable".to_string()));
    assert!(screen(&app).contains("! Service unavailable"));
}
