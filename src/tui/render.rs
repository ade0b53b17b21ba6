//! Funnel Rendering
//!
//! One bordered box centred on screen: progress dots, step title, the
//! step's content, then the error line and key hints.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Flex, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use super::app::FunnelApp;
use super::steps::{CategoryField, GoalField};
use crate::funnel::{
    CATEGORIES, FunnelState, FunnelStep, GoalTemplate, HandoffAction, Timeframe, VerifySubState,
};
use crate::otp::{OTP_LENGTH, mask_phone};

const BRAND_TEAL: Color = Color::Rgb(38, 166, 154);
const BRAND_CORAL: Color = Color::Rgb(255, 127, 80);
const ACCENT_CORAL: Color = Color::Rgb(205, 92, 62);

/// Render the whole funnel
pub fn render(f: &mut Frame, app: &FunnelApp) {
    let area = f.area();
    let state = app.state();
    let step = state.step;

    let mut lines: Vec<Line<'static>> = Vec::new();

    if step != FunnelStep::Completed {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            progress_dots(step),
            Style::default().fg(BRAND_TEAL),
        )));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        step.title().to_string(),
        Style::default().fg(BRAND_CORAL).add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));

    match step {
        FunnelStep::Entry => render_entry(&mut lines, app, &state),
        FunnelStep::Category => render_category(&mut lines, app),
        FunnelStep::Timeframe => render_timeframe(&mut lines, app),
        FunnelStep::Goal => render_goal(&mut lines, app),
        FunnelStep::Verify => render_verify(&mut lines, app, &state),
        FunnelStep::Channel => render_channel(&mut lines, app, &state),
        FunnelStep::Completed => render_completed(&mut lines, &state),
    }

    if state.loading {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  Working...",
            Style::default().fg(Color::DarkGray),
        )));
    }
    if let Some(ref err) = state.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  ! {}", err),
            Style::default().fg(Color::Red),
        )));
    }

    lines.push(Line::from(""));
    lines.push(footer(app, &state));
    lines.push(Line::from(""));

    let box_width = 68u16.min(area.width.saturating_sub(4));
    let box_height = (lines.len() as u16)
        .saturating_add(2)
        .min(area.height.saturating_sub(2));

    let v_chunks = Layout::default()
        .direction(Direction::Vertical)
        .flex(Flex::Center)
        .constraints([Constraint::Length(box_height)])
        .split(area);
    let h_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .flex(Flex::Center)
        .constraints([Constraint::Length(box_width)])
        .split(v_chunks[0]);

    let title = if step == FunnelStep::Completed {
        format!(" {} ", app.funnel.clinic().name)
    } else {
        format!(
            " {} ({}/{}) ",
            app.funnel.clinic().name,
            step.number(),
            FunnelStep::total()
        )
    };

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(BRAND_TEAL))
                .title(Span::styled(
                    title,
                    Style::default().fg(BRAND_TEAL).add_modifier(Modifier::BOLD),
                )),
        )
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, h_chunks[0]);
}

fn progress_dots(step: FunnelStep) -> String {
    let current = step.number();
    (1..=FunnelStep::total())
        .map(|i| if i <= current { "●" } else { "○" })
        .collect::<Vec<_>>()
        .join(" ")
}

/// One selectable row: cursor, radio mark, label
fn option_line(selected: bool, label: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            if selected { " > " } else { "   " },
            Style::default().fg(ACCENT_CORAL),
        ),
        Span::styled(
            if selected { "[*] " } else { "[ ] " },
            Style::default().fg(if selected { BRAND_CORAL } else { Color::DarkGray }),
        ),
        Span::styled(
            label.to_string(),
            if selected {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            },
        ),
    ])
}

fn text_field(label: &str, value: &str, focused: bool, placeholder: &str) -> Line<'static> {
    let (text, style) = if value.is_empty() {
        (placeholder.to_string(), Style::default().fg(Color::DarkGray))
    } else {
        (value.to_string(), Style::default().fg(Color::White))
    };
    let cursor = if focused { "█" } else { "" };
    Line::from(vec![
        Span::styled(
            format!("  {}: ", label),
            Style::default().fg(if focused { BRAND_CORAL } else { Color::Gray }),
        ),
        Span::styled(text, style),
        Span::styled(cursor.to_string(), Style::default().fg(BRAND_CORAL)),
    ])
}

fn hint(text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(
        format!("  {}", text.into()),
        Style::default().fg(Color::DarkGray),
    ))
}

fn render_entry(lines: &mut Vec<Line<'static>>, app: &FunnelApp, state: &FunnelState) {
    lines.push(Line::from(Span::styled(
        format!("  {}", state.entry_prompt()),
        Style::default().fg(Color::White),
    )));
    lines.push(Line::from(""));
    lines.push(option_line(app.entry.yes_selected, "Yes"));
    lines.push(option_line(!app.entry.yes_selected, "Not exactly"));
}

fn render_category(lines: &mut Vec<Line<'static>>, app: &FunnelApp) {
    for (i, category) in CATEGORIES.iter().enumerate() {
        lines.push(option_line(
            i == app.category.selected,
            &format!("{}. {}", i + 1, category.label),
        ));
    }
    lines.push(Line::from(""));
    lines.push(text_field(
        "Anything specific?",
        &app.category.note,
        app.category.field == CategoryField::Note,
        "optional",
    ));
}

fn render_timeframe(lines: &mut Vec<Line<'static>>, app: &FunnelApp) {
    for (i, timeframe) in Timeframe::ALL.iter().enumerate() {
        lines.push(option_line(
            i == app.timeframe.selected,
            &format!("{}. {}", i + 1, timeframe.label()),
        ));
    }
}

fn render_goal(lines: &mut Vec<Line<'static>>, app: &FunnelApp) {
    for (i, goal) in GoalTemplate::ALL.iter().enumerate() {
        lines.push(option_line(
            i == app.goal.selected,
            &format!("{}. {}", i + 1, goal.label()),
        ));
    }
    lines.push(Line::from(""));
    lines.push(text_field(
        "Details",
        &app.goal.details,
        app.goal.field == GoalField::Details,
        "optional",
    ));
}

fn render_verify(lines: &mut Vec<Line<'static>>, app: &FunnelApp, state: &FunnelState) {
    let phone = &app.verify.phone;
    match state.verify_sub_state {
        VerifySubState::PhoneEntry if phone.selector_open => {
            lines.push(text_field("Search country", &phone.search, true, "name or +code"));
            lines.push(Line::from(""));
            for (i, country) in phone.matches().iter().take(8).enumerate() {
                lines.push(option_line(
                    i == phone.selected,
                    &format!("{} {} {}", country.flag, country.name, country.dial_code),
                ));
            }
        }
        VerifySubState::PhoneEntry => {
            lines.push(hint("We'll text you a code to confirm it's you."));
            lines.push(Line::from(""));
            let country = phone.country();
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {} {} ", country.flag, country.dial_code),
                    Style::default().fg(BRAND_TEAL),
                ),
                Span::styled(
                    phone.local().to_string(),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
                Span::styled("█", Style::default().fg(BRAND_CORAL)),
            ]));
        }
        VerifySubState::CodeEntry => {
            lines.push(hint(format!("Enter the code sent to {}", mask_phone(&state.phone))));
            lines.push(Line::from(""));

            let mut cells = vec![Span::raw("  ")];
            for (i, cell) in app.verify.code.cells().iter().enumerate() {
                let focused = i == app.verify.code.focus();
                let style = if focused {
                    Style::default().fg(BRAND_CORAL).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };
                cells.push(Span::styled(format!("[{}]", cell.unwrap_or('_')), style));
                if i + 1 < OTP_LENGTH {
                    cells.push(Span::raw(" "));
                }
            }
            lines.push(Line::from(cells));
            lines.push(Line::from(""));

            let cooldown = &app.verify.cooldown;
            if cooldown.is_active() {
                lines.push(hint(format!("Resend code in {}s", cooldown.remaining())));
            } else {
                lines.push(hint("Didn't get it? Press R to resend"));
            }
        }
    }

    if let Some(ref code) = app.demo_code {
        lines.push(Line::from(""));
        lines.push(hint(format!("Demo mode: your code is {}", code)));
    }
}

fn render_channel(lines: &mut Vec<Line<'static>>, app: &FunnelApp, state: &FunnelState) {
    lines.push(hint("Your number is verified. Pick where to continue."));
    lines.push(Line::from(""));
    for (i, channel) in state.channel_order().iter().enumerate() {
        lines.push(option_line(
            i == app.channel.selected,
            &format!("{}. {}", i + 1, channel.label()),
        ));
    }
}

fn render_completed(lines: &mut Vec<Line<'static>>, state: &FunnelState) {
    let Some(ref handoff) = state.handoff else {
        return;
    };
    match handoff.action {
        HandoffAction::PlatformReply => {
            lines.push(hint(format!(
                "The clinic will text you at {} shortly.",
                mask_phone(&state.phone)
            )));
        }
        HandoffAction::Open { ref url, .. } => {
            lines.push(hint(format!(
                "Opening {}. If nothing opened, use this link:",
                handoff.channel.label()
            )));
            lines.push(Line::from(Span::styled(
                format!("  {}", url),
                Style::default().fg(BRAND_TEAL),
            )));
        }
    }
    lines.push(Line::from(""));
    for line in handoff.message.lines() {
        lines.push(Line::from(Span::styled(
            format!("  │ {}", line),
            Style::default().fg(Color::Gray),
        )));
    }
}

fn footer(app: &FunnelApp, state: &FunnelState) -> Line<'static> {
    let keys: &[(&str, &str)] = match state.step {
        FunnelStep::Entry => &[("Y/N", "Answer"), ("Enter", "Confirm")],
        FunnelStep::Category | FunnelStep::Goal => {
            &[("↑↓", "Choose"), ("Tab", "Note"), ("Enter", "Continue")]
        }
        FunnelStep::Timeframe | FunnelStep::Channel => &[("↑↓/1-9", "Choose"), ("Enter", "Continue")],
        FunnelStep::Verify => match state.verify_sub_state {
            VerifySubState::PhoneEntry if app.verify.phone.selector_open => {
                &[("Type", "Search"), ("Enter", "Pick"), ("Esc", "Close")]
            }
            VerifySubState::PhoneEntry => &[("Tab", "Country"), ("Enter", "Send code")],
            VerifySubState::CodeEntry => &[("R", "Resend"), ("C", "Change number")],
        },
        FunnelStep::Completed => &[("Enter", "Close")],
    };

    let mut spans = vec![Span::styled(
        " [Esc] ",
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    )];
    spans.push(Span::styled("Quit  ", Style::default().fg(Color::White)));
    for (key, label) in keys {
        spans.push(Span::styled(
            format!("[{}] ", key),
            Style::default().fg(ACCENT_CORAL).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            format!("{}  ", label),
            Style::default().fg(Color::White),
        ));
    }
    Line::from(spans)
}
