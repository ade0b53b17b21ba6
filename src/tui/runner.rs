//! TUI Runner
//!
//! Terminal setup and the main event loop.

use super::app::{CallOutcome, FunnelApp};
use super::render;
use anyhow::Result;
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste, Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};
use std::io;

use crate::otp::ResendCooldown;

/// What woke the loop up
enum Input {
    Terminal(Option<io::Result<Event>>),
    Tick,
    Outcome(CallOutcome),
}

/// Run the funnel until the visitor closes it
pub async fn run(mut app: FunnelApp) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_loop(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    app.funnel.unmount();
    result
}

async fn run_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut FunnelApp) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(ResendCooldown::TICK);
    // The first tick fires immediately; swallow it
    ticker.tick().await;

    loop {
        terminal.draw(|f| render::render(f, app))?;

        if app.should_quit {
            break;
        }

        let input = tokio::select! {
            event = events.next() => Input::Terminal(event),
            _ = ticker.tick() => Input::Tick,
            Some(outcome) = app.next_outcome() => Input::Outcome(outcome),
        };

        match input {
            Input::Terminal(Some(Ok(Event::Key(key)))) if key.kind == KeyEventKind::Press => {
                app.handle_key(key)
            }
            Input::Terminal(Some(Ok(Event::Paste(text)))) => app.handle_paste(&text),
            Input::Terminal(Some(Ok(_))) => {}
            Input::Terminal(Some(Err(e))) => return Err(e.into()),
            Input::Terminal(None) => break,
            Input::Tick => app.tick(),
            Input::Outcome(outcome) => app.apply_outcome(outcome),
        }
    }

    Ok(())
}
