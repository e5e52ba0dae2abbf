//! Terminal front-end: owns the terminal while a chat session runs.

pub mod conversation;

use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

use crate::config::UiConfig;
use crate::session::Session;
use conversation::{ConversationAction, ConversationManager};

type Tui = Terminal<CrosstermBackend<Stdout>>;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Run the interactive chat until the user exits
pub async fn run(session: Session, ui: UiConfig) -> Result<()> {
    let mut terminal = enter_terminal()?;
    let result = event_loop(&mut terminal, ConversationManager::new(session, ui)).await;
    leave_terminal(&mut terminal)?;
    result
}

async fn event_loop(terminal: &mut Tui, mut manager: ConversationManager) -> Result<()> {
    info!(session = %manager.session().id(), "chat UI started");

    loop {
        draw(terminal, &manager)?;

        if !event::poll(POLL_INTERVAL).context("Failed to poll terminal events")? {
            continue;
        }

        let Event::Key(key) = event::read().context("Failed to read terminal event")? else {
            continue;
        };

        match manager.handle_key(key) {
            ConversationAction::None => {}
            ConversationAction::Submit(input) => {
                manager.begin_submit();
                draw(terminal, &manager)?;
                manager.submit(&input).await;
            }
            ConversationAction::Exit => break,
        }
    }

    info!(
        session = %manager.session().id(),
        messages = manager.session().transcript().len(),
        "chat UI closed"
    );
    Ok(())
}

fn draw(terminal: &mut Tui, manager: &ConversationManager) -> Result<()> {
    terminal
        .draw(|frame| {
            let area = frame.size();
            manager.render(area, frame.buffer_mut());
        })
        .context("Failed to draw terminal")?;
    Ok(())
}

fn enter_terminal() -> Result<Tui> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    undo_on_error(setup_screen, restore_screen)
}

/// Run `step`; if it fails, run `undo` before returning the error
fn undo_on_error<T>(step: impl FnOnce() -> Result<T>, undo: impl FnOnce()) -> Result<T> {
    step().inspect_err(|_| undo())
}

fn setup_screen() -> Result<Tui> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

/// Best-effort undo of a half-finished `enter_terminal`
fn restore_screen() {
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
    let _ = disable_raw_mode();
}

fn leave_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to restore cursor")?;
    Ok(())
}
