use crate::config::UiConfig;
use crate::events::SessionEvent;
use crate::session::Session;
use crate::ui::conversation::{
    ComposerResult, ConversationComposer, ConversationHistory, SlashCommand, get_help_text,
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use std::cell::Cell;
use tokio::sync::mpsc;

const WELCOME_TEXT: &str = "This helpline assistant is here to offer empathy and understanding. \
Please share what's on your mind, and the assistant will do its best to provide supportive responses.";

const SCROLL_PAGE: usize = 10;

/// Actions that can be requested by the conversation manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    /// Text to submit; the caller redraws with the pending indicator first
    Submit(String),
    Exit,
}

/// Owns the session and the widgets that present it
pub struct ConversationManager {
    session: Session,
    composer: ConversationComposer,
    ui: UiConfig,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    warning: Option<String>,
    notice: Option<String>,
    pending: bool,
    /// History lines scrolled up from the bottom
    scroll: usize,
    /// Upper bound for `scroll`, refreshed on every render
    max_scroll: Cell<usize>,
}

impl ConversationManager {
    pub fn new(session: Session, ui: UiConfig) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        Self {
            session: session.with_events(tx),
            composer: ConversationComposer::new(
                "Type your message here:",
                "Press Enter to send",
            ),
            ui,
            events,
            warning: None,
            notice: None,
            pending: false,
            scroll: 0,
            max_scroll: Cell::new(0),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ConversationAction {
        if key.kind != KeyEventKind::Press {
            return ConversationAction::None;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('d') => return ConversationAction::Exit,
                KeyCode::Char('l') => {
                    self.clear();
                    return ConversationAction::None;
                }
                _ => {}
            }
        }

        if key.code == KeyCode::Esc && !self.composer.palette_open() {
            return ConversationAction::Exit;
        }

        match key.code {
            KeyCode::PageUp => {
                self.scroll = (self.scroll + SCROLL_PAGE).min(self.max_scroll.get());
                return ConversationAction::None;
            }
            KeyCode::PageDown => {
                self.scroll = self.scroll.saturating_sub(SCROLL_PAGE);
                return ConversationAction::None;
            }
            _ => {}
        }

        match self.composer.handle_key(key) {
            ComposerResult::Submitted(input) => {
                self.notice = None;
                self.warning = None;
                ConversationAction::Submit(input)
            }
            ComposerResult::Command(command) => self.handle_slash_command(command),
            ComposerResult::None => ConversationAction::None,
        }
    }

    /// Mark a submission in flight; the next draw shows the typing indicator
    pub fn begin_submit(&mut self) {
        self.pending = true;
        self.composer.set_focus(false);
    }

    /// Run one turn to completion. Input is not read while this is awaited.
    pub async fn submit(&mut self, input: &str) {
        let _ = self.session.submit(input).await;
        self.pending = false;
        self.scroll = 0;
        self.composer.set_focus(true);
        self.drain_events();
    }

    fn clear(&mut self) {
        self.session.clear();
        self.composer.clear();
        self.notice = None;
        self.scroll = 0;
        self.drain_events();
    }

    /// Apply queued session signals to the status line
    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                SessionEvent::Warning { message } => self.warning = Some(message),
                SessionEvent::Refresh { .. } => self.warning = None,
            }
        }
    }

    /// Handle slash commands
    fn handle_slash_command(&mut self, command: SlashCommand) -> ConversationAction {
        match command {
            SlashCommand::Clear => {
                self.clear();
                ConversationAction::None
            }
            SlashCommand::Help => {
                self.notice = Some(get_help_text());
                ConversationAction::None
            }
            SlashCommand::Bye => ConversationAction::Exit,
        }
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    /// Render the conversation UI components
    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let main_area = if self.ui.show_sidebar {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(32), Constraint::Min(20)])
                .split(area);
            self.render_sidebar(columns[0], buf);
            columns[1]
        } else {
            area
        };

        let notice_height = self
            .notice
            .as_ref()
            .map(|n| n.lines().count() as u16 + 2)
            .unwrap_or(0);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),             // Title
                Constraint::Min(5),                // History
                Constraint::Length(notice_height), // Help
                Constraint::Length(1),             // Status
                Constraint::Length(3),             // Composer
            ])
            .split(main_area);

        let title = Line::from(Span::styled(
            self.ui.title.as_str(),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ));
        if chunks[0].height > 0 {
            buf.set_line(chunks[0].x, chunks[0].y, &title, chunks[0].width);
        }

        let history = ConversationHistory::new(self.session.transcript().turns())
            .pending(self.pending)
            .scroll(self.scroll);
        self.max_scroll.set(history.max_scroll(chunks[1]));
        history.render(chunks[1], buf);

        if let Some(notice) = &self.notice {
            Paragraph::new(notice.as_str())
                .block(Block::default().borders(Borders::ALL).title("Help"))
                .render(chunks[2], buf);
        }

        if let Some(warning) = self.warning.as_ref().filter(|_| chunks[3].height > 0) {
            let line = Line::from(Span::styled(
                format!("⚠ {warning}"),
                Style::default().fg(Color::Yellow),
            ));
            buf.set_line(chunks[3].x, chunks[3].y, &line, chunks[3].width);
        }

        self.composer.render(chunks[4], buf);
    }

    fn render_sidebar(&self, area: Rect, buf: &mut Buffer) {
        let started = self.session.created_at().format("%H:%M");
        let text = vec![
            Line::from(WELCOME_TEXT),
            Line::from(""),
            Line::from(Span::styled(
                format!("Session started {started} UTC"),
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(Span::styled(
                "/clear to start over",
                Style::default().fg(Color::DarkGray),
            )),
        ];

        Paragraph::new(text)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Welcome to Your Helpline"),
            )
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CallError;
    use crate::events::Message;
    use crate::llm::CompletionClient;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Canned;

    #[async_trait]
    impl CompletionClient for Canned {
        async fn complete(&self, _transcript: &[Message]) -> Result<String, CallError> {
            Ok("That sounds hard.".to_string())
        }
    }

    fn manager() -> ConversationManager {
        let session = Session::new(Arc::from("primer"), Arc::new(Canned));
        ConversationManager::new(session, UiConfig::default())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn blank_submission_sets_warning() {
        let mut manager = manager();
        manager.handle_key(key(KeyCode::Char(' ')));
        let ConversationAction::Submit(input) = manager.handle_key(key(KeyCode::Enter)) else {
            panic!("expected a submission");
        };

        manager.begin_submit();
        manager.submit(&input).await;
        assert_eq!(manager.warning(), Some("Please enter a message before sending."));
        assert_eq!(manager.session().transcript().len(), 1);
    }

    #[tokio::test]
    async fn ctrl_l_clears_the_conversation() {
        let mut manager = manager();
        manager.submit("hello").await;
        assert_eq!(manager.session().transcript().len(), 3);

        manager.handle_key(KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL));
        assert_eq!(manager.session().transcript().len(), 1);
    }

    #[tokio::test]
    async fn page_keys_scroll_within_the_history() {
        let mut manager = manager();
        for i in 0..12 {
            manager.submit(&format!("message {i}")).await;
        }

        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        manager.render(area, &mut buf);
        let max = manager.max_scroll.get();
        assert!(max > SCROLL_PAGE);

        manager.handle_key(key(KeyCode::PageUp));
        assert_eq!(manager.scroll, SCROLL_PAGE);
        for _ in 0..20 {
            manager.handle_key(key(KeyCode::PageUp));
        }
        assert_eq!(manager.scroll, max);

        manager.handle_key(key(KeyCode::PageDown));
        assert_eq!(manager.scroll, max - SCROLL_PAGE);

        manager.submit("one more").await;
        assert_eq!(manager.scroll, 0);
    }

    #[test]
    fn renders_into_common_terminal_sizes() {
        let manager = manager();
        for (w, h) in [(80, 24), (120, 40)] {
            let area = Rect::new(0, 0, w, h);
            let mut buf = Buffer::empty(area);
            manager.render(area, &mut buf);
        }
    }
}
