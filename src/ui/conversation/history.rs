//! Conversation history display component

use crate::events::{Message, Role};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Renders the user and assistant entries of a transcript, newest at the bottom
pub struct ConversationHistory<'a> {
    messages: &'a [Message],
    pending: bool,
    /// Lines scrolled up from the bottom
    scroll: usize,
}

impl<'a> ConversationHistory<'a> {
    pub fn new(messages: &'a [Message]) -> Self {
        Self {
            messages,
            pending: false,
            scroll: 0,
        }
    }

    /// Show the typing indicator below the last entry
    pub fn pending(mut self, pending: bool) -> Self {
        self.pending = pending;
        self
    }

    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    /// Furthest the view can scroll up when drawn into `area`
    pub fn max_scroll(&self, area: Rect) -> usize {
        let inner = block().inner(area);
        self.lines(inner.width)
            .len()
            .saturating_sub(inner.height as usize)
    }

    /// All lines for the visible roles, before bottom-clipping
    pub fn lines(&self, width: u16) -> Vec<Line<'static>> {
        let mut all_lines = Vec::new();
        for message in self.messages.iter().filter(|m| m.role != Role::System) {
            all_lines.extend(render_message(message, width));
            all_lines.push(Line::from(""));
        }

        if self.pending {
            all_lines.push(Line::from(Span::styled(
                "Assistant is typing...",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::ITALIC),
            )));
        }

        all_lines
    }
}

impl Widget for ConversationHistory<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = block();
        let inner_area = block.inner(area);
        block.render(area, buf);

        let all_lines = self.lines(inner_area.width);
        if all_lines.is_empty() {
            let welcome_lines = [
                Line::from(Span::styled(
                    "Share what's on your mind below.",
                    Style::default().fg(Color::Gray),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Press Enter to send. Type /help for commands.",
                    Style::default().fg(Color::DarkGray),
                )),
            ];

            for (i, line) in welcome_lines.iter().enumerate() {
                if i < inner_area.height as usize {
                    buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
                }
            }
            return;
        }

        let height = inner_area.height as usize;
        let start = all_lines
            .len()
            .saturating_sub(height)
            .saturating_sub(self.scroll);
        for (i, line) in all_lines[start..].iter().take(height).enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

fn block() -> Block<'static> {
    Block::default().borders(Borders::ALL).title("Conversation")
}

/// Render a single message into lines
fn render_message(message: &Message, width: u16) -> Vec<Line<'static>> {
    let style = content_style(message.role);
    let timestamp = message.timestamp.format("%H:%M:%S").to_string();

    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!("{}:", message.role.display_name()),
            style.add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {timestamp}"), Style::default().fg(Color::DarkGray)),
    ])];

    for content_line in wrap_text(&message.content, width.saturating_sub(2) as usize) {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(content_line, style),
        ]));
    }

    lines
}

fn content_style(role: Role) -> Style {
    match role {
        Role::User => Style::default().fg(Color::Blue),
        Role::Assistant => Style::default().fg(Color::Green),
        Role::System => Style::default().fg(Color::Yellow),
    }
}

/// Greedy word wrap by display width that keeps explicit line breaks.
///
/// Words wider than `width` are split across lines.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current_line = String::new();
        let mut current_width = 0;

        for word in paragraph.split_whitespace() {
            let word_width = word.width();
            if word_width > width {
                if current_width > 0 {
                    lines.push(std::mem::take(&mut current_line));
                    current_width = 0;
                }
                for c in word.chars() {
                    let char_width = c.width().unwrap_or(0);
                    if current_width > 0 && current_width + char_width > width {
                        lines.push(std::mem::take(&mut current_line));
                        current_width = 0;
                    }
                    current_line.push(c);
                    current_width += char_width;
                }
                continue;
            }

            if current_width > 0 && current_width + 1 + word_width > width {
                lines.push(std::mem::take(&mut current_line));
                current_width = 0;
            }
            if current_width > 0 {
                current_line.push(' ');
                current_width += 1;
            }
            current_line.push_str(word);
            current_width += word_width;
        }

        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}
