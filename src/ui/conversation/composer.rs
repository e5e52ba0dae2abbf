use crate::ui::conversation::commands::{self, CommandEntry, SlashCommand, command_entries};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Result returned when the user interacts with the conversation composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    /// Text to hand to the session; may be blank, the session decides
    Submitted(String),
    Command(SlashCommand),
    None,
}

/// Single-line input box with a slash-command palette
#[derive(Debug, Clone)]
pub struct ConversationComposer {
    content: String,
    /// Byte offset, always on a char boundary
    cursor: usize,
    title: String,
    placeholder: String,
    has_focus: bool,
    command_entries: Vec<CommandEntry>,
    filtered_commands: Vec<CommandEntry>,
    selected_command: Option<usize>,
}

impl ConversationComposer {
    pub fn new(title: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            cursor: 0,
            title: title.into(),
            placeholder: placeholder.into(),
            has_focus: true,
            command_entries: command_entries(),
            filtered_commands: Vec::new(),
            selected_command: None,
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        match key.code {
            KeyCode::Enter => {
                if self.palette_open()
                    && !self.selection_is_typed()
                    && self.apply_selected_command()
                {
                    return ComposerResult::None;
                }
                let content = std::mem::take(&mut self.content);
                self.cursor = 0;
                self.close_command_palette();

                return match commands::parse_slash_command(&content) {
                    Some(command) => ComposerResult::Command(command),
                    None => ComposerResult::Submitted(content),
                };
            }
            KeyCode::Up if self.palette_open() => self.move_command_selection(-1),
            KeyCode::Down if self.palette_open() => self.move_command_selection(1),
            KeyCode::Tab if self.palette_open() => {
                self.apply_selected_command();
            }
            KeyCode::Char(c) => {
                self.content.insert(self.cursor, c);
                self.cursor += c.len_utf8();
                self.sync_command_palette();
            }
            KeyCode::Backspace => {
                if let Some(prev) = self.prev_boundary() {
                    self.content.remove(prev);
                    self.cursor = prev;
                    self.sync_command_palette();
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.content.len() {
                    self.content.remove(self.cursor);
                    self.sync_command_palette();
                }
            }
            KeyCode::Left => {
                if let Some(prev) = self.prev_boundary() {
                    self.cursor = prev;
                }
            }
            KeyCode::Right => {
                if let Some(c) = self.content[self.cursor..].chars().next() {
                    self.cursor += c.len_utf8();
                }
            }
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.content.len(),
            _ => {}
        }

        ComposerResult::None
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.content[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(idx, _)| idx)
    }

    pub fn palette_open(&self) -> bool {
        !self.filtered_commands.is_empty()
    }

    /// Show matching commands while the input is a bare `/word`
    fn sync_command_palette(&mut self) {
        let Some(query) = self.content.strip_prefix('/') else {
            self.close_command_palette();
            return;
        };
        if query.contains(char::is_whitespace) {
            self.close_command_palette();
            return;
        }

        let query = query.to_lowercase();
        self.filtered_commands = self
            .command_entries
            .iter()
            .filter(|entry| entry.keyword.starts_with(&query))
            .copied()
            .collect();

        self.selected_command = if self.filtered_commands.is_empty() {
            None
        } else {
            Some(
                self.selected_command
                    .unwrap_or(0)
                    .min(self.filtered_commands.len() - 1),
            )
        };
    }

    fn close_command_palette(&mut self) {
        self.filtered_commands.clear();
        self.selected_command = None;
    }

    fn move_command_selection(&mut self, delta: isize) {
        if self.filtered_commands.is_empty() {
            self.selected_command = None;
            return;
        }

        let len = self.filtered_commands.len() as isize;
        let current = self.selected_command.unwrap_or(0) as isize;
        self.selected_command = Some((current + delta).rem_euclid(len) as usize);
    }

    fn selected_entry(&self) -> Option<CommandEntry> {
        self.selected_command
            .and_then(|index| self.filtered_commands.get(index).copied())
    }

    /// The input already spells out the highlighted command
    fn selection_is_typed(&self) -> bool {
        self.selected_entry().is_some_and(|entry| {
            self.content
                .strip_prefix('/')
                .is_some_and(|typed| typed.eq_ignore_ascii_case(entry.keyword))
        })
    }

    fn apply_selected_command(&mut self) -> bool {
        let Some(entry) = self.selected_entry() else {
            return false;
        };

        self.content = format!("/{}", entry.keyword);
        self.cursor = self.content.len();
        self.close_command_palette();
        true
    }

    /// Set focus state
    pub fn set_focus(&mut self, has_focus: bool) {
        self.has_focus = has_focus;
    }

    /// Get current content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Clear content
    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
        self.close_command_palette();
    }
}

impl Widget for &ConversationComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.title.as_str())
            .style(if self.has_focus {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            });

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.content.is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                self.placeholder.as_str(),
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
        } else {
            let mut content = self.content.clone();
            if self.has_focus {
                content.insert(self.cursor, '▌');
            }
            let line = Line::from(vec![Span::raw(content)]);
            buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
        }

        if self.palette_open() {
            let palette_height = (self.filtered_commands.len().min(5) + 2) as u16;
            let palette_area = Rect {
                x: area.x,
                y: area.y.saturating_sub(palette_height),
                width: area.width,
                height: palette_height.min(area.y),
            };

            let block = Block::default()
                .borders(Borders::ALL)
                .title("Commands")
                .style(Style::default().fg(Color::Blue));
            let inner = block.inner(palette_area);
            block.render(palette_area, buf);

            for (index, entry) in self.filtered_commands.iter().enumerate() {
                if index >= inner.height as usize {
                    break;
                }

                let style = if self.selected_command == Some(index) {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };

                let line = Line::from(vec![
                    Span::styled(format!("/{}", entry.keyword), style),
                    Span::styled(" - ", Style::default().fg(Color::DarkGray)),
                    Span::styled(entry.description, Style::default().fg(Color::Gray)),
                ]);

                buf.set_line(inner.x, inner.y + index as u16, &line, inner.width);
            }
        }
    }
}
