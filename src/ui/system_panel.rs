//! System prompt editor overlay

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

/// What the panel wants the app to do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemPanelResult {
    None,
    /// Enter: push the edited prompt to the backend.
    Save(String),
    /// Esc: discard the edit, keep the previous prompt.
    Cancel,
}

/// Editor for the conversation's system prompt. Opened prefilled with
/// the current prompt; the controller closes it only once the backend
/// accepts the update.
#[derive(Debug, Clone, Default)]
pub struct SystemPanel {
    content: String,
    cursor: usize,
}

impl SystemPanel {
    /// Prefill the editor with the current prompt.
    pub fn open_with(&mut self, prompt: &str) {
        self.content = prompt.to_string();
        self.cursor = self.content.len();
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> SystemPanelResult {
        if key.kind != KeyEventKind::Press {
            return SystemPanelResult::None;
        }

        match key.code {
            KeyCode::Enter => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.insert('\n');
                    SystemPanelResult::None
                } else {
                    SystemPanelResult::Save(self.content.clone())
                }
            }
            KeyCode::Esc => SystemPanelResult::Cancel,
            KeyCode::Char(c) => {
                self.insert(c);
                SystemPanelResult::None
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    let prev = self.content[..self.cursor]
                        .chars()
                        .next_back()
                        .map(|c| c.len_utf8())
                        .unwrap_or(1);
                    self.cursor -= prev;
                    self.content.remove(self.cursor);
                }
                SystemPanelResult::None
            }
            KeyCode::Left => {
                if self.cursor > 0 {
                    let prev = self.content[..self.cursor]
                        .chars()
                        .next_back()
                        .map(|c| c.len_utf8())
                        .unwrap_or(1);
                    self.cursor -= prev;
                }
                SystemPanelResult::None
            }
            KeyCode::Right => {
                if self.cursor < self.content.len() {
                    let next = self.content[self.cursor..]
                        .chars()
                        .next()
                        .map(|c| c.len_utf8())
                        .unwrap_or(1);
                    self.cursor += next;
                }
                SystemPanelResult::None
            }
            KeyCode::Home => {
                self.cursor = 0;
                SystemPanelResult::None
            }
            KeyCode::End => {
                self.cursor = self.content.len();
                SystemPanelResult::None
            }
            _ => SystemPanelResult::None,
        }
    }

    fn insert(&mut self, c: char) {
        self.content.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let height = (self.content.lines().count().max(1) as u16 + 4).min(area.height);
        let overlay = centered(area, area.width.saturating_sub(8).min(64), height);
        Clear.render(overlay, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .title("⚙ System prompt")
            .style(Style::default().fg(Color::Yellow));
        let inner = block.inner(overlay);
        block.render(overlay, buf);

        let mut content = self.content.clone();
        content.insert(self.cursor.min(content.len()), '▌');

        let mut row = 0u16;
        for line_text in content.split('\n') {
            if row + 1 >= inner.height {
                break;
            }
            let line = Line::from(vec![Span::raw(line_text.to_string())]);
            buf.set_line(inner.x, inner.y + row, &line, inner.width);
            row += 1;
        }

        let hint = Line::from(vec![Span::styled(
            "Enter: save   Shift+Enter: newline   Esc: cancel",
            Style::default().fg(Color::DarkGray),
        )]);
        buf.set_line(inner.x, inner.y + inner.height.saturating_sub(1), &hint, inner.width);
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
