//! Transcript display component

use crate::conversation::{ChatHistory, ChatMessage, DeliveryStatus, Feedback, MessageId, Sender};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Renders the conversation transcript bottom-anchored, with delivery
/// status and feedback markers. Owns the feedback cursor: Up/Down moves
/// the selection across AI replies so + / - can rate them.
#[derive(Clone, Default)]
pub struct TranscriptView {
    selected: Option<MessageId>,
    show_timestamps: bool,
}

impl TranscriptView {
    pub fn new(show_timestamps: bool) -> Self {
        Self {
            selected: None,
            show_timestamps,
        }
    }

    pub fn selected(&self) -> Option<MessageId> {
        self.selected
    }

    /// Move the feedback cursor to the previous AI reply.
    pub fn select_prev(&mut self, history: &ChatHistory) {
        let ids = history.ai_message_ids();
        if ids.is_empty() {
            self.selected = None;
            return;
        }
        let index = self
            .selected
            .and_then(|id| ids.iter().position(|&candidate| candidate == id));
        self.selected = match index {
            Some(0) | None => ids.last().copied(),
            Some(i) => Some(ids[i - 1]),
        };
    }

    /// Move the feedback cursor to the next AI reply.
    pub fn select_next(&mut self, history: &ChatHistory) {
        let ids = history.ai_message_ids();
        if ids.is_empty() {
            self.selected = None;
            return;
        }
        let index = self
            .selected
            .and_then(|id| ids.iter().position(|&candidate| candidate == id));
        self.selected = match index {
            Some(i) if i + 1 < ids.len() => Some(ids[i + 1]),
            _ => ids.first().copied(),
        };
    }

    /// Drop the selection if its message no longer exists (conversation
    /// switched or cleared).
    pub fn prune_selection(&mut self, history: &ChatHistory) {
        if let Some(id) = self.selected {
            if history.get(id).is_none() {
                self.selected = None;
            }
        }
    }

    pub fn render(&self, history: &ChatHistory, loading: bool, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("💬 Conversation");

        let inner_area = block.inner(area);
        block.render(area, buf);

        if history.is_empty() && !loading {
            let welcome_lines = vec![
                Line::from(vec![Span::styled(
                    "Welcome to chatr!",
                    Style::default().fg(Color::Green),
                )]),
                Line::from(vec![Span::raw("")]),
                Line::from(vec![Span::styled(
                    "Type a message below to start chatting.",
                    Style::default().fg(Color::Gray),
                )]),
                Line::from(vec![Span::styled(
                    "Press / for commands, Up/Down to pick a reply to rate.",
                    Style::default().fg(Color::DarkGray),
                )]),
            ];

            for (i, line) in welcome_lines.iter().enumerate() {
                if i < inner_area.height as usize {
                    buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
                }
            }
            return;
        }

        let mut all_lines: Vec<Line> = Vec::new();
        for message in history.iter() {
            let mut lines = self.render_message(message, inner_area.width);
            all_lines.append(&mut lines);
            all_lines.push(Line::from(vec![Span::raw("")]));
        }

        if loading {
            all_lines.push(Line::from(vec![Span::styled(
                "🤖 Thinking…",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )]));
        }

        // Show the newest lines that fit.
        let height = inner_area.height as usize;
        let total = all_lines.len();
        let start = total.saturating_sub(height);
        let visible = &all_lines[start..];

        for (i, line) in visible.iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }

    /// Render a single message into lines
    fn render_message(&self, message: &ChatMessage, width: u16) -> Vec<Line> {
        let mut lines = Vec::new();

        let role_icon = match message.sender {
            Sender::User => "👤",
            Sender::Ai => "🤖",
        };

        let is_selected = self.selected == Some(message.id);
        let marker = if is_selected { "▶ " } else { "" };

        let mut header = format!("{}{}", marker, role_icon);
        if self.show_timestamps {
            header.push_str(&format!(" {}", message.timestamp.format("%H:%M:%S")));
        }
        header.push_str(&format!(" {}", "─".repeat(20)));

        let header_style = if is_selected {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        lines.push(Line::from(vec![Span::styled(header, header_style)]));

        let content_lines = wrap_text(&message.text, width.saturating_sub(2) as usize);
        for content_line in content_lines {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(content_line, content_style(message)),
            ]));
        }

        if let Some(status_line) = status_line(message) {
            lines.push(status_line);
        }

        lines
    }
}

fn content_style(message: &ChatMessage) -> Style {
    let base = match message.sender {
        Sender::User => Style::default().fg(Color::Blue),
        Sender::Ai => Style::default().fg(Color::Green),
    };
    match message.status {
        DeliveryStatus::Pending => base.add_modifier(Modifier::DIM),
        DeliveryStatus::Failed => Style::default().fg(Color::Red),
        DeliveryStatus::Confirmed => base,
    }
}

/// Status or feedback footer under a message, when there is one.
fn status_line(message: &ChatMessage) -> Option<Line<'static>> {
    match message.status {
        DeliveryStatus::Pending => Some(Line::from(vec![Span::styled(
            "  … sending",
            Style::default().fg(Color::DarkGray),
        )])),
        DeliveryStatus::Failed => Some(Line::from(vec![Span::styled(
            "  ✗ not delivered",
            Style::default().fg(Color::Red),
        )])),
        DeliveryStatus::Confirmed => match message.feedback {
            Some(Feedback::Positive) => Some(Line::from(vec![Span::styled(
                "  👍 rated helpful",
                Style::default().fg(Color::Green),
            )])),
            Some(Feedback::Negative) => Some(Line::from(vec![Span::styled(
                "  👎 rated unhelpful",
                Style::default().fg(Color::Red),
            )])),
            None => None,
        },
    }
}

/// Wrap text to fit within the given width
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.len() + word.len() + 1 <= width {
            if !current_line.is_empty() {
                current_line.push(' ');
            }
            current_line.push_str(word);
        } else {
            if !current_line.is_empty() {
                lines.push(current_line);
                current_line = String::new();
            }
            current_line.push_str(word);
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_respects_width() {
        let lines = wrap_text("one two three four five", 9);
        assert_eq!(lines, vec!["one two", "three", "four five"]);
    }

    #[test]
    fn wrap_of_empty_text_yields_one_line() {
        assert_eq!(wrap_text("", 10), vec![String::new()]);
    }

    #[test]
    fn selection_walks_ai_replies_only() {
        let mut history = ChatHistory::new();
        history.push_user("q1".to_string());
        history.push_ai("a1".to_string(), MessageId::Server(1));
        history.push_user("q2".to_string());
        history.push_ai("a2".to_string(), MessageId::Server(2));

        let mut view = TranscriptView::new(false);
        view.select_prev(&history);
        assert_eq!(view.selected(), Some(MessageId::Server(2)));
        view.select_prev(&history);
        assert_eq!(view.selected(), Some(MessageId::Server(1)));
        view.select_next(&history);
        assert_eq!(view.selected(), Some(MessageId::Server(2)));
    }

    #[test]
    fn selection_is_pruned_when_history_is_replaced() {
        let mut history = ChatHistory::new();
        history.push_ai("a1".to_string(), MessageId::Server(1));

        let mut view = TranscriptView::new(false);
        view.select_prev(&history);
        assert_eq!(view.selected(), Some(MessageId::Server(1)));

        history.clear();
        view.prune_selection(&history);
        assert_eq!(view.selected(), None);
    }

    #[test]
    fn empty_selection_on_empty_history() {
        let history = ChatHistory::new();
        let mut view = TranscriptView::new(false);
        view.select_next(&history);
        assert_eq!(view.selected(), None);
    }
}
