//! Conversation picker overlay

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};
use tokio::sync::oneshot;
use tracing::error;

use crate::backend::{BackendError, ChatBackend, ConversationSummary};
use crate::conversation::ConversationId;

/// What the picker wants the app to do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerResult {
    None,
    Close,
    Selected(ConversationId),
}

/// Overlay listing prior conversation ids. The backend listing arrives
/// asynchronously and is merged with ids created locally this session,
/// so a just-started conversation is selectable before the backend has
/// persisted anything for it.
pub struct ConversationPicker {
    open: bool,
    entries: Vec<ConversationId>,
    selected: usize,
    rx: Option<oneshot::Receiver<Result<Vec<ConversationSummary>, BackendError>>>,
}

impl ConversationPicker {
    pub fn new() -> Self {
        Self {
            open: false,
            entries: Vec::new(),
            selected: 0,
            rx: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open the overlay and kick off the backend listing.
    pub fn open(&mut self, backend: Arc<dyn ChatBackend>, session: &[ConversationId]) {
        self.open = true;
        self.selected = 0;
        // Session-local ids, newest first, until the listing arrives.
        self.entries = session.iter().rev().cloned().collect();

        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = tx.send(backend.list_conversations().await);
        });
        self.rx = Some(rx);
    }

    pub fn close(&mut self) {
        self.open = false;
        self.rx = None;
    }

    /// Merge a finished listing, if any. Called once per UI tick.
    pub fn poll(&mut self) {
        let Some(rx) = self.rx.as_mut() else { return };
        match rx.try_recv() {
            Ok(Ok(summaries)) => {
                self.rx = None;
                let fetched: Vec<ConversationId> =
                    summaries.into_iter().map(|s| s.id).collect();
                self.entries = merge_entries(std::mem::take(&mut self.entries), fetched);
                self.selected = self.selected.min(self.entries.len().saturating_sub(1));
            }
            Ok(Err(err)) => {
                // Listing failure is non-fatal: the session-local ids stay.
                error!("error listing conversations: {err}");
                self.rx = None;
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
            Err(oneshot::error::TryRecvError::Closed) => {
                self.rx = None;
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PickerResult {
        if key.kind != KeyEventKind::Press {
            return PickerResult::None;
        }

        match key.code {
            KeyCode::Esc => {
                self.close();
                PickerResult::Close
            }
            KeyCode::Up => {
                if !self.entries.is_empty() {
                    self.selected = if self.selected == 0 {
                        self.entries.len() - 1
                    } else {
                        self.selected - 1
                    };
                }
                PickerResult::None
            }
            KeyCode::Down => {
                if !self.entries.is_empty() {
                    self.selected = (self.selected + 1) % self.entries.len();
                }
                PickerResult::None
            }
            KeyCode::Enter => match self.entries.get(self.selected) {
                Some(id) => {
                    let id = id.clone();
                    self.close();
                    PickerResult::Selected(id)
                }
                None => PickerResult::None,
            },
            _ => PickerResult::None,
        }
    }

    pub fn render(&self, active_id: &ConversationId, area: Rect, buf: &mut Buffer) {
        if !self.open {
            return;
        }

        let overlay = centered(area, 48, (self.entries.len().min(10) + 2) as u16 + 2);
        Clear.render(overlay, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .title("🗂 Conversations")
            .style(Style::default().fg(Color::Blue));
        let inner = block.inner(overlay);
        block.render(overlay, buf);

        if self.entries.is_empty() {
            let line = Line::from(vec![Span::styled(
                "No conversations yet",
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner.x, inner.y, &line, inner.width);
            return;
        }

        for (index, id) in self.entries.iter().enumerate() {
            if index >= inner.height as usize {
                break;
            }

            let is_selected = index == self.selected;
            let style = if is_selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            let suffix = if id == active_id { "  (active)" } else { "" };
            let line = Line::from(vec![
                Span::styled(id.clone(), style),
                Span::styled(suffix, Style::default().fg(Color::Green)),
            ]);
            buf.set_line(inner.x, inner.y + index as u16, &line, inner.width);
        }
    }
}

impl Default for ConversationPicker {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep session entries first, then backend entries not already known.
fn merge_entries(
    session: Vec<ConversationId>,
    fetched: Vec<ConversationId>,
) -> Vec<ConversationId> {
    let mut merged = session;
    for id in fetched {
        if !merged.contains(&id) {
            merged.push(id);
        }
    }
    merged
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
