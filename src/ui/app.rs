//! Application shell: terminal lifecycle, event loop, key routing.

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame, Terminal,
};

use crate::backend::ChatBackend;
use crate::config::Config;
use crate::controller::ConversationController;
use crate::ui::commands::{get_help_text, ParsedCommand, SlashCommand};
use crate::ui::composer::{Composer, ComposerResult};
use crate::ui::picker::{ConversationPicker, PickerResult};
use crate::ui::system_panel::{SystemPanel, SystemPanelResult};
use crate::ui::transcript::TranscriptView;

pub struct ChatApp {
    controller: ConversationController,
    composer: Composer,
    transcript: TranscriptView,
    picker: ConversationPicker,
    system_panel: SystemPanel,
    backend: Arc<dyn ChatBackend>,
    tick_rate: Duration,
    status: Option<String>,
    help_open: bool,
    awaiting_send: bool,
    should_quit: bool,
}

impl ChatApp {
    pub fn new(backend: Arc<dyn ChatBackend>, config: &Config) -> Self {
        let controller = ConversationController::new(
            Arc::clone(&backend),
            config.system_message.clone(),
            config.export_dir.clone(),
        );
        Self {
            controller,
            composer: Composer::new("Type your message...".to_string()),
            transcript: TranscriptView::new(config.ui.show_timestamps),
            picker: ConversationPicker::new(),
            system_panel: SystemPanel::default(),
            backend,
            tick_rate: Duration::from_millis(config.ui.tick_rate_ms),
            status: None,
            help_open: false,
            awaiting_send: false,
            should_quit: false,
        }
    }

    /// Enter the alternate screen and run until the user quits.
    pub async fn run(mut self) -> Result<()> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let mut terminal =
            Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")?;

        let result = self.event_loop(&mut terminal).await;

        disable_raw_mode().ok();
        execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
        terminal.show_cursor().ok();

        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> Result<()> {
        self.composer.set_focus(true);

        while !self.should_quit {
            self.tick();
            terminal.draw(|frame| self.draw(frame))?;

            if event::poll(self.tick_rate).context("Failed to poll terminal events")? {
                if let Event::Key(key) = event::read().context("Failed to read terminal event")? {
                    self.handle_key(key);
                }
            }
        }

        Ok(())
    }

    /// Apply finished backend requests and derived UI state.
    fn tick(&mut self) {
        self.controller.poll();
        self.picker.poll();

        if let Some(status) = self.controller.take_status() {
            self.status = Some(status);
        }

        // The draft is cleared by the controller only on a successful
        // send; mirror that into the input box.
        if self.awaiting_send && !self.controller.is_loading() {
            if self.controller.draft().is_empty() {
                self.composer.clear();
            }
            self.awaiting_send = false;
        }

        self.transcript.prune_selection(self.controller.history());
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        // Ctrl+C always exits.
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if self.help_open {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                self.help_open = false;
            }
            return;
        }

        if self.controller.show_system_panel() {
            match self.system_panel.handle_key(key) {
                SystemPanelResult::Save(prompt) => {
                    self.controller.set_system_message(prompt);
                    self.controller.update_system_message();
                }
                SystemPanelResult::Cancel => self.controller.close_system_panel(),
                SystemPanelResult::None => {}
            }
            return;
        }

        if self.picker.is_open() {
            if let PickerResult::Selected(id) = self.picker.handle_key(key) {
                self.controller.load_conversation(id);
            }
            return;
        }

        // With an empty input box, Up/Down walk AI replies and +/- rate
        // the selected one.
        if self.composer.content().is_empty() && !self.composer.palette_open() {
            match key.code {
                KeyCode::Up => {
                    self.transcript.select_prev(self.controller.history());
                    return;
                }
                KeyCode::Down => {
                    self.transcript.select_next(self.controller.history());
                    return;
                }
                KeyCode::Char('+') => {
                    if let Some(id) = self.transcript.selected() {
                        self.controller.send_feedback(id, true);
                    }
                    return;
                }
                KeyCode::Char('-') => {
                    if let Some(id) = self.transcript.selected() {
                        self.controller.send_feedback(id, false);
                    }
                    return;
                }
                _ => {}
            }
        }

        match self.composer.handle_key(key) {
            ComposerResult::Submitted(content) => {
                // The submit path is disabled while a request is in
                // flight; the typed text stays in the box.
                if !self.controller.is_busy() {
                    self.controller.set_draft(content);
                    self.controller.send_message();
                    self.awaiting_send = self.controller.is_loading();
                }
            }
            ComposerResult::Command(command) => self.handle_command(command),
            ComposerResult::None => {}
        }
    }

    fn handle_command(&mut self, command: ParsedCommand) {
        match command.command {
            SlashCommand::New => {
                self.controller.start_new_conversation();
                self.status = Some("Started a new conversation".to_string());
            }
            SlashCommand::Clear => self.controller.clear_conversation(),
            SlashCommand::Conversations => {
                self.picker.open(
                    Arc::clone(&self.backend),
                    self.controller.session_conversations(),
                );
            }
            SlashCommand::System => {
                if let Some(prompt) = command.argument() {
                    self.controller.set_system_message(prompt.to_string());
                    self.controller.update_system_message();
                } else {
                    self.controller.toggle_system_panel();
                    if self.controller.show_system_panel() {
                        self.system_panel.open_with(self.controller.system_message());
                    }
                }
            }
            SlashCommand::Export => self.controller.export_conversation(),
            SlashCommand::Help => self.help_open = true,
            SlashCommand::Quit => self.should_quit = true,
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(10),
                Constraint::Length(4),
                Constraint::Length(1),
            ])
            .split(frame.size());

        let buf = frame.buffer_mut();

        self.transcript.render(
            self.controller.history(),
            self.controller.is_loading(),
            chunks[0],
            buf,
        );

        if self.controller.is_chat_active() {
            Widget::render(&self.composer, chunks[1], buf);
        }

        self.render_status_bar(chunks[2], buf);

        if self.picker.is_open() {
            self.picker.render(self.controller.conversation_id(), chunks[0], buf);
        }
        if self.controller.show_system_panel() {
            self.system_panel.render(chunks[0], buf);
        }
        if self.help_open {
            render_help(chunks[0], buf);
        }
    }

    fn render_status_bar(&self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        let mut spans = vec![
            Span::styled(
                format!(" conversation {} ", self.controller.conversation_id()),
                Style::default().fg(Color::DarkGray),
            ),
        ];

        if self.controller.is_loading() {
            spans.push(Span::styled("⏳ waiting… ", Style::default().fg(Color::Yellow)));
        }

        if let Some(status) = &self.status {
            spans.push(Span::styled(
                status.clone(),
                Style::default().fg(Color::Green),
            ));
        } else {
            spans.push(Span::styled(
                "/ commands  Ctrl+C quit",
                Style::default().fg(Color::DarkGray),
            ));
        }

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}

fn render_help(area: Rect, buf: &mut ratatui::buffer::Buffer) {
    let width = area.width.saturating_sub(8).min(70);
    let height = area.height.saturating_sub(4).min(16);
    let overlay = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };
    Clear.render(overlay, buf);

    let paragraph = Paragraph::new(get_help_text())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help")
                .style(Style::default().fg(Color::Blue)),
        );
    paragraph.render(overlay, buf);
}
