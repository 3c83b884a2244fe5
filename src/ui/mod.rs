//! Terminal UI for the chat client

pub mod app;
pub mod commands;
pub mod composer;
pub mod picker;
pub mod system_panel;
pub mod transcript;

pub use app::ChatApp;
pub use commands::{get_help_text, ParsedCommand, SlashCommand};
pub use composer::Composer;
pub use picker::ConversationPicker;
pub use system_panel::SystemPanel;
pub use transcript::TranscriptView;
