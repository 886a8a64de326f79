// Library interface for chatbot-cli
// This allows integration tests to access internal modules

// NOTE: These modules are also declared in main.rs, so they are pulled in
// with a path attribute to avoid "file loaded multiple times" errors.

#[path = "commands.rs"]
pub mod commands;

#[path = "theme.rs"]
pub mod theme;

#[path = "document.rs"]
pub mod document;

#[path = "panel.rs"]
pub mod panel;

// Re-export commonly used items for easier testing
pub use commands::{handle_command, CommandResult};
pub use document::{Document, SharedDocument};
pub use panel::{NoticeLevel, TuiNotifier, TuiSurface, TuiSurfaceFactory, UiEvent};
pub use theme::Theme;
