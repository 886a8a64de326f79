use crate::error::ChatbotError;

/// The selected region of the active document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub text: String,
    /// Zero-based line on which the selection ends.
    pub end_line: usize,
}

/// Editing hooks into the host's active document.
///
/// Every method fails with [`ChatbotError::NoActiveDocument`] when no
/// document is focused.
pub trait DocumentEditor: Send + Sync {
    /// Insert `text` at the cursor and move the cursor past it.
    fn insert_at_cursor(&self, text: &str) -> Result<(), ChatbotError>;

    /// Insert `text` at the start of `line`. A line past the end appends.
    fn insert_at_line(&self, line: usize, text: &str) -> Result<(), ChatbotError>;

    /// The current selection, `None` if nothing is selected.
    fn selection(&self) -> Result<Option<Selection>, ChatbotError>;
}

/// Host-level toasts.
pub trait Notifier: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}
