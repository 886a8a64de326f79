use crate::editor::DocumentEditor;
use crate::error::ChatbotError;
use crate::markdown;
use crate::transport::TransportAdapter;

/// What was inserted below the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCode {
    pub line: usize,
    pub code: String,
}

/// Ask for code based on the selected text and insert it on the line after
/// the selection. Code blocks in the answer are preferred over its prose.
pub async fn generate_below_selection(
    editor: &dyn DocumentEditor,
    transport: &TransportAdapter,
) -> Result<GeneratedCode, ChatbotError> {
    let selection = editor.selection()?.ok_or(ChatbotError::EmptySelection)?;
    if selection.text.trim().is_empty() {
        return Err(ChatbotError::EmptySelection);
    }

    let answer = transport
        .ask(&selection.text)
        .await
        .map_err(ChatbotError::Transport)?;

    let mut code = markdown::extract_code(&answer).unwrap_or(answer);
    if !code.ends_with('\n') {
        code.push('\n');
    }

    let line = selection.end_line + 1;
    editor.insert_at_line(line, &code)?;
    tracing::info!("Inserted {} generated line(s) at line {line}", code.lines().count());

    Ok(GeneratedCode { line, code })
}
