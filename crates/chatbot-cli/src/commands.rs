use chatbot_core::Command;

/// Result of processing a slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Display a message to the user.
    Message(String),
    /// Quit the application.
    Quit,
    /// Run one of the extension commands.
    Run(Command),
    /// Run an extension command by its raw id.
    RunId(String),
    /// Close the conversation panel.
    ClosePanel,
    /// Clear the persisted transcript.
    ClearHistory,
    /// Copy a code block from the last answer (1-based, `None` = last block).
    Copy(Option<usize>),
    /// Save the document pane to its file.
    SaveDocument,
    /// Select whole lines in the document pane (1-based, inclusive).
    SelectLines(usize, usize),
    /// Change the theme.
    ThemeChanged(String),
    /// Not a command - treat as regular input.
    NotACommand,
}

pub fn handle_command(input: &str) -> CommandResult {
    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/help" | "/h" => show_help(),
        "/exit" | "/quit" | "/q" => CommandResult::Quit,

        // Panel
        "/open" | "/chat" => CommandResult::Run(Command::OpenPanel),
        "/close" => CommandResult::ClosePanel,
        "/clear" => CommandResult::ClearHistory,
        "/copy" => {
            if arg.is_empty() {
                CommandResult::Copy(None)
            } else {
                match arg.parse::<usize>() {
                    Ok(n) if n > 0 => CommandResult::Copy(Some(n)),
                    _ => CommandResult::Message("Usage: /copy [block-number]".into()),
                }
            }
        }

        // Template and code generation
        "/insert" => CommandResult::Run(Command::InsertTemplate),
        "/type" => CommandResult::Run(Command::StartTyping),
        "/stop" => CommandResult::Run(Command::StopTyping),
        "/reset" => CommandResult::Run(Command::ResetTyping),
        "/generate" | "/gen" => CommandResult::Run(Command::GenerateCode),
        "/run" => {
            if arg.is_empty() {
                let ids: Vec<&str> = Command::all().iter().map(|c| c.id()).collect();
                CommandResult::Message(format!(
                    "Available command ids: {}\nUsage: /run <command-id>",
                    ids.join(", ")
                ))
            } else {
                CommandResult::RunId(arg.to_string())
            }
        }

        // Document
        "/save" => CommandResult::SaveDocument,
        "/select" => parse_select(arg),

        // Display
        "/theme" => {
            if arg.is_empty() {
                let themes = crate::theme::Theme::all_names().join(", ");
                CommandResult::Message(format!("Available themes: {themes}\nUsage: /theme <theme-name>"))
            } else {
                CommandResult::ThemeChanged(arg.to_string())
            }
        }
        "/version" => CommandResult::Message(format!("Chatbot CLI v{}", env!("CARGO_PKG_VERSION"))),

        // Unknown command
        _ => {
            if input.starts_with('/') {
                CommandResult::Message(format!("Unknown command: {cmd}. Type /help for commands."))
            } else {
                CommandResult::NotACommand
            }
        }
    }
}

fn parse_select(arg: &str) -> CommandResult {
    let usage = || CommandResult::Message("Usage: /select <from-line> [to-line]".into());
    let mut nums = arg.split_whitespace().map(str::parse::<usize>);
    let from = match nums.next() {
        Some(Ok(n)) if n > 0 => n,
        _ => return usage(),
    };
    let to = match nums.next() {
        None => from,
        Some(Ok(n)) if n >= from => n,
        _ => return usage(),
    };
    if nums.next().is_some() {
        return usage();
    }
    CommandResult::SelectLines(from, to)
}

fn show_help() -> CommandResult {
    let help_text = "\
╭─ Chatbot CLI Commands ─────────────────────────────────────────╮

  CONVERSATION
    /open, /chat              Open (or focus) the conversation panel
    /close                    Close the panel; answers are kept for later
    /clear                    Clear the saved transcript
    /copy [n]                 Copy code block n of the last answer

  TEMPLATE & CODE
    /insert                   Insert the code template at the cursor
    /type                     Type the template out character by character
    /stop                     Pause typing
    /reset                    Restart typing from the beginning
    /generate, /gen           Ask for code based on the selection
    /run <command-id>         Run a command by id (e.g. chatbot.openPanel)

  DOCUMENT
    /select <from> [to]       Select whole lines
    /save                     Save the document (also Ctrl+S)

  OTHER
    /theme <name>             Change color theme
    /help, /h                 Show this help message
    /version                  Show version information
    /exit, /quit, /q          Quit the application

  KEYS
    Tab                       Switch between input and document
    Shift+Arrows              Extend the selection in the document
    PageUp/PageDown           Scroll the conversation
    Ctrl+C                    Quit

╰────────────────────────────────────────────────────────────────╯";

    CommandResult::Message(help_text.into())
}
