use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatbotError {
    #[error("{0}")]
    Transport(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message is empty")]
    EmptyInput,

    #[error("No active document")]
    NoActiveDocument,

    #[error("Nothing is selected")]
    EmptySelection,

    #[error("Template typing is already running")]
    TypingInProgress,

    #[error("Conversation surface is closed")]
    SurfaceClosed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChatbotError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}

pub type Result<T> = std::result::Result<T, ChatbotError>;
