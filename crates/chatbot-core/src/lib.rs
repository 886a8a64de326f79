pub mod error;
pub mod constants;
pub mod config;
pub mod conversation;
pub mod transport;
pub mod session;
pub mod template;
pub mod editor;
pub mod markdown;
pub mod codegen;
pub mod extension;

// Re-export key types
pub use error::{ChatbotError, Result};
pub use config::Settings;
pub use conversation::{AnswerMessage, ConversationView, Sender, Turn, UserSubmission};
pub use transport::{AnswerService, HttpAnswerService, TransportAdapter};
pub use session::{
    Delivery, DisposeHandle, OpenOutcome, RequestOrdering, SessionManager, Surface,
    SurfaceFactory, SurfaceId, TurnHandle,
};
pub use template::{TemplateCursor, TemplateInserter, TypingOutcome};
pub use editor::{DocumentEditor, Notifier, Selection};
pub use extension::{Command, Extension};
