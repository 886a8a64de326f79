mod cursor;
mod inserter;

pub use cursor::TemplateCursor;
pub use inserter::{TemplateInserter, TypingOutcome};
