mod turn;
mod view;
pub mod persistence;

pub use turn::{AnswerMessage, Sender, Turn, UserSubmission};
pub use view::ConversationView;
pub use persistence::{ViewState, ViewStateStore};
