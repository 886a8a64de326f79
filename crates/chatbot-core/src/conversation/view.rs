use crate::conversation::persistence::{ViewState, ViewStateStore};
use crate::conversation::{AnswerMessage, Turn, UserSubmission};

/// The rendered side of a conversation: an append-only list of turns that
/// survives its surface being closed, through an optional [`ViewStateStore`].
pub struct ConversationView {
    turns: Vec<Turn>,
    store: Option<ViewStateStore>,
}

impl ConversationView {
    pub fn new() -> Self {
        Self {
            turns: Vec::new(),
            store: None,
        }
    }

    /// Create a view backed by `store`, restoring whatever history it holds.
    pub fn with_store(store: ViewStateStore) -> Self {
        let turns = match store.load() {
            Ok(state) => state.history,
            Err(e) => {
                tracing::warn!("Starting with an empty transcript: {e}");
                Vec::new()
            }
        };
        Self {
            turns,
            store: Some(store),
        }
    }

    /// Accept user input. Blank text is rejected here and never leaves the
    /// view; anything else is recorded as a user turn and returned for
    /// forwarding.
    pub fn submit(&mut self, text: &str) -> Option<UserSubmission> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.push(Turn::user(text));
        Some(UserSubmission {
            text: text.to_string(),
        })
    }

    /// Render an answer (or error text) as a bot turn.
    pub fn receive(&mut self, message: AnswerMessage) -> &Turn {
        self.push(Turn::bot(message.text));
        &self.turns[self.turns.len() - 1]
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last_bot_turn(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.is_bot())
    }

    fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
        self.persist();
    }

    fn persist(&self) {
        if let Some(ref store) = self.store {
            let state = ViewState {
                history: self.turns.clone(),
            };
            if let Err(e) = store.save(&state) {
                tracing::warn!("Failed to persist transcript: {e}");
            }
        }
    }
}

impl Default for ConversationView {
    fn default() -> Self {
        Self::new()
    }
}
