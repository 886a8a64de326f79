use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub text: String,
    pub sender: Sender,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Bot,
        }
    }

    pub fn is_bot(&self) -> bool {
        self.sender == Sender::Bot
    }
}

/// Surface → manager: text the user submitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSubmission {
    pub text: String,
}

/// Manager → surface: an answer or error to render as a bot turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerMessage {
    pub text: String,
}

impl AnswerMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_wire_shape() {
        let json = serde_json::to_value(Turn::bot("hello")).unwrap();
        assert_eq!(json, serde_json::json!({"text": "hello", "sender": "bot"}));

        let turn: Turn = serde_json::from_str(r#"{"text":"hi","sender":"user"}"#).unwrap();
        assert_eq!(turn, Turn::user("hi"));
    }

    #[test]
    fn test_unknown_sender_rejected() {
        let result: Result<Turn, _> = serde_json::from_str(r#"{"text":"x","sender":"system"}"#);
        assert!(result.is_err());
    }
}
