use crate::error::ChatbotError;
use serde::{Deserialize, Serialize};

/// Body of a request to the answer service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AskRequest {
    pub text: String,
}

/// Body returned by the answer service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AskResponse {
    pub response: String,
}

/// A remote service that turns one question into one answer.
#[async_trait::async_trait]
pub trait AnswerService: Send + Sync {
    /// Send `text` verbatim and return the answer text.
    async fn answer(&self, text: &str) -> Result<String, ChatbotError>;
}
