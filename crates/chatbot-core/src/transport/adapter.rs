use crate::constants::prompts;
use crate::transport::traits::AnswerService;

/// Issues one request per user turn and flattens every failure into a
/// displayable error string.
pub struct TransportAdapter {
    service: Box<dyn AnswerService>,
    context_suffix: String,
}

impl TransportAdapter {
    pub fn new(service: Box<dyn AnswerService>) -> Self {
        Self {
            service,
            context_suffix: prompts::CONTEXT_SUFFIX.to_string(),
        }
    }

    pub fn with_context_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.context_suffix = suffix.into();
        self
    }

    pub fn context_suffix(&self) -> &str {
        &self.context_suffix
    }

    /// The text actually sent for a user question.
    pub fn shape_prompt(&self, text: &str) -> String {
        format!("{text}{}", self.context_suffix)
    }

    /// Ask the service. `Err` carries a non-empty message ready to be shown
    /// as a bot turn.
    pub async fn ask(&self, text: &str) -> Result<String, String> {
        match self.service.answer(&self.shape_prompt(text)).await {
            Ok(answer) => Ok(answer),
            Err(e) => {
                tracing::warn!("Answer request failed: {e}");
                Err(format!("{}{e}", prompts::ERROR_PREFIX))
            }
        }
    }

    /// Like [`ask`](Self::ask), but an error message is returned as the
    /// answer text.
    pub async fn ask_or_error(&self, text: &str) -> String {
        match self.ask(text).await {
            Ok(answer) | Err(answer) => answer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatbotError;

    struct Failing;

    #[async_trait::async_trait]
    impl AnswerService for Failing {
        async fn answer(&self, _text: &str) -> Result<String, ChatbotError> {
            Err(ChatbotError::transport("connection refused"))
        }
    }

    struct Echo;

    #[async_trait::async_trait]
    impl AnswerService for Echo {
        async fn answer(&self, text: &str) -> Result<String, ChatbotError> {
            Ok(text.to_string())
        }
    }

    #[tokio::test]
    async fn test_suffix_is_appended() {
        let adapter = TransportAdapter::new(Box::new(Echo)).with_context_suffix(" [rust]");
        assert_eq!(adapter.ask("hello").await, Ok("hello [rust]".to_string()));
    }

    #[tokio::test]
    async fn test_default_suffix() {
        let adapter = TransportAdapter::new(Box::new(Echo));
        assert_eq!(adapter.context_suffix(), prompts::CONTEXT_SUFFIX);
    }

    #[tokio::test]
    async fn test_failure_becomes_message() {
        let adapter = TransportAdapter::new(Box::new(Failing));
        let err = adapter.ask("hi").await.unwrap_err();
        assert_eq!(err, format!("{}connection refused", prompts::ERROR_PREFIX));
        assert_eq!(adapter.ask_or_error("hi").await, err);
    }
}
