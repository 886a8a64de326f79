use crate::error::ChatbotError;
use crate::transport::traits::*;

pub struct HttpAnswerService {
    client: reqwest::Client,
    url: String,
}

impl HttpAnswerService {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl AnswerService for HttpAnswerService {
    async fn answer(&self, text: &str) -> Result<String, ChatbotError> {
        let request_body = AskRequest {
            text: text.to_string(),
        };

        tracing::debug!("POST {} ({} chars)", self.url, request_body.text.chars().count());

        let response = self
            .client
            .post(&self.url)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(ChatbotError::transport(format!(
                "answer service returned {status}: {response_text}"
            )));
        }

        let body: AskResponse = serde_json::from_str(&response_text)?;
        Ok(body.response)
    }
}
