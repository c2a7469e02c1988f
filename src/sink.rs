use async_trait::async_trait;

use crate::error::SinkError;
use crate::render::WebhookPayload;
use crate::store::MessageId;

/// Somewhere a rendered message can be posted once and then edited in place.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn create(&self, payload: &WebhookPayload) -> Result<MessageId, SinkError>;

    async fn edit(&self, id: &MessageId, payload: &WebhookPayload) -> Result<(), SinkError>;
}

/// Discord-style webhook: `POST {url}?wait=true` to create, `PATCH {url}/messages/{id}` to edit.
pub struct WebhookSink {
    url: String,
    client: reqwest::Client,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn message_url(&self, id: &MessageId) -> String {
        format!("{}/messages/{}", self.url, id)
    }
}

#[async_trait]
impl MessageSink for WebhookSink {
    async fn create(&self, payload: &WebhookPayload) -> Result<MessageId, SinkError> {
        let response = self
            .client
            .post(&self.url)
            .query(&[("wait", "true")])
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SinkError::Status(response.status()));
        }

        let body = response.text().await?;
        let value: serde_json::Value = serde_json::from_str(&body)?;
        parse_message_id(&value)
    }

    async fn edit(&self, id: &MessageId, payload: &WebhookPayload) -> Result<(), SinkError> {
        let response = self
            .client
            .patch(self.message_url(id))
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SinkError::Status(response.status()));
        }

        Ok(())
    }
}

/// The created message's `id`, which may come back as a string or a number.
pub fn parse_message_id(body: &serde_json::Value) -> Result<MessageId, SinkError> {
    match body.get("id") {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Ok(MessageId::new(s.clone())),
        Some(serde_json::Value::Number(n)) => Ok(MessageId::new(n.to_string())),
        _ => Err(SinkError::MissingId),
    }
}
