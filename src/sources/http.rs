use super::{CountFetcher, PetitionSource, SignatureCount};
use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::header::CACHE_CONTROL;

const USER_AGENT: &str = concat!("petition-relay/", env!("CARGO_PKG_VERSION"));

/// Reads signature counts straight from each petition's public JSON endpoint.
pub struct HttpCountFetcher {
    client: reqwest::Client,
}

impl HttpCountFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client }
    }
}

impl Default for HttpCountFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CountFetcher for HttpCountFetcher {
    async fn fetch(&self, source: &PetitionSource) -> Result<SignatureCount, FetchError> {
        let response = self
            .client
            .get(&source.endpoint)
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let body = response.text().await?;
        parse_count(&body, &source.count_field)
    }
}

/// Pull a non-negative integer out of the top level of a JSON body.
pub fn parse_count(body: &str, field: &str) -> Result<SignatureCount, FetchError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let raw = value
        .get(field)
        .ok_or_else(|| FetchError::MissingField(field.to_string()))?;

    raw.as_u64()
        .map(SignatureCount)
        .ok_or_else(|| FetchError::NotACount {
            field: field.to_string(),
            value: raw.to_string(),
        })
}
