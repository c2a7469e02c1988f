pub mod http;

use std::fmt;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::FetchError;

const AVATAR_URL: &str = "https://files.catbox.moe/255del.png";

/// The two petitions this relay tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKey {
    Eu,
    Uk,
}

impl SourceKey {
    /// Processing order for every pass.
    pub const ALL: [SourceKey; 2] = [SourceKey::Eu, SourceKey::Uk];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceKey::Eu => "eu",
            SourceKey::Uk => "uk",
        }
    }

    /// Key under which the message id is persisted.
    pub fn record_key(self) -> &'static str {
        match self {
            SourceKey::Eu => "eu_message_id",
            SourceKey::Uk => "uk_message_id",
        }
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of one tracked petition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetitionSource {
    pub key: SourceKey,
    pub title: String,
    pub url: String,
    pub author_name: String,
    pub icon_url: String,
    /// Endpoint returning the live count as JSON.
    pub endpoint: String,
    /// Top-level JSON field holding the count.
    pub count_field: String,
    pub target: u64,
    pub color: u32,
    /// Display name the webhook posts under.
    pub username: String,
    pub avatar_url: String,
}

impl PetitionSource {
    pub fn european_citizens_initiative() -> Self {
        Self {
            key: SourceKey::Eu,
            title: "Stop Destroying Videogames".to_string(),
            url: "https://eci.ec.europa.eu/045/public/".to_string(),
            author_name: "European Citizens' Initiative".to_string(),
            icon_url: "https://upload.wikimedia.org/wikipedia/commons/thumb/b/b7/Flag_of_Europe.svg/2560px-Flag_of_Europe.svg.png".to_string(),
            endpoint: "https://eci.ec.europa.eu/045/public/api/report/progression".to_string(),
            count_field: "signatureCount".to_string(),
            target: 1_000_000,
            color: 13158,
            username: "Stop Killing Games - EU ECI".to_string(),
            avatar_url: AVATAR_URL.to_string(),
        }
    }

    pub fn uk_parliament() -> Self {
        let petition_id = "702074";
        Self {
            key: SourceKey::Uk,
            title: "Prohibit publishers irrevocably disabling video games they have already sold"
                .to_string(),
            url: format!("https://petition.parliament.uk/petitions/{}", petition_id),
            author_name: "UK Parliament Petitions".to_string(),
            icon_url: "https://upload.wikimedia.org/wikipedia/commons/thumb/a/a5/Flag_of_the_United_Kingdom_%281-2%29.svg/1920px-Flag_of_the_United_Kingdom_%281-2%29.svg.png".to_string(),
            endpoint: format!(
                "https://petition.parliament.uk/petitions/{}/count.json",
                petition_id
            ),
            count_field: "signature_count".to_string(),
            // Considered for debate at 100,000
            target: 100_000,
            color: 16711680,
            username: "Stop Killing Games - UK Petition".to_string(),
            avatar_url: AVATAR_URL.to_string(),
        }
    }
}

/// Number of signatures read at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SignatureCount(pub u64);

#[async_trait]
pub trait CountFetcher: Send + Sync {
    async fn fetch(&self, source: &PetitionSource) -> Result<SignatureCount, FetchError>;

    /// Like [`CountFetcher::fetch`], but failures are logged and reported as absent.
    async fn fetch_count(&self, source: &PetitionSource) -> Option<SignatureCount> {
        match self.fetch(source).await {
            Ok(count) => {
                debug!(source = %source.key, count = count.0, "fetched signature count");
                Some(count)
            }
            Err(e) => {
                warn!(source = %source.key, endpoint = %source.endpoint, error = %e, "failed to fetch signature count");
                None
            }
        }
    }
}
