use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sources::PetitionSource;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub poll_interval_secs: u64,
    pub state_file: PathBuf,
    pub webhook: WebhookConfig,
    pub sources: SourcesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
            state_file: PathBuf::from("message_ids.json"),
            webhook: WebhookConfig::default(),
            sources: SourcesConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub eu: SourceOverride,
    pub uk: SourceOverride,
}

/// Per-field overrides on top of a built-in petition.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceOverride {
    pub title: Option<String>,
    pub url: Option<String>,
    pub author_name: Option<String>,
    pub icon_url: Option<String>,
    pub endpoint: Option<String>,
    pub count_field: Option<String>,
    pub target: Option<u64>,
    pub color: Option<u32>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

impl SourceOverride {
    pub fn apply(&self, mut source: PetitionSource) -> PetitionSource {
        fn set<T: Clone>(field: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *field = v.clone();
            }
        }

        set(&mut source.title, &self.title);
        set(&mut source.url, &self.url);
        set(&mut source.author_name, &self.author_name);
        set(&mut source.icon_url, &self.icon_url);
        set(&mut source.endpoint, &self.endpoint);
        set(&mut source.count_field, &self.count_field);
        set(&mut source.target, &self.target);
        set(&mut source.color, &self.color);
        set(&mut source.username, &self.username);
        set(&mut source.avatar_url, &self.avatar_url);
        source
    }
}

impl Config {
    /// `$XDG_CONFIG_HOME/petition-relay/config.toml` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("petition-relay").join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// An explicit path must exist; the default location is optional.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.webhook.url.trim();
        if url.is_empty() {
            bail!("webhook url is not configured");
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            bail!("webhook url must be http(s): {}", url);
        }
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Tracked petitions in processing order.
    pub fn sources(&self) -> Vec<PetitionSource> {
        vec![
            self.sources
                .eu
                .apply(PetitionSource::european_citizens_initiative()),
            self.sources.uk.apply(PetitionSource::uk_parliament()),
        ]
    }
}
