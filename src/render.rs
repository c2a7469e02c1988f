use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::sources::{PetitionSource, SignatureCount};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookPayload {
    pub content: String,
    pub tts: bool,
    pub embeds: Vec<Embed>,
    pub username: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub title: String,
    pub url: String,
    pub description: String,
    pub timestamp: String,
    pub color: u32,
    pub author: EmbedAuthor,
    pub footer: EmbedFooter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
    pub url: String,
    pub icon_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

/// Build the message for `source` showing `count` as of `checked_at`.
pub fn render(
    source: &PetitionSource,
    count: SignatureCount,
    checked_at: DateTime<Utc>,
) -> WebhookPayload {
    let embed = Embed {
        title: source.title.clone(),
        url: source.url.clone(),
        description: format!(
            "Signatures: {} / {}",
            format_thousands(count.0),
            format_thousands(source.target)
        ),
        timestamp: format_timestamp(checked_at),
        color: source.color,
        author: EmbedAuthor {
            name: source.author_name.clone(),
            url: source.url.clone(),
            icon_url: source.icon_url.clone(),
        },
        footer: EmbedFooter {
            text: "Checked:".to_string(),
        },
    };

    WebhookPayload {
        content: String::new(),
        tts: false,
        embeds: vec![embed],
        username: source.username.clone(),
        avatar_url: source.avatar_url.clone(),
    }
}

/// `1234567` -> `"1,234,567"`
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// UTC with microseconds and a trailing `Z`, e.g. `2025-07-01T09:30:00.000000Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}
