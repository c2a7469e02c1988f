//! Durable mapping from petition to the webhook message that renders it.
//!
//! The on-disk layout is a single JSON object:
//!
//! ```json
//! { "eu_message_id": "1290...", "uk_message_id": "1290..." }
//! ```
//!
//! A missing file is the same as an empty mapping. Saves always write
//! pretty-printed JSON, so a file written by something else (compact JSON,
//! numeric ids) is normalized by its first save and stays byte-stable after.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::StoreError;
use crate::sources::SourceKey;

/// Opaque identifier the webhook assigned to a posted message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Older state files may hold ids as bare JSON numbers.
impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => MessageId(s),
            Raw::Number(n) => MessageId(n.to_string()),
        })
    }
}

/// Which petitions already have a live message, and under what id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eu_message_id: Option<MessageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uk_message_id: Option<MessageId>,
    /// Keys this process does not know about, carried through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl MessageRecord {
    pub fn get(&self, key: SourceKey) -> Option<&MessageId> {
        match key {
            SourceKey::Eu => self.eu_message_id.as_ref(),
            SourceKey::Uk => self.uk_message_id.as_ref(),
        }
    }

    pub fn set(&mut self, key: SourceKey, id: MessageId) {
        match key {
            SourceKey::Eu => self.eu_message_id = Some(id),
            SourceKey::Uk => self.uk_message_id = Some(id),
        }
    }

    pub fn is_initialized(&self, key: SourceKey) -> bool {
        self.get(key).is_some()
    }
}

pub trait RecordStore {
    fn load(&self) -> Result<MessageRecord, StoreError>;

    /// Replace the persisted record with `record` in full.
    fn save(&self, record: &MessageRecord) -> Result<(), StoreError>;
}

/// Keeps the record in one JSON file, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn write_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl RecordStore for JsonFileStore {
    fn load(&self) -> Result<MessageRecord, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(MessageRecord::default()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, record: &MessageRecord) -> Result<(), StoreError> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;

        let mut content = serde_json::to_vec_pretty(record)
            .map_err(|e| self.write_error(std::io::Error::new(ErrorKind::InvalidData, e)))?;
        content.push(b'\n');

        let mut temp_file =
            tempfile::NamedTempFile::new_in(parent).map_err(|e| self.write_error(e))?;
        temp_file
            .write_all(&content)
            .map_err(|e| self.write_error(e))?;
        temp_file
            .persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;

        Ok(())
    }
}
