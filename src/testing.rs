//! In-memory stand-ins for the network and disk seams, plus a one-shot
//! HTTP responder for exercising the real clients.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::error::{FetchError, SinkError, StoreError};
use crate::render::WebhookPayload;
use crate::sink::MessageSink;
use crate::sources::{CountFetcher, PetitionSource, SignatureCount, SourceKey};
use crate::store::{MessageId, MessageRecord, RecordStore};

pub fn checked_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap()
}

/// Answer exactly one request on a local port with `status` and a JSON `body`.
///
/// Returns the base url and a handle resolving to the raw request text.
pub async fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;
        let response = format!(
            "HTTP/1.1 {} Test\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        let _ = stream.shutdown().await;
        request
    });

    (format!("http://{}", addr), handle)
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_lowercase();
        let body_len = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= head_end + 4 + body_len {
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Create { username: String, description: String },
    Edit { id: MessageId, description: String },
}

impl SinkCall {
    pub fn is_create(&self) -> bool {
        matches!(self, SinkCall::Create { .. })
    }
}

/// Hands out ids `msg-1`, `msg-2`, ... and remembers every call.
#[derive(Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
    next_id: Mutex<u32>,
    failing_creates: Mutex<Vec<String>>,
    fail_all_creates: Mutex<bool>,
    fail_edits: Mutex<bool>,
}

impl RecordingSink {
    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn fail_creates(&self) {
        *self.fail_all_creates.lock().unwrap() = true;
    }

    /// Fail creations posted under `username` only.
    pub fn fail_creates_for(&self, username: &str) {
        self.failing_creates.lock().unwrap().push(username.to_string());
    }

    pub fn heal_creates(&self) {
        *self.fail_all_creates.lock().unwrap() = false;
        self.failing_creates.lock().unwrap().clear();
    }

    pub fn fail_edits(&self) {
        *self.fail_edits.lock().unwrap() = true;
    }
}

fn description(payload: &WebhookPayload) -> String {
    payload
        .embeds
        .first()
        .map(|e| e.description.clone())
        .unwrap_or_default()
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn create(&self, payload: &WebhookPayload) -> Result<MessageId, SinkError> {
        self.calls.lock().unwrap().push(SinkCall::Create {
            username: payload.username.clone(),
            description: description(payload),
        });

        let failing = *self.fail_all_creates.lock().unwrap()
            || self
                .failing_creates
                .lock()
                .unwrap()
                .contains(&payload.username);
        if failing {
            return Err(SinkError::Status(StatusCode::INTERNAL_SERVER_ERROR));
        }

        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        Ok(MessageId::new(format!("msg-{}", *next)))
    }

    async fn edit(&self, id: &MessageId, payload: &WebhookPayload) -> Result<(), SinkError> {
        self.calls.lock().unwrap().push(SinkCall::Edit {
            id: id.clone(),
            description: description(payload),
        });

        if *self.fail_edits.lock().unwrap() {
            return Err(SinkError::Status(StatusCode::NOT_FOUND));
        }
        Ok(())
    }
}

/// Returns scripted counts; a source with no script fails to fetch.
#[derive(Default)]
pub struct ScriptedFetcher {
    counts: Mutex<HashMap<SourceKey, u64>>,
    calls: Mutex<Vec<SourceKey>>,
}

impl ScriptedFetcher {
    pub fn with(counts: &[(SourceKey, u64)]) -> Self {
        let fetcher = Self::default();
        for (key, count) in counts {
            fetcher.set(*key, Some(*count));
        }
        fetcher
    }

    pub fn set(&self, key: SourceKey, count: Option<u64>) {
        let mut counts = self.counts.lock().unwrap();
        match count {
            Some(n) => counts.insert(key, n),
            None => counts.remove(&key),
        };
    }

    pub fn calls(&self) -> Vec<SourceKey> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CountFetcher for ScriptedFetcher {
    async fn fetch(&self, source: &PetitionSource) -> Result<SignatureCount, FetchError> {
        self.calls.lock().unwrap().push(source.key);
        self.counts
            .lock()
            .unwrap()
            .get(&source.key)
            .map(|n| SignatureCount(*n))
            .ok_or_else(|| FetchError::MissingField(source.count_field.clone()))
    }
}

/// Keeps the last saved record in memory.
#[derive(Default)]
pub struct MemoryStore {
    saved: Mutex<Option<MessageRecord>>,
    saves: Mutex<usize>,
    fail_saves: Mutex<bool>,
    fail_load: Mutex<bool>,
}

impl MemoryStore {
    pub fn with(record: MessageRecord) -> Self {
        let store = Self::default();
        *store.saved.lock().unwrap() = Some(record);
        store
    }

    pub fn saved(&self) -> MessageRecord {
        self.saved.lock().unwrap().clone().unwrap_or_default()
    }

    pub fn saves(&self) -> usize {
        *self.saves.lock().unwrap()
    }

    pub fn set_fail_saves(&self, fail: bool) {
        *self.fail_saves.lock().unwrap() = fail;
    }

    pub fn set_fail_load(&self, fail: bool) {
        *self.fail_load.lock().unwrap() = fail;
    }
}

impl RecordStore for MemoryStore {
    fn load(&self) -> Result<MessageRecord, StoreError> {
        if *self.fail_load.lock().unwrap() {
            return Err(StoreError::Corrupt {
                path: "memory".into(),
                source: serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
            });
        }
        Ok(self.saved())
    }

    fn save(&self, record: &MessageRecord) -> Result<(), StoreError> {
        if *self.fail_saves.lock().unwrap() {
            return Err(StoreError::Write {
                path: "memory".into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            });
        }
        *self.saved.lock().unwrap() = Some(record.clone());
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}
