use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::render::render;
use crate::sink::MessageSink;
use crate::sources::{PetitionSource, SignatureCount};
use crate::store::{MessageId, MessageRecord};

/// What a single create-or-update dispatch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A new message was posted and its id stored in the record.
    Created(MessageId),
    Edited,
    /// Record left untouched; the next dispatch tries creation again.
    CreateFailed,
    /// Record left untouched; the stored id is kept.
    EditFailed,
}

impl Dispatch {
    pub fn mutated_record(&self) -> bool {
        matches!(self, Dispatch::Created(_))
    }
}

pub struct Notifier<S> {
    sink: S,
}

impl<S: MessageSink> Notifier<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    #[cfg(test)]
    pub(crate) fn sink(&self) -> &S {
        &self.sink
    }

    /// Post the source's message if it has none yet, otherwise edit it in place.
    ///
    /// Only a successful creation writes to `record`; persisting it is up to
    /// the caller. A failed edit never clears or replaces the stored id, so a
    /// message deleted on the remote side keeps failing until its entry is
    /// removed from the state file by hand.
    pub async fn ensure_and_update(
        &self,
        source: &PetitionSource,
        count: SignatureCount,
        checked_at: DateTime<Utc>,
        record: &mut MessageRecord,
    ) -> Dispatch {
        let payload = render(source, count, checked_at);

        match record.get(source.key).cloned() {
            None => match self.sink.create(&payload).await {
                Ok(id) => {
                    info!(source = %source.key, message_id = %id, count = count.0, "created message");
                    record.set(source.key, id.clone());
                    Dispatch::Created(id)
                }
                Err(e) => {
                    warn!(source = %source.key, error = %e, "failed to create message");
                    Dispatch::CreateFailed
                }
            },
            Some(id) => match self.sink.edit(&id, &payload).await {
                Ok(()) => {
                    info!(source = %source.key, message_id = %id, count = count.0, "updated message");
                    Dispatch::Edited
                }
                Err(e) => {
                    warn!(source = %source.key, message_id = %id, error = %e, "failed to update message");
                    Dispatch::EditFailed
                }
            },
        }
    }
}
