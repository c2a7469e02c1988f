use anyhow::{Context, Result};
use tracing::{debug, error, info};

use crate::clock::Clock;
use crate::notifier::Notifier;
use crate::sink::MessageSink;
use crate::sources::{CountFetcher, PetitionSource};
use crate::store::{MessageRecord, RecordStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// One-time pass posting messages for sources that have none yet.
    Initializing,
    /// Every later cycle: refresh all sources.
    Steady,
}

/// Drives fetch-then-notify over every source, one at a time, forever.
pub struct Scheduler<F, S, R, C> {
    sources: Vec<PetitionSource>,
    fetcher: F,
    notifier: Notifier<S>,
    store: R,
    clock: C,
    record: MessageRecord,
    unsaved: bool,
}

impl<F, S, R, C> Scheduler<F, S, R, C>
where
    F: CountFetcher,
    S: MessageSink,
    R: RecordStore,
    C: Clock,
{
    pub fn new(sources: Vec<PetitionSource>, fetcher: F, sink: S, store: R, clock: C) -> Self {
        Self {
            sources,
            fetcher,
            notifier: Notifier::new(sink),
            store,
            clock,
            record: MessageRecord::default(),
            unsaved: false,
        }
    }

    #[cfg(test)]
    fn record(&self) -> &MessageRecord {
        &self.record
    }

    #[cfg(test)]
    fn fetcher(&self) -> &F {
        &self.fetcher
    }

    #[cfg(test)]
    fn sink(&self) -> &S {
        self.notifier.sink()
    }

    #[cfg(test)]
    fn store(&self) -> &R {
        &self.store
    }

    #[cfg(test)]
    fn clock(&self) -> &C {
        &self.clock
    }

    /// Load the persisted record, initialize, then cycle until the clock stops.
    ///
    /// A record that cannot be loaded is fatal: carrying on with an empty one
    /// would post duplicate messages.
    pub async fn run(&mut self) -> Result<()> {
        self.record = self
            .store
            .load()
            .context("failed to load persisted message ids")?;

        self.initialize().await;
        info!("initialization pass done, polling for updates");

        loop {
            self.run_cycle().await;
            if !self.clock.tick().await {
                return Ok(());
            }
        }
    }

    /// Try to create a message for every source without one.
    pub async fn initialize(&mut self) {
        for index in 0..self.sources.len() {
            let key = self.sources[index].key;
            if self.record.is_initialized(key) {
                debug!(source = %key, "message already exists");
                continue;
            }
            info!(source = %key, "sending initial message");
            self.process(index, Phase::Initializing).await;
        }
        self.flush();
    }

    /// One pass over all sources in order.
    pub async fn run_cycle(&mut self) {
        debug!("checking for updates");
        for index in 0..self.sources.len() {
            self.process(index, Phase::Steady).await;
        }
        self.flush();
    }

    async fn process(&mut self, index: usize, phase: Phase) {
        let source = &self.sources[index];

        let Some(count) = self.fetcher.fetch_count(source).await else {
            match phase {
                Phase::Initializing => {
                    info!(source = %source.key, "no signature count, skipping initial message")
                }
                Phase::Steady => debug!(source = %source.key, "no signature count this cycle"),
            }
            return;
        };

        let outcome = self
            .notifier
            .ensure_and_update(source, count, self.clock.now(), &mut self.record)
            .await;

        if outcome.mutated_record() {
            self.unsaved = true;
            self.flush();
        }
    }

    /// Persist the record if it changed since the last successful save.
    fn flush(&mut self) {
        if !self.unsaved {
            return;
        }
        match self.store.save(&self.record) {
            Ok(()) => self.unsaved = false,
            Err(e) => error!(error = %e, "failed to save message ids, will retry next cycle"),
        }
    }
}
