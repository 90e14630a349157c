use std::sync::Arc;

use tj_core::{all_destinations_by_creation_ascending, Configuration, DestinationQuery, Snapshot};
use tj_storage::{RecordStore, StoreError};

use crate::util::now_unix;

/// Result of one fetch. A store failure still yields a snapshot; the error rides along
/// so callers can see where the conversion happened.
#[derive(Debug)]
pub enum FetchOutcome {
    Fetched(Snapshot),
    Degraded { snapshot: Snapshot, error: StoreError },
}

impl FetchOutcome {
    pub fn snapshot(&self) -> &Snapshot {
        match self {
            FetchOutcome::Fetched(s) => s,
            FetchOutcome::Degraded { snapshot, .. } => snapshot,
        }
    }

    pub fn into_snapshot(self) -> Snapshot {
        match self {
            FetchOutcome::Fetched(s) => s,
            FetchOutcome::Degraded { snapshot, .. } => snapshot,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, FetchOutcome::Degraded { .. })
    }
}

/// Runs the canonical query and keeps the first record.
#[derive(Clone)]
pub struct SnapshotFetcher {
    store: Arc<dyn RecordStore>,
    query: DestinationQuery,
}

impl SnapshotFetcher {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            query: all_destinations_by_creation_ascending(),
        }
    }

    pub fn query(&self) -> &DestinationQuery {
        &self.query
    }

    pub fn fetch(&self, configuration: Configuration) -> Snapshot {
        self.fetch_at(configuration, now_unix())
    }

    pub fn fetch_at(&self, configuration: Configuration, now_unix: i64) -> Snapshot {
        self.fetch_outcome(configuration, now_unix).into_snapshot()
    }

    /// Never fails. No retry here: the next tick is the retry.
    pub fn fetch_outcome(&self, configuration: Configuration, now_unix: i64) -> FetchOutcome {
        match self.store.query(&self.query) {
            Ok(records) => FetchOutcome::Fetched(Snapshot {
                generated_at_unix: now_unix,
                configuration,
                destination: records.into_iter().next(),
            }),
            Err(error) => {
                tracing::warn!(error = %error, query = %self.query, "destination fetch failed, serving empty snapshot");
                FetchOutcome::Degraded {
                    snapshot: Snapshot::empty(now_unix, configuration),
                    error,
                }
            }
        }
    }

    /// Snapshot for a surface that has no configuration yet.
    pub fn placeholder(&self) -> Snapshot {
        self.fetch(Configuration::default())
    }
}
