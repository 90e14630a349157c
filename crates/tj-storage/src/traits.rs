use tj_core::{Destination, DestinationQuery};

use crate::StoreError;

/// Persistent collection of destinations. Implementations serialize access internally;
/// callers share one handle across threads.
pub trait RecordStore: Send + Sync {
    /// Every destination ordered by the query's key. An empty store is `Ok(vec![])`.
    fn query(&self, query: &DestinationQuery) -> Result<Vec<Destination>, StoreError>;

    /// Entry point for the editing flow. Rejects an id that is already stored.
    fn insert_destination(&self, destination: Destination) -> Result<(), StoreError>;
}
