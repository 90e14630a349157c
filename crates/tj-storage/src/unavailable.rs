use tj_core::{Destination, DestinationQuery};

use crate::{RecordStore, StoreError};

/// Stand-in for a store that could not be opened. Every call reports the open failure,
/// so readers degrade through their normal error path.
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(error: &StoreError) -> Self {
        let reason = match error {
            StoreError::Unavailable(r) => r.clone(),
            other => other.to_string(),
        };
        Self { reason }
    }
}

impl RecordStore for UnavailableStore {
    fn query(&self, _query: &DestinationQuery) -> Result<Vec<Destination>, StoreError> {
        Err(StoreError::Unavailable(self.reason.clone()))
    }

    fn insert_destination(&self, _destination: Destination) -> Result<(), StoreError> {
        Err(StoreError::Unavailable(self.reason.clone()))
    }
}
