use std::sync::{Mutex, MutexGuard};

use tj_core::{Destination, DestinationQuery};

use crate::{RecordStore, StoreError};

/// In-memory store for tests. Not durable; can be flipped into an unavailable state to
/// exercise the degraded fetch path.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    // insertion order; the query sort is stable over it
    destinations: Vec<Destination>,
    unavailable: Option<String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed through `insert_destination`; a repeated id keeps the first record only.
    pub fn with_destinations(destinations: impl IntoIterator<Item = Destination>) -> Self {
        let store = Self::new();
        for d in destinations {
            let _ = store.insert_destination(d);
        }
        store
    }

    /// Make every subsequent query fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, reason: impl Into<String>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.unavailable = Some(reason.into());
        }
    }

    pub fn set_available(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.unavailable = None;
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.destinations.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }
}

impl RecordStore for InMemoryStore {
    fn query(&self, query: &DestinationQuery) -> Result<Vec<Destination>, StoreError> {
        let inner = self.lock()?;
        if let Some(reason) = &inner.unavailable {
            return Err(StoreError::Unavailable(reason.clone()));
        }
        let mut out = inner.destinations.clone();
        drop(inner);
        query.apply(&mut out);
        Ok(out)
    }

    fn insert_destination(&self, destination: Destination) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if inner.destinations.iter().any(|d| d.id == destination.id) {
            return Err(StoreError::DuplicateId(destination.id.0));
        }
        inner.destinations.push(destination);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tj_core::{all_destinations_by_creation_ascending, DestinationId};

    #[test]
    fn test_new_creates_empty_store() {
        let store = InMemoryStore::new();
        let all = store.query(&all_destinations_by_creation_ascending()).unwrap();
        assert!(all.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_insert_and_query_sorted() {
        let store = InMemoryStore::new();
        store.insert_destination(Destination::new("late", "", 300)).unwrap();
        store.insert_destination(Destination::new("early", "", 100)).unwrap();
        store.insert_destination(Destination::new("middle", "", 200)).unwrap();

        let all = store.query(&all_destinations_by_creation_ascending()).unwrap();
        let captions: Vec<_> = all.iter().map(|d| d.caption.as_str()).collect();
        assert_eq!(captions, ["early", "middle", "late"]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let store = InMemoryStore::new();
        let mut a = Destination::new("a", "", 1);
        a.id = DestinationId::from_str("same");
        let mut b = Destination::new("b", "", 2);
        b.id = DestinationId::from_str("same");

        store.insert_destination(a).unwrap();
        let err = store.insert_destination(b).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(ref id) if id == "same"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_seeding_keeps_ids_unique() {
        let mut a = Destination::new("a", "", 1);
        a.id = DestinationId::from_str("dup");
        let mut b = Destination::new("b", "", 0);
        b.id = DestinationId::from_str("dup");

        let store = InMemoryStore::with_destinations([a, b]);
        let all = store.query(&all_destinations_by_creation_ascending()).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].caption, "a");
    }

    #[test]
    fn test_unavailable_then_recovered() {
        let store = InMemoryStore::with_destinations([Destination::new("a", "", 1)]);
        store.set_unavailable("disk detached");

        let err = store.query(&all_destinations_by_creation_ascending()).unwrap_err();
        assert!(err.is_unavailable());
        assert_eq!(err.to_string(), "record store unavailable: disk detached");

        store.set_available();
        assert_eq!(store.query(&all_destinations_by_creation_ascending()).unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_readers() {
        let store = InMemoryStore::with_destinations((0..20).map(|i| Destination::new(format!("d{i}"), "", 100 - i)));
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..50 {
                        let all = store.query(&all_destinations_by_creation_ascending()).unwrap();
                        assert_eq!(all.len(), 20);
                        assert_eq!(all[0].caption, "d19");
                    }
                });
            }
        });
    }
}
