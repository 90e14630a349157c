use std::time::Duration;

use thiserror::Error;
use tj_core::{Configuration, Snapshot};
use tokio_util::sync::CancellationToken;

use crate::fetcher::SnapshotFetcher;
use crate::util::now_unix;

/// Default window: one hour of entries, one every two minutes.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_TICK: Duration = Duration::from_secs(2 * 60);
/// Upper bound on entries per timeline.
pub const MAX_TICKS: usize = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReloadPolicy {
    /// Regenerate from scratch once the consumer has shown the last entry.
    AtEnd,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimelineError {
    #[error("invalid schedule: window {window_secs}s holds no {tick_secs}s tick")]
    InvalidSchedule { window_secs: u64, tick_secs: u64 },

    #[error("schedule needs {ticks} ticks, limit is {max}")]
    TooManyTicks { ticks: u64, max: usize },
}

/// Finite, ordered batch of snapshots. `entries[i]` belongs to tick `i`.
#[derive(Clone, Debug)]
pub struct Timeline {
    pub entries: Vec<Snapshot>,
    pub policy: ReloadPolicy,
    pub started_at_unix: i64,
    pub tick_secs: u64,
    /// Set when generation stopped early; `entries` then holds the completed prefix.
    pub cancelled: bool,
}

impl Timeline {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Nominal display instant of tick `index`.
    pub fn tick_instant(&self, index: usize) -> i64 {
        self.started_at_unix + (index as u64 * self.tick_secs) as i64
    }

    /// Entries paired with their nominal instants.
    pub fn scheduled(&self) -> impl Iterator<Item = (i64, &Snapshot)> + '_ {
        self.entries.iter().enumerate().map(|(i, s)| (self.tick_instant(i), s))
    }
}

impl IntoIterator for Timeline {
    type Item = Snapshot;
    type IntoIter = std::vec::IntoIter<Snapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

pub fn tick_count(window: Duration, tick: Duration) -> Result<usize, TimelineError> {
    let window_secs = window.as_secs();
    let tick_secs = tick.as_secs();
    if tick_secs == 0 || window_secs < tick_secs {
        return Err(TimelineError::InvalidSchedule { window_secs, tick_secs });
    }
    let ticks = window_secs / tick_secs;
    if ticks > MAX_TICKS as u64 {
        return Err(TimelineError::TooManyTicks { ticks, max: MAX_TICKS });
    }
    Ok(ticks as usize)
}

/// Batch generator over a fetcher. Holds no state between calls.
#[derive(Clone)]
pub struct TimelineGenerator {
    fetcher: SnapshotFetcher,
}

impl TimelineGenerator {
    pub fn new(fetcher: SnapshotFetcher) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &SnapshotFetcher {
        &self.fetcher
    }

    pub fn generate(&self, configuration: &Configuration, window: Duration, tick: Duration) -> Result<Timeline, TimelineError> {
        self.generate_with_cancel(configuration, window, tick, &CancellationToken::new())
    }

    /// Every tick is fetched now, back to back, with the same configuration. The store
    /// state at call time is what all entries show.
    pub fn generate_with_cancel(
        &self,
        configuration: &Configuration,
        window: Duration,
        tick: Duration,
        cancel: &CancellationToken,
    ) -> Result<Timeline, TimelineError> {
        let ticks = tick_count(window, tick)?;
        let started_at_unix = now_unix();
        let mut entries = Vec::with_capacity(ticks);
        let mut cancelled = false;

        for index in 0..ticks {
            if cancel.is_cancelled() {
                tracing::debug!(completed = index, ticks, "timeline generation cancelled");
                cancelled = true;
                break;
            }
            let snapshot = self.fetcher.fetch(configuration.clone());
            tracing::debug!(tick = index, has_destination = snapshot.destination.is_some(), "timeline tick");
            entries.push(snapshot);
        }

        let timeline = Timeline {
            entries,
            policy: ReloadPolicy::AtEnd,
            started_at_unix,
            tick_secs: tick.as_secs(),
            cancelled,
        };
        tracing::info!(entries = timeline.len(), cancelled, "timeline generated");
        Ok(timeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tj_core::Destination;
    use tj_storage::InMemoryStore;
    use tracing_test::traced_test;

    fn generator(store: Arc<InMemoryStore>) -> TimelineGenerator {
        TimelineGenerator::new(SnapshotFetcher::new(store))
    }

    #[test]
    fn tick_count_divides_window() {
        assert_eq!(tick_count(DEFAULT_WINDOW, DEFAULT_TICK), Ok(30));
        assert_eq!(tick_count(Duration::from_secs(10), Duration::from_secs(3)), Ok(3));
        assert_eq!(tick_count(Duration::from_secs(5), Duration::from_secs(5)), Ok(1));
    }

    #[test]
    fn tick_count_rejects_bad_schedules() {
        assert_eq!(
            tick_count(DEFAULT_WINDOW, Duration::ZERO),
            Err(TimelineError::InvalidSchedule { window_secs: 3600, tick_secs: 0 })
        );
        assert!(tick_count(Duration::from_secs(60), Duration::from_secs(120)).is_err());
    }

    #[test]
    fn tick_count_is_capped() {
        assert_eq!(tick_count(Duration::from_secs(10_000), Duration::from_secs(1)), Ok(MAX_TICKS));
        assert_eq!(
            tick_count(Duration::from_secs(10_001), Duration::from_secs(1)),
            Err(TimelineError::TooManyTicks { ticks: 10_001, max: MAX_TICKS })
        );
    }

    #[test]
    fn huge_window_is_rejected_without_fetching() {
        let store = Arc::new(InMemoryStore::with_destinations([Destination::new("a", "", 1)]));
        let err = generator(store)
            .generate(&Configuration::new(), Duration::from_secs(u64::MAX), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, TimelineError::TooManyTicks { .. }));
    }

    #[test]
    fn default_window_yields_thirty_entries_with_same_configuration() {
        let store = Arc::new(InMemoryStore::with_destinations([Destination::new("Lima", "", 10)]));
        let cfg = Configuration::new().with("favorite_emoji", "🤩");
        let timeline = generator(store).generate(&cfg, DEFAULT_WINDOW, DEFAULT_TICK).unwrap();

        assert_eq!(timeline.len(), 30);
        assert_eq!(timeline.policy, ReloadPolicy::AtEnd);
        assert!(!timeline.cancelled);
        for snap in &timeline.entries {
            assert_eq!(snap.configuration, cfg);
            assert_eq!(snap.destination.as_ref().unwrap().caption, "Lima");
        }
    }

    #[test]
    fn tick_instants_step_by_interval() {
        let store = Arc::new(InMemoryStore::new());
        let timeline = generator(store).generate(&Configuration::new(), DEFAULT_WINDOW, DEFAULT_TICK).unwrap();
        let instants: Vec<i64> = timeline.scheduled().map(|(at, _)| at).collect();
        assert_eq!(instants.len(), 30);
        assert_eq!(instants[0], timeline.started_at_unix);
        assert_eq!(instants[29] - instants[0], 29 * 120);
    }

    #[test]
    fn cancelled_before_start_is_empty() {
        let store = Arc::new(InMemoryStore::with_destinations([Destination::new("a", "", 1)]));
        let token = CancellationToken::new();
        token.cancel();
        let timeline = generator(store)
            .generate_with_cancel(&Configuration::new(), DEFAULT_WINDOW, DEFAULT_TICK, &token)
            .unwrap();
        assert!(timeline.is_empty());
        assert!(timeline.cancelled);
    }

    #[test]
    #[traced_test]
    fn unavailable_store_fills_window_with_empty_entries() {
        let store = Arc::new(InMemoryStore::new());
        store.set_unavailable("corrupt");
        let timeline = generator(store)
            .generate(&Configuration::new(), Duration::from_secs(600), DEFAULT_TICK)
            .unwrap();
        assert_eq!(timeline.len(), 5);
        assert!(timeline.entries.iter().all(|s| s.destination.is_none()));
        logs_assert(|lines: &[&str]| {
            match lines.iter().filter(|l| l.contains("destination fetch failed")).count() {
                5 => Ok(()),
                n => Err(format!("expected one failure record per tick, got {n}")),
            }
        });
    }
}
