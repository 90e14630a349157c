use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Destination, SortKey};

/// Sort criteria handed to a record store. Stores return every record; ties on the
/// key keep insertion order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationQuery {
    pub sort_key: SortKey,
    pub ascending: bool,
}

/// The one query the timeline pipeline runs: all destinations, oldest first.
pub fn all_destinations_by_creation_ascending() -> DestinationQuery {
    DestinationQuery {
        sort_key: SortKey::CreatedAt,
        ascending: true,
    }
}

impl DestinationQuery {
    /// Order records in place. `sort_by` is stable, which gives the insertion-order tiebreak.
    pub fn apply(&self, records: &mut [Destination]) {
        let key = self.sort_key;
        if self.ascending {
            records.sort_by(|a, b| key.key_of(a).cmp(&key.key_of(b)));
        } else {
            records.sort_by(|a, b| key.key_of(b).cmp(&key.key_of(a)));
        }
    }
}

impl fmt::Display for DestinationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = if self.ascending { "asc" } else { "desc" };
        write!(f, "all destinations order by {} {}", self.sort_key.as_str(), dir)
    }
}
