use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::Destination;

/// Caller-supplied parameters carried into every snapshot untouched.
/// Nothing in the pipeline reads the values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(pub BTreeMap<String, String>);

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for Configuration {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Read-only view of the store for one timeline tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub generated_at_unix: i64,
    pub configuration: Configuration,
    pub destination: Option<Destination>,
}

impl Snapshot {
    pub fn empty(generated_at_unix: i64, configuration: Configuration) -> Self {
        Self {
            generated_at_unix,
            configuration,
            destination: None,
        }
    }
}
