use serde::{Deserialize, Serialize};

use crate::ids::DestinationId;

/// A journal entry. Created by the editing flow, read-only for the timeline pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub id: DestinationId,
    pub caption: String,
    pub details: String,
    pub created_at_unix: i64,
    /// Opaque image bytes. Decoding belongs to whoever renders the entry.
    #[serde(default)]
    pub image: Option<Vec<u8>>,
}

impl Destination {
    pub fn new(caption: impl Into<String>, details: impl Into<String>, created_at_unix: i64) -> Self {
        Self {
            id: DestinationId::new(),
            caption: caption.into(),
            details: details.into(),
            created_at_unix,
            image: None,
        }
    }

    pub fn with_image(mut self, bytes: Vec<u8>) -> Self {
        self.image = Some(bytes);
        self
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

/// Single-field record from the notes fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub timestamp_unix: i64,
}

impl Item {
    pub fn new(timestamp_unix: i64) -> Self {
        Self { timestamp_unix }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortKey {
    CreatedAt,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::CreatedAt => "created_at",
        }
    }

    pub fn key_of(&self, d: &Destination) -> i64 {
        match self {
            SortKey::CreatedAt => d.created_at_unix,
        }
    }
}
