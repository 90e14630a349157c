use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing storage could not be opened or read (missing file, corruption, permissions).
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("destination {0} already exists")]
    DuplicateId(String),
}

impl StoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}
