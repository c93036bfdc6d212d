use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("Record encoding error: {0}")]
    EncodeError(#[from] bincode::error::EncodeError),

    #[error("Record decoding error: {0}")]
    DecodeError(#[from] bincode::error::DecodeError),

    #[error("RocksDB error: {0}")]
    RocksDBError(#[from] rocksdb::Error),

    #[error("Volunteer not found: {0}")]
    VolunteerNotFound(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    /// A batch run was aborted part way. Rows written before the failure are
    /// individually consistent; the next scheduled run retries.
    #[error("Similarity computation aborted: {0}")]
    TransientComputationFailure(String),
}

impl MatchError {
    /// Not-found errors are surfaced to the caller as-is and never retried.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            MatchError::VolunteerNotFound(_) | MatchError::EventNotFound(_)
        )
    }
}
