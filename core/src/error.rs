use crate::DocId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// Rejected document id, word or stop word.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The document id is not present in the index.
    #[error("document {0} is out of range")]
    OutOfRange(DocId),
}

pub type Result<T> = std::result::Result<T, SearchError>;
