pub mod batch;
pub mod concurrent_map;
pub mod dedup;
pub mod document;
pub mod error;
pub mod index;
pub mod query;
pub mod request_queue;
pub mod server;
pub mod tokenizer;

pub use document::{DocId, Document, DocumentStatus};
pub use error::{Result, SearchError};
pub use server::{DocumentFilter, SearchServer};

/// Hard cap on the number of ranked results.
pub const MAX_RESULT_DOCUMENT_COUNT: usize = 5;
/// Relevances closer than this are considered equal when ranking.
pub const EPSILON: f64 = 1e-6;

/// How an operation spreads its work.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPolicy {
    #[default]
    Sequential,
    /// Data-parallel on the rayon global pool.
    Parallel,
}
