use crate::{Document, Result, SearchServer};
use rayon::prelude::*;
use tracing::debug;

/// Run every query through [`SearchServer::find_top_documents`] in parallel.
/// Output slot `i` holds the results of `queries[i]`.
pub fn process_queries<S>(server: &SearchServer, queries: &[S]) -> Result<Vec<Vec<Document>>>
where
    S: AsRef<str> + Sync,
{
    debug!(queries = queries.len(), "processing query batch");
    queries
        .par_iter()
        .map(|query| server.find_top_documents(query.as_ref()))
        .collect()
}

/// Like [`process_queries`], flattened in query order then rank order.
pub fn process_queries_joined<S>(server: &SearchServer, queries: &[S]) -> Result<Vec<Document>>
where
    S: AsRef<str> + Sync,
{
    Ok(process_queries(server, queries)?.into_iter().flatten().collect())
}
