use anyhow::{Context, Result};
use search_core::batch::{process_queries, process_queries_joined};
use search_core::dedup::remove_duplicates;
use search_core::request_queue::RequestQueue;
use search_core::{DocId, Document, DocumentStatus, ExecutionPolicy, SearchServer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::warn;

pub const STOP_WORDS_ENV: &str = "SEARCH_STOP_WORDS";

#[derive(Debug, Clone, Deserialize)]
pub struct InputDoc {
    pub id: DocId,
    pub text: String,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub ratings: Vec<i32>,
}

#[derive(Debug, Serialize)]
pub struct QueryResults {
    pub query: String,
    pub results: Vec<Document>,
}

/// Stop words from the flag, falling back to `SEARCH_STOP_WORDS`.
pub fn resolve_stop_words(flag: Option<String>) -> String {
    flag.or_else(|| std::env::var(STOP_WORDS_ENV).ok()).unwrap_or_default()
}

pub fn parse_status(raw: &str) -> Result<DocumentStatus, String> {
    serde_json::from_value(Value::String(raw.to_uppercase()))
        .map_err(|_| format!("unknown status {raw:?}, expected one of ACTUAL, IRRELEVANT, BANNED, REMOVED"))
}

/// Read documents from a `.jsonl` file (one object per line) or a JSON
/// file holding an array or a single object.
pub fn load_documents(path: &Path) -> Result<Vec<InputDoc>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut docs = Vec::new();
    if path.extension().and_then(|s| s.to_str()) == Some("jsonl") {
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() { continue; }
            let doc: InputDoc = serde_json::from_str(&line)
                .with_context(|| format!("{}:{}: malformed document", path.display(), lineno + 1))?;
            docs.push(doc);
        }
    } else {
        let json: Value = serde_json::from_reader(reader).with_context(|| format!("parsing {}", path.display()))?;
        match json {
            Value::Array(arr) => {
                for v in arr {
                    docs.push(serde_json::from_value(v)?);
                }
            }
            Value::Object(_) => docs.push(serde_json::from_value(json)?),
            _ => anyhow::bail!("{}: expected a document object or array", path.display()),
        }
    }
    Ok(docs)
}

/// Index `docs`, skipping the ones the server rejects. Returns the server
/// and the rejected ids.
pub fn build_server(stop_words: &str, docs: Vec<InputDoc>) -> Result<(SearchServer, Vec<DocId>)> {
    let mut server = SearchServer::new(stop_words).context("invalid stop words")?;
    let mut rejected = Vec::new();
    for doc in docs {
        if let Err(err) = server.add_document(doc.id, &doc.text, doc.status, &doc.ratings) {
            warn!(id = doc.id, error = %err, "skipping document");
            rejected.push(doc.id);
        }
    }
    tracing::info!(num_docs = server.document_count(), rejected = rejected.len(), "documents indexed");
    Ok((server, rejected))
}

pub fn run_search(
    server: &SearchServer,
    policy: ExecutionPolicy,
    queries: &[String],
    status: Option<DocumentStatus>,
) -> Result<Vec<QueryResults>> {
    let batches: Vec<Vec<Document>> = match (policy, status) {
        (ExecutionPolicy::Parallel, None) => process_queries(server, queries)?,
        (_, status) => queries
            .iter()
            .map(|q| server.find_top_documents_with(policy, q, status.unwrap_or_default()))
            .collect::<search_core::Result<_>>()?,
    };
    Ok(queries
        .iter()
        .zip(batches)
        .map(|(query, results)| QueryResults { query: query.clone(), results })
        .collect())
}

/// All results of `queries` in one list, in query order then rank order.
pub fn run_search_joined(
    server: &SearchServer,
    policy: ExecutionPolicy,
    queries: &[String],
    status: Option<DocumentStatus>,
) -> Result<Vec<Document>> {
    match (policy, status) {
        (ExecutionPolicy::Parallel, None) => Ok(process_queries_joined(server, queries)?),
        (_, status) => Ok(run_search(server, policy, queries, status)?
            .into_iter()
            .flat_map(|r| r.results)
            .collect()),
    }
}

/// Match `query` against every document, in ascending id order.
pub fn run_match(server: &SearchServer, policy: ExecutionPolicy, query: &str) -> Result<Value> {
    let mut out = Vec::with_capacity(server.document_count());
    for id in server {
        let (words, status) = server.match_document_with(policy, query, id)?;
        out.push(json!({ "doc_id": id, "status": status, "words": words }));
    }
    Ok(Value::Array(out))
}

pub fn run_dedup(server: &mut SearchServer) -> Value {
    let removed = remove_duplicates(server);
    json!({ "removed": removed, "remaining": server.document_count() })
}

/// Replay queries through a [`RequestQueue`]; malformed queries are logged and skipped.
pub fn run_stats(server: &SearchServer, queries: &[String]) -> Value {
    let mut queue = RequestQueue::new(server);
    let mut failed = 0usize;
    for query in queries {
        if let Err(err) = queue.add_find_request(query) {
            warn!(query = %query, error = %err, "query failed");
            failed += 1;
        }
    }
    json!({
        "requests": queries.len(),
        "failed": failed,
        "no_result": queue.no_result_requests(),
    })
}
