use crate::concurrent_map::ConcurrentMap;
use crate::document::compute_average_rating;
use crate::error::{Result, SearchError};
use crate::index::{DocIds, InvertedIndex};
use crate::query::{parse_query, Query};
use crate::tokenizer::{is_valid_word, split_into_words, StopWords};
use crate::{DocId, Document, DocumentStatus, ExecutionPolicy, EPSILON, MAX_RESULT_DOCUMENT_COUNT};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// Decides whether a document may appear in ranked results.
pub trait DocumentFilter: Sync {
    fn accept(&self, id: DocId, status: DocumentStatus, rating: i32) -> bool;
}

impl DocumentFilter for DocumentStatus {
    fn accept(&self, _id: DocId, status: DocumentStatus, _rating: i32) -> bool {
        status == *self
    }
}

impl<F> DocumentFilter for F
where
    F: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
{
    fn accept(&self, id: DocId, status: DocumentStatus, rating: i32) -> bool {
        self(id, status, rating)
    }
}

/// In-memory TF-IDF search server.
///
/// Mutation takes `&mut self`; concurrent readers share `&SearchServer`.
#[derive(Debug, Default)]
pub struct SearchServer {
    stop_words: StopWords,
    index: InvertedIndex,
}

impl SearchServer {
    /// Create a server from space-delimited stop words.
    pub fn new(stop_words_text: &str) -> Result<Self> {
        Ok(Self { stop_words: StopWords::from_text(stop_words_text)?, index: InvertedIndex::new() })
    }

    pub fn with_stop_words<I, S>(stop_words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self { stop_words: StopWords::from_words(stop_words)?, index: InvertedIndex::new() })
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }

    /// Index a document. On error the server is left unchanged.
    pub fn add_document(&mut self, id: DocId, text: &str, status: DocumentStatus, ratings: &[i32]) -> Result<()> {
        if id < 0 {
            return Err(SearchError::InvalidArgument(format!("document id {id} is negative")));
        }
        if self.index.contains(id) {
            return Err(SearchError::InvalidArgument(format!("document id {id} already exists")));
        }
        let words = self.split_into_words_no_stop(text)?;
        let rating = compute_average_rating(ratings);
        self.index.insert(id, text, &words, status, rating);
        debug!(id, words = words.len(), rating, ?status, "document indexed");
        Ok(())
    }

    pub fn remove_document(&mut self, id: DocId) {
        self.remove_document_with(ExecutionPolicy::Sequential, id);
    }

    /// Remove a document. Unknown ids are ignored.
    pub fn remove_document_with(&mut self, policy: ExecutionPolicy, id: DocId) {
        if self.index.remove(policy, id) {
            debug!(id, ?policy, "document removed");
        }
    }

    /// Top documents with status `Actual`.
    pub fn find_top_documents(&self, raw_query: &str) -> Result<Vec<Document>> {
        self.find_top_documents_with(ExecutionPolicy::Sequential, raw_query, DocumentStatus::Actual)
    }

    pub fn find_top_documents_by<F: DocumentFilter>(&self, raw_query: &str, filter: F) -> Result<Vec<Document>> {
        self.find_top_documents_with(ExecutionPolicy::Sequential, raw_query, filter)
    }

    /// Rank documents accepted by `filter` against `raw_query`, best first,
    /// at most [`MAX_RESULT_DOCUMENT_COUNT`] of them.
    pub fn find_top_documents_with<F: DocumentFilter>(
        &self,
        policy: ExecutionPolicy,
        raw_query: &str,
        filter: F,
    ) -> Result<Vec<Document>> {
        let query = parse_query(raw_query, &self.stop_words)?;
        let relevance = match policy {
            ExecutionPolicy::Sequential => self.relevance_sequential(&query, &filter),
            ExecutionPolicy::Parallel => self.relevance_parallel(&query, &filter),
        };

        let mut matched: Vec<Document> = relevance
            .into_iter()
            .filter_map(|(id, relevance)| self.index.document(id).map(|data| Document::new(id, relevance, data.rating)))
            .collect();
        sort_by_relevance(&mut matched);
        matched.truncate(MAX_RESULT_DOCUMENT_COUNT);
        Ok(matched)
    }

    fn inverse_document_freq(&self, postings_len: usize) -> f64 {
        (self.index.len() as f64 / postings_len as f64).ln()
    }

    fn relevance_sequential<F: DocumentFilter>(&self, query: &Query<'_>, filter: &F) -> BTreeMap<DocId, f64> {
        let mut relevance: BTreeMap<DocId, f64> = BTreeMap::new();
        for word in &query.plus_words {
            let Some(postings) = self.index.postings(word) else {
                continue;
            };
            let idf = self.inverse_document_freq(postings.len());
            for (&id, &tf) in postings {
                let Some(data) = self.index.document(id) else {
                    continue;
                };
                if filter.accept(id, data.status, data.rating) {
                    *relevance.entry(id).or_insert(0.0) += tf * idf;
                }
            }
        }
        for word in &query.minus_words {
            if let Some(postings) = self.index.postings(word) {
                for id in postings.keys() {
                    relevance.remove(id);
                }
            }
        }
        relevance
    }

    fn relevance_parallel<F: DocumentFilter>(&self, query: &Query<'_>, filter: &F) -> BTreeMap<DocId, f64> {
        let relevance: ConcurrentMap<f64> = ConcurrentMap::default();
        query.plus_words.par_iter().for_each(|word| {
            let Some(postings) = self.index.postings(word) else {
                return;
            };
            let idf = self.inverse_document_freq(postings.len());
            postings.par_iter().for_each(|(&id, &tf)| {
                if let Some(data) = self.index.document(id) {
                    if filter.accept(id, data.status, data.rating) {
                        relevance.update(id, |value| *value += tf * idf);
                    }
                }
            });
        });
        // Minus words run after every plus-word increment has joined.
        query.minus_words.par_iter().for_each(|word| {
            if let Some(postings) = self.index.postings(word) {
                for &id in postings.keys() {
                    relevance.erase(id);
                }
            }
        });
        relevance.into_ordinary_map()
    }

    pub fn match_document(&self, raw_query: &str, id: DocId) -> Result<(Vec<&str>, DocumentStatus)> {
        self.match_document_with(ExecutionPolicy::Sequential, raw_query, id)
    }

    /// Plus words of `raw_query` found in document `id`, sorted. Empty if any
    /// minus word is present.
    pub fn match_document_with(
        &self,
        policy: ExecutionPolicy,
        raw_query: &str,
        id: DocId,
    ) -> Result<(Vec<&str>, DocumentStatus)> {
        let query = parse_query(raw_query, &self.stop_words)?;
        let data = self.index.document(id).ok_or(SearchError::OutOfRange(id))?;
        let words = &data.word_freqs;

        let matched: Vec<&str> = match policy {
            ExecutionPolicy::Sequential => {
                if query.minus_words.iter().any(|word| words.contains_key(*word)) {
                    return Ok((Vec::new(), data.status));
                }
                query
                    .plus_words
                    .iter()
                    .filter_map(|word| words.get_key_value(*word))
                    .map(|(word, _)| word.as_str())
                    .collect()
            }
            ExecutionPolicy::Parallel => {
                if query.minus_words.par_iter().any(|word| words.contains_key(*word)) {
                    return Ok((Vec::new(), data.status));
                }
                let mut matched: Vec<&str> = query
                    .plus_words
                    .par_iter()
                    .filter_map(|word| words.get_key_value(*word))
                    .map(|(word, _)| word.as_str())
                    .collect();
                matched.sort_unstable();
                matched.dedup();
                matched
            }
        };
        Ok((matched, data.status))
    }

    /// Word frequencies of document `id`, empty if unknown.
    pub fn word_frequencies(&self, id: DocId) -> &BTreeMap<String, f64> {
        self.index.word_frequencies(id)
    }

    pub fn document_count(&self) -> usize {
        self.index.len()
    }

    /// Document ids in ascending order.
    pub fn iter(&self) -> DocIds<'_> {
        self.index.ids()
    }

    fn split_into_words_no_stop<'t>(&self, text: &'t str) -> Result<Vec<&'t str>> {
        let mut words = Vec::new();
        for word in split_into_words(text) {
            if !is_valid_word(word) {
                return Err(SearchError::InvalidArgument(format!("word {word:?} is invalid")));
            }
            if !self.stop_words.contains(word) {
                words.push(word);
            }
        }
        Ok(words)
    }
}

impl<'a> IntoIterator for &'a SearchServer {
    type Item = DocId;
    type IntoIter = DocIds<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Sort best first. Relevances within [`EPSILON`] of a run's leader are
/// treated as equal and ordered by rating descending, then id ascending.
fn sort_by_relevance(docs: &mut [Document]) {
    docs.sort_by(|a, b| b.relevance.total_cmp(&a.relevance).then_with(|| a.id.cmp(&b.id)));
    let mut start = 0;
    while start < docs.len() {
        let leader = docs[start].relevance;
        let end = docs[start..]
            .iter()
            .position(|doc| leader - doc.relevance >= EPSILON)
            .map_or(docs.len(), |offset| start + offset);
        docs[start..end].sort_by(|a, b| b.rating.cmp(&a.rating).then_with(|| a.id.cmp(&b.id)));
        start = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn near_equal_relevance_falls_back_to_rating() {
        let mut docs = vec![
            Document::new(1, 0.5, 1),
            Document::new(2, 0.5 + 1e-9, 3),
            Document::new(3, 0.9, -4),
            Document::new(4, 0.5, 3),
        ];
        sort_by_relevance(&mut docs);
        let ids: Vec<DocId> = docs.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![3, 2, 4, 1]);
    }

    #[test]
    fn documents_without_words_are_counted_but_never_ranked() {
        let mut server = SearchServer::new("and").unwrap();
        server.add_document(0, "and and", DocumentStatus::Actual, &[1]).unwrap();
        server.add_document(1, "", DocumentStatus::Actual, &[]).unwrap();
        assert_eq!(server.document_count(), 2);
        assert!(server.word_frequencies(0).is_empty());
        assert!(server.find_top_documents("and").unwrap().is_empty());
    }

    #[test]
    fn status_filter_and_closure_filter_agree() {
        let mut server = SearchServer::new("").unwrap();
        server.add_document(0, "cat", DocumentStatus::Banned, &[]).unwrap();
        server.add_document(1, "cat dog", DocumentStatus::Actual, &[]).unwrap();
        let by_status = server.find_top_documents_by("cat", DocumentStatus::Banned).unwrap();
        let by_closure = server
            .find_top_documents_by("cat", |_id: DocId, status: DocumentStatus, _rating: i32| status == DocumentStatus::Banned)
            .unwrap();
        assert_eq!(by_status, by_closure);
        assert_eq!(by_status[0].id, 0);
    }
}
