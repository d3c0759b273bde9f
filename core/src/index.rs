use crate::{DocId, DocumentStatus, ExecutionPolicy};
use rayon::prelude::*;
use std::collections::{btree_map, BTreeMap};
use std::iter::Copied;

/// Ascending iterator over indexed document ids.
pub type DocIds<'a> = Copied<btree_map::Keys<'a, DocId, DocumentData>>;

static EMPTY_FREQS: BTreeMap<String, f64> = BTreeMap::new();

#[derive(Debug, Clone)]
pub struct DocumentData {
    pub rating: i32,
    pub status: DocumentStatus,
    /// Original text as it was submitted.
    pub text: String,
    /// word -> occurrences / total words in this document
    pub word_freqs: BTreeMap<String, f64>,
}

/// Inverted index with both directions kept in lockstep.
///
/// `word_to_docs` and each document's `word_freqs` only change through
/// [`InvertedIndex::insert`] and [`InvertedIndex::remove`]. Posting lists are
/// never left empty.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    word_to_docs: BTreeMap<String, BTreeMap<DocId, f64>>,
    documents: BTreeMap<DocId, DocumentData>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Index already validated, stop-word-free `words` for `id`.
    pub(crate) fn insert(&mut self, id: DocId, text: &str, words: &[&str], status: DocumentStatus, rating: i32) {
        let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
        for word in words {
            *counts.entry(*word).or_insert(0) += 1;
        }
        let total = words.len() as f64;
        let word_freqs: BTreeMap<String, f64> = counts
            .into_iter()
            .map(|(word, count)| (word.to_string(), count as f64 / total))
            .collect();

        for (word, &tf) in &word_freqs {
            self.word_to_docs.entry(word.clone()).or_default().insert(id, tf);
        }
        self.documents.insert(id, DocumentData { rating, status, text: text.to_string(), word_freqs });
    }

    /// Drop `id` from both directions. Returns `false` if it was not indexed.
    pub(crate) fn remove(&mut self, policy: ExecutionPolicy, id: DocId) -> bool {
        let Some(data) = self.documents.remove(&id) else {
            return false;
        };

        match policy {
            ExecutionPolicy::Sequential => {
                for word in data.word_freqs.keys() {
                    if let Some(postings) = self.word_to_docs.get_mut(word) {
                        postings.remove(&id);
                        if postings.is_empty() {
                            self.word_to_docs.remove(word);
                        }
                    }
                }
            }
            ExecutionPolicy::Parallel => {
                // Detach this document's posting lists so workers own disjoint terms.
                let mut lists: Vec<(String, BTreeMap<DocId, f64>)> = data
                    .word_freqs
                    .keys()
                    .filter_map(|word| self.word_to_docs.remove_entry(word.as_str()))
                    .collect();
                lists.par_iter_mut().for_each(|(_, postings)| {
                    postings.remove(&id);
                });
                self.word_to_docs.extend(lists.into_iter().filter(|(_, postings)| !postings.is_empty()));
            }
        }
        true
    }

    pub fn postings(&self, word: &str) -> Option<&BTreeMap<DocId, f64>> {
        self.word_to_docs.get(word)
    }

    pub fn document(&self, id: DocId) -> Option<&DocumentData> {
        self.documents.get(&id)
    }

    pub fn contains(&self, id: DocId) -> bool {
        self.documents.contains_key(&id)
    }

    /// Word frequencies of `id`, or an empty map for unknown ids.
    pub fn word_frequencies(&self, id: DocId) -> &BTreeMap<String, f64> {
        self.documents.get(&id).map(|data| &data.word_freqs).unwrap_or(&EMPTY_FREQS)
    }

    /// Document ids in ascending order.
    pub fn ids(&self) -> DocIds<'_> {
        self.documents.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of distinct indexed words.
    pub fn word_count(&self) -> usize {
        self.word_to_docs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_with(docs: &[(DocId, &str)]) -> InvertedIndex {
        let mut index = InvertedIndex::new();
        for &(id, text) in docs {
            let words: Vec<&str> = crate::tokenizer::split_into_words(text).collect();
            index.insert(id, text, &words, DocumentStatus::Actual, 0);
        }
        index
    }

    fn assert_lockstep(index: &InvertedIndex) {
        for (word, postings) in &index.word_to_docs {
            assert!(!postings.is_empty(), "empty posting list for {word}");
            for (id, tf) in postings {
                assert_eq!(index.word_frequencies(*id).get(word), Some(tf));
            }
        }
        for (id, data) in &index.documents {
            for (word, tf) in &data.word_freqs {
                assert_eq!(index.postings(word).and_then(|p| p.get(id)), Some(tf));
            }
        }
    }

    #[test]
    fn frequencies_are_normalized() {
        let index = index_with(&[(1, "fluffy cat fluffy tail")]);
        let freqs = index.word_frequencies(1);
        assert_eq!(freqs.get("fluffy"), Some(&0.5));
        assert_eq!(freqs.get("cat"), Some(&0.25));
        let sum: f64 = freqs.values().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert_lockstep(&index);
    }

    #[test]
    fn unknown_id_has_empty_frequencies() {
        let index = InvertedIndex::new();
        assert!(index.word_frequencies(42).is_empty());
    }

    #[test]
    fn removal_deletes_emptied_posting_lists() {
        let mut index = index_with(&[(0, "white cat"), (1, "fluffy cat")]);
        assert!(index.remove(ExecutionPolicy::Sequential, 1));
        assert!(index.postings("fluffy").is_none());
        assert_eq!(index.postings("cat").map(|p| p.len()), Some(1));
        assert_eq!(index.word_count(), 2);
        assert!(!index.remove(ExecutionPolicy::Sequential, 1));
        assert_lockstep(&index);
    }

    #[test]
    fn parallel_removal_matches_sequential() {
        let docs = [
            (0, "white cat and fashionable collar"),
            (1, "fluffy cat fluffy tail"),
            (2, "groomed dog expressive eyes"),
            (3, "groomed starling evgeny"),
        ];
        let mut seq = index_with(&docs);
        let mut par = index_with(&docs);
        for id in [1, 3] {
            assert!(seq.remove(ExecutionPolicy::Sequential, id));
            assert!(par.remove(ExecutionPolicy::Parallel, id));
        }
        assert_eq!(seq.ids().collect::<Vec<_>>(), par.ids().collect::<Vec<_>>());
        assert_eq!(seq.word_to_docs, par.word_to_docs);
        assert_lockstep(&par);
    }

    #[test]
    fn parallel_removal_keeps_unrelated_words() {
        let mut index = index_with(&[(0, "a zz"), (1, "a b c d e f zz"), (2, "m zz")]);
        assert!(index.remove(ExecutionPolicy::Parallel, 1));
        assert_eq!(index.word_count(), 3);
        for word in ["b", "c", "d", "e", "f"] {
            assert!(index.postings(word).is_none(), "{word}");
        }
        assert_eq!(index.postings("a").map(|p| p.keys().copied().collect::<Vec<_>>()), Some(vec![0]));
        assert_eq!(index.postings("zz").map(|p| p.len()), Some(2));
        assert_eq!(index.postings("m").map(|p| p.len()), Some(1));
        assert_lockstep(&index);
    }

    #[test]
    fn single_word_document_removes_in_parallel() {
        let mut index = index_with(&[(7, "alone")]);
        assert!(index.remove(ExecutionPolicy::Parallel, 7));
        assert_eq!(index.word_count(), 0);
        assert!(index.is_empty());
    }
}
