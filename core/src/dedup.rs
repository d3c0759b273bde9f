use crate::{DocId, SearchServer};
use std::collections::BTreeSet;
use tracing::info;

/// Remove documents whose set of distinct words repeats an earlier document.
///
/// Documents are visited in ascending id order, so the lowest id of each
/// group survives. Returns the removed ids in ascending order.
pub fn remove_duplicates(server: &mut SearchServer) -> Vec<DocId> {
    let mut seen: BTreeSet<Vec<&str>> = BTreeSet::new();
    let mut duplicates = Vec::new();
    for id in server.iter() {
        let words: Vec<&str> = server.word_frequencies(id).keys().map(String::as_str).collect();
        if !seen.insert(words) {
            duplicates.push(id);
        }
    }
    drop(seen);

    for &id in &duplicates {
        server.remove_document(id);
        info!(id, "found duplicate document");
    }
    duplicates
}
