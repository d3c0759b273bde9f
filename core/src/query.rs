use crate::error::{Result, SearchError};
use crate::tokenizer::{is_valid_word, split_into_words, StopWords};
use std::collections::BTreeSet;

/// Parsed query. Words borrow from the raw query text.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Query<'q> {
    pub plus_words: BTreeSet<&'q str>,
    pub minus_words: BTreeSet<&'q str>,
}

struct QueryWord<'q> {
    data: &'q str,
    is_minus: bool,
    is_stop: bool,
}

fn parse_query_word<'q>(text: &'q str, stop_words: &StopWords) -> Result<QueryWord<'q>> {
    if text.is_empty() {
        return Err(SearchError::InvalidArgument("query word is empty".into()));
    }
    let (data, is_minus) = match text.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (text, false),
    };
    if data.is_empty() || data.starts_with('-') || !is_valid_word(data) {
        return Err(SearchError::InvalidArgument(format!("query word {text:?} is invalid")));
    }
    Ok(QueryWord { data, is_minus, is_stop: stop_words.contains(data) })
}

pub fn parse_query<'q>(text: &'q str, stop_words: &StopWords) -> Result<Query<'q>> {
    let mut query = Query::default();
    for word in split_into_words(text) {
        let word = parse_query_word(word, stop_words)?;
        if word.is_stop {
            continue;
        }
        if word.is_minus {
            query.minus_words.insert(word.data);
        } else {
            query.plus_words.insert(word.data);
        }
    }
    Ok(query)
}
