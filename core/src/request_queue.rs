use crate::{Document, DocumentFilter, DocumentStatus, Result, SearchServer};
use std::collections::VecDeque;

/// Number of most recent requests kept, one per minute of a day.
pub const MIN_IN_DAY: usize = 1440;

/// Tracks how many of the recent find requests returned nothing.
pub struct RequestQueue<'a> {
    server: &'a SearchServer,
    requests: VecDeque<bool>,
    no_result: usize,
}

impl<'a> RequestQueue<'a> {
    pub fn new(server: &'a SearchServer) -> Self {
        Self { server, requests: VecDeque::with_capacity(MIN_IN_DAY), no_result: 0 }
    }

    pub fn add_find_request(&mut self, raw_query: &str) -> Result<Vec<Document>> {
        self.add_find_request_by(raw_query, DocumentStatus::Actual)
    }

    /// Failed requests propagate their error and are not recorded.
    pub fn add_find_request_by<F: DocumentFilter>(&mut self, raw_query: &str, filter: F) -> Result<Vec<Document>> {
        let found = self.server.find_top_documents_by(raw_query, filter)?;
        self.record(found.is_empty());
        Ok(found)
    }

    fn record(&mut self, empty: bool) {
        if self.requests.len() == MIN_IN_DAY && self.requests.pop_front() == Some(true) {
            self.no_result -= 1;
        }
        self.requests.push_back(empty);
        if empty {
            self.no_result += 1;
        }
    }

    pub fn no_result_requests(&self) -> usize {
        self.no_result
    }
}
