//! Registry of completed searches.
//!
//! The cache is append-only and insertion-ordered. Writers (`append`,
//! `clear`) take a short lock; readers take a [`HistorySnapshot`], a cheap
//! copy of the `Arc`s, so a scan never holds the lock.
//!
//! History is unbounded unless `max_history` is set, in which case the
//! oldest results are dropped first.
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::query::Query;
use crate::results::SearchResult;
use crate::search::matcher::EntryMatcher;

#[derive(Debug, Default)]
pub struct SearchCache {
    history: Mutex<Vec<Arc<SearchResult>>>,
    max_history: Option<usize>,
}

/// Point-in-time copy of the cache history, oldest first
#[derive(Debug, Clone, Default)]
pub struct HistorySnapshot {
    results: Vec<Arc<SearchResult>>,
}

impl SearchCache {
    /// Creates an empty, unbounded cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty cache that keeps at most `max_history` results
    pub fn with_limit(max_history: Option<usize>) -> Self {
        Self {
            history: Mutex::new(Vec::new()),
            max_history,
        }
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            results: self.history.lock().clone(),
        }
    }

    pub fn find_exact(&self, query: &Query) -> Option<Arc<SearchResult>> {
        self.snapshot().find_exact(query).cloned()
    }

    pub fn find_refinement_candidate(
        &self,
        query: &Query,
        matcher: &dyn EntryMatcher,
    ) -> Option<Arc<SearchResult>> {
        self.snapshot()
            .find_refinement_candidate(query, matcher)
            .cloned()
    }

    /// Appends a completed result and returns the stored copy.
    ///
    /// If a parameter-equal result is already present it is kept and
    /// returned instead, so history never holds two equal queries.
    pub fn append(&self, result: SearchResult) -> Arc<SearchResult> {
        let mut history = self.history.lock();
        if let Some(existing) = history
            .iter()
            .find(|cached| cached.query().param_equals(result.query()))
        {
            debug!("Result for {:?} already cached", result.query().text());
            return existing.clone();
        }

        let result = Arc::new(result);
        history.push(result.clone());
        if let Some(limit) = self.max_history {
            let excess = history.len().saturating_sub(limit);
            if excess > 0 {
                trace!("Evicting {} oldest cached results", excess);
                history.drain(..excess);
            }
        }
        result
    }

    /// Drops every cached result
    pub fn clear(&self) {
        let mut history = self.history.lock();
        debug!("Clearing {} cached results", history.len());
        history.clear();
    }

    pub fn len(&self) -> usize {
        self.history.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.lock().is_empty()
    }
}

impl HistorySnapshot {
    pub fn results(&self) -> &[Arc<SearchResult>] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Linear scan for a parameter-equal result
    pub fn find_exact(&self, query: &Query) -> Option<&Arc<SearchResult>> {
        self.results
            .iter()
            .find(|cached| cached.query().param_equals(query))
    }

    /// First result, in insertion order, that `query` refines
    pub fn find_refinement_candidate(
        &self,
        query: &Query,
        matcher: &dyn EntryMatcher,
    ) -> Option<&Arc<SearchResult>> {
        self.results
            .iter()
            .find(|cached| cached.query().is_refined_by(query, matcher))
    }
}
