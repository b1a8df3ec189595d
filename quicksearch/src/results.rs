//! Result types shared by the cache, the executor and the controller.
//!
//! A [`SearchResult`] is built once by an executor and never changes after
//! that. The cache hands out `Arc<SearchResult>` so a long-running scan can
//! read a previous result set while new ones are being appended.
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::entry::Entry;
use crate::query::Query;

/// A completed query paired with its matches in traversal order
#[derive(Debug, Clone)]
pub struct SearchResult {
    query: Query,
    entries: Vec<Arc<Entry>>,
}

impl SearchResult {
    pub fn new(query: Query, entries: Vec<Arc<Entry>>) -> Self {
        Self { query, entries }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn entries(&self) -> &[Arc<Entry>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Status a completed search reports for this result set
    pub fn status(&self) -> SearchStatus {
        if self.entries.is_empty() {
            SearchStatus::NoMatches
        } else {
            SearchStatus::Success
        }
    }
}

/// Status shown to the user next to the search box
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchStatus {
    /// No search active (empty query)
    #[default]
    Normal,
    /// A search is running
    Pending,
    /// The last search found at least one entry
    Success,
    /// The last search completed with zero matches
    NoMatches,
}

impl std::fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SearchStatus::Normal => "normal",
            SearchStatus::Pending => "pending",
            SearchStatus::Success => "success",
            SearchStatus::NoMatches => "no matches",
        };
        f.write_str(label)
    }
}

/// How an executor arrived at its result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPlan {
    /// Reused a parameter-equal cached result without matching
    Exact,
    /// Matched only the entries of a cached ancestor result
    Refined { candidates: usize },
    /// Matched the full entry collection
    Full,
}
