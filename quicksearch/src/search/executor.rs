use std::borrow::Cow;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, trace};

use super::matcher::EntryMatcher;
use crate::cache::SearchCache;
use crate::cancel::CancellationToken;
use crate::entry::{Entry, EntrySource};
use crate::errors::Result;
use crate::metrics::SearchMetrics;
use crate::projector::{ResultProjector, Row};
use crate::query::Query;
use crate::results::{ScanPlan, SearchResult, SearchStatus};

/// Collaborators shared by every execution of one controller
#[derive(Clone)]
pub struct SearchContext {
    pub cache: Arc<SearchCache>,
    pub source: Arc<dyn EntrySource>,
    pub matcher: Arc<dyn EntryMatcher>,
    pub projector: Arc<ResultProjector>,
    pub metrics: SearchMetrics,
}

/// Outcome of a search that did not fault
#[derive(Debug)]
pub enum Execution {
    Completed(Completion),
    /// The token was observed cancelled; nothing was committed
    Canceled,
}

/// A committed search and its projected rows.
///
/// `result` holds the clock-independent match set that was cached; `rows`
/// are the matches still visible now, after the expiry filter.
#[derive(Debug)]
pub struct Completion {
    pub result: Arc<SearchResult>,
    pub rows: Vec<Row>,
    pub plan: ScanPlan,
}

impl Completion {
    pub fn status(&self) -> SearchStatus {
        if self.rows.is_empty() {
            SearchStatus::NoMatches
        } else {
            SearchStatus::Success
        }
    }
}

/// Matches gathered before commit
enum Found {
    Cached(Arc<SearchResult>),
    Scanned(Vec<Arc<Entry>>),
}

impl Found {
    fn entries(&self) -> &[Arc<Entry>] {
        match self {
            Found::Cached(result) => result.entries(),
            Found::Scanned(entries) => entries,
        }
    }
}

/// Runs one query to completion or cancellation.
///
/// The token is polled before the cache lookup, before the scan starts,
/// once per candidate entry, once per projected row and once more right
/// before commit. Any positive check returns [`Execution::Canceled`] with
/// the cache untouched. A matcher fault is returned as an error, also
/// without touching the cache.
///
/// Expired entries are dropped after matching and before projection, on
/// every plan. The cache never sees the clock, so an exact hit or a
/// refinement reused later still hides entries that expired since.
pub struct SearchExecutor {
    query: Query,
    context: SearchContext,
    token: CancellationToken,
}

impl SearchExecutor {
    pub fn new(query: Query, context: SearchContext, token: CancellationToken) -> Self {
        Self {
            query,
            context,
            token,
        }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn run(&self) -> Result<Execution> {
        let outcome = self.execute();
        let metrics = &self.context.metrics;
        match &outcome {
            Ok(Execution::Completed(_)) => metrics.record_completed(),
            Ok(Execution::Canceled) => metrics.record_canceled(),
            Err(_) => metrics.record_faulted(),
        }
        outcome
    }

    fn canceled_at(&self, checkpoint: &str) -> bool {
        let canceled = self.token.is_cancelled();
        if canceled {
            trace!("Search for {:?} canceled {}", self.query.text(), checkpoint);
        }
        canceled
    }

    fn execute(&self) -> Result<Execution> {
        if self.canceled_at("before cache lookup") {
            return Ok(Execution::Canceled);
        }

        let snapshot = self.context.cache.snapshot();
        let (found, plan, scanned) = if let Some(hit) = snapshot.find_exact(&self.query) {
            debug!("Exact cache hit for {:?}", self.query.text());
            (Found::Cached(hit.clone()), ScanPlan::Exact, 0)
        } else {
            let base = snapshot.find_refinement_candidate(&self.query, self.context.matcher.as_ref());
            if self.canceled_at("before scan") {
                return Ok(Execution::Canceled);
            }
            let (plan, scan) = match base {
                Some(base) => {
                    debug!(
                        "Refining {:?} from {} cached matches of {:?}",
                        self.query.text(),
                        base.len(),
                        base.query().text()
                    );
                    let plan = ScanPlan::Refined {
                        candidates: base.len(),
                    };
                    (plan, self.scan(base.entries().iter())?)
                }
                None => {
                    debug!("Full scan for {:?}", self.query.text());
                    (ScanPlan::Full, self.scan(self.context.source.entries())?)
                }
            };
            let Some((matches, scanned)) = scan else {
                return Ok(Execution::Canceled);
            };
            (Found::Scanned(matches), plan, scanned)
        };

        let projected = {
            let visible = self.visible(found.entries());
            self.context.projector.project_all(&visible, &self.token)
        };
        let Some(rows) = projected else {
            trace!("Search for {:?} canceled during projection", self.query.text());
            return Ok(Execution::Canceled);
        };

        if self.canceled_at("before commit") {
            return Ok(Execution::Canceled);
        }

        let result = match found {
            Found::Cached(result) => result,
            Found::Scanned(entries) => self
                .context
                .cache
                .append(SearchResult::new(self.query.clone(), entries)),
        };
        self.context.metrics.record_scan(plan, scanned);

        Ok(Execution::Completed(Completion { result, rows, plan }))
    }

    fn visible<'a>(&self, entries: &'a [Arc<Entry>]) -> Cow<'a, [Arc<Entry>]> {
        if !self.query.options().exclude_expired {
            return Cow::Borrowed(entries);
        }
        let now = SystemTime::now();
        Cow::Owned(
            entries
                .iter()
                .filter(|entry| !entry.is_expired(now))
                .cloned()
                .collect(),
        )
    }

    /// Applies the matcher to each candidate in order; `None` if canceled
    fn scan<'a>(
        &self,
        candidates: impl Iterator<Item = &'a Arc<Entry>>,
    ) -> Result<Option<(Vec<Arc<Entry>>, u64)>> {
        let mut matches = Vec::new();
        let mut scanned = 0;
        for entry in candidates {
            if self.token.is_cancelled() {
                trace!(
                    "Search for {:?} canceled after {} entries",
                    self.query.text(),
                    scanned
                );
                return Ok(None);
            }
            scanned += 1;
            if self.context.matcher.is_match(entry, &self.query)? {
                matches.push(entry.clone());
            }
        }
        Ok(Some((matches, scanned)))
    }
}
