use crossbeam_channel::{unbounded, Sender};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use super::executor::{Execution, SearchContext, SearchExecutor};
use super::matcher::{EntryMatcher, TextMatcher};
use super::presenter::{Presenter, UiEvent};
use crate::cache::SearchCache;
use crate::cancel::CancellationToken;
use crate::config::QuickSearchConfig;
use crate::entry::EntrySource;
use crate::errors::Result;
use crate::metrics::SearchMetrics;
use crate::projector::{FieldFormatter, IconResolver, ResultProjector};
use crate::query::{Query, SearchOptions};

/// Turns input events into search generations.
///
/// Every text or option change starts a new generation: the previous one is
/// cancelled, the status goes to `Pending` and a [`SearchExecutor`] is
/// spawned on the worker pool. Results travel back to the [`Presenter`]
/// returned alongside the controller, which drops anything that is no
/// longer the live generation. An empty query never reaches the pool; it
/// resets the view to `Normal` with no rows.
pub struct SearchController {
    context: SearchContext,
    pool: ThreadPool,
    generation: Arc<AtomicU64>,
    live: Option<CancellationToken>,
    events: Sender<UiEvent>,
    text: String,
    options: SearchOptions,
    max_history: Option<usize>,
}

impl SearchController {
    /// Controller over `source` using the default matcher and the
    /// configured columns
    pub fn new(
        config: &QuickSearchConfig,
        source: Arc<dyn EntrySource>,
        icons: IconResolver,
    ) -> Result<(Self, Presenter)> {
        let projector = ResultProjector::new(FieldFormatter::new(config.columns.clone()), icons);
        Self::with_parts(config, source, Arc::new(TextMatcher::new()), projector)
    }

    pub fn with_parts(
        config: &QuickSearchConfig,
        source: Arc<dyn EntrySource>,
        matcher: Arc<dyn EntryMatcher>,
        projector: ResultProjector,
    ) -> Result<(Self, Presenter)> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.thread_count.get())
            .thread_name(|i| format!("quicksearch-{}", i))
            .build()?;
        debug!("Search pool started with {} threads", config.thread_count);

        let (events, receiver) = unbounded();
        let generation = Arc::new(AtomicU64::new(0));
        let presenter = Presenter::new(receiver, generation.clone());

        let controller = Self {
            context: SearchContext {
                cache: Arc::new(SearchCache::with_limit(config.max_history)),
                source,
                matcher,
                projector: Arc::new(projector),
                metrics: SearchMetrics::new(),
            },
            pool,
            generation,
            live: None,
            events,
            text: String::new(),
            options: config.options.clone(),
            max_history: config.max_history,
        };
        Ok((controller, presenter))
    }

    /// Search text as last typed, untrimmed
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn cache(&self) -> &SearchCache {
        &self.context.cache
    }

    pub fn metrics(&self) -> &SearchMetrics {
        &self.context.metrics
    }

    /// Number of the most recently started generation (0 before any input)
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn on_text_changed(&mut self, text: &str) {
        self.text = text.to_string();
        self.start_generation();
    }

    pub fn on_options_changed(&mut self, options: SearchOptions) {
        self.options = options;
        self.start_generation();
    }

    /// Forgets every cached result; the next search scans the full source
    pub fn clear_history(&self) {
        self.context.cache.clear();
    }

    /// Swaps in a reloaded entry collection and re-runs the current query
    /// against it.
    ///
    /// Cached results refer to the old collection, so the cache is replaced
    /// rather than cleared; a generation still finishing against the old
    /// collection commits into the discarded cache.
    pub fn replace_source(&mut self, source: Arc<dyn EntrySource>) {
        self.cancel_live();
        info!("Entry source replaced, dropping {} cached results", self.context.cache.len());
        self.context.source = source;
        self.context.cache = Arc::new(SearchCache::with_limit(self.max_history));
        self.start_generation();
    }

    fn cancel_live(&mut self) {
        if let Some(token) = self.live.take() {
            token.cancel();
        }
    }

    fn start_generation(&mut self) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.cancel_live();

        let query = Query::new(&self.text, self.options.clone());
        if query.is_empty() {
            trace!("Generation {} has an empty query", generation);
            self.send(UiEvent::Reset { generation });
            return;
        }

        self.send(UiEvent::Pending { generation });
        let token = CancellationToken::new();
        self.live = Some(token.clone());

        debug!("Generation {} searching for {:?}", generation, query.text());
        let executor = SearchExecutor::new(query, self.context.clone(), token);
        let events = self.events.clone();
        self.pool.spawn(move || {
            let event = match executor.run() {
                Ok(Execution::Completed(done)) => {
                    info!(
                        "Generation {} found {} entries for {:?} ({:?})",
                        generation,
                        done.rows.len(),
                        executor.query().text(),
                        done.plan
                    );
                    let status = done.status();
                    UiEvent::Completed {
                        generation,
                        rows: done.rows,
                        status,
                    }
                }
                Ok(Execution::Canceled) => return,
                Err(err) => {
                    warn!("Generation {} faulted: {}", generation, err);
                    UiEvent::Failed {
                        generation,
                        error: err.to_string(),
                    }
                }
            };
            if events.send(event).is_err() {
                trace!("Presenter gone, discarding generation {}", generation);
            }
        });
    }

    fn send(&self, event: UiEvent) {
        if self.events.send(event).is_err() {
            trace!("Presenter gone, event discarded");
        }
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        self.cancel_live();
    }
}
