/// Live incremental search over an entry collection.
///
/// # Flow
///
/// Each keystroke or option toggle is a generation:
/// 1. [`SearchController`] cancels the previous generation and publishes `Pending`
/// 2. A [`SearchExecutor`] runs on the worker pool: exact cache hit, refined
///    scan over a cached superset, or a full scan of the source
/// 3. Matches are projected to rows and committed to the cache
/// 4. The [`Presenter`] installs the rows if the generation is still live
///
/// A cancelled generation leaves the cache and the view untouched.
///
/// # Example
///
/// ```rust,ignore
/// let (mut controller, mut presenter) =
///     SearchController::new(&config, Arc::new(database), icons)?;
/// let mut view = ResultView::new();
///
/// controller.on_text_changed("al");
/// controller.on_text_changed("alp");
/// presenter.settle(&mut view, Duration::from_secs(1));
/// ```
pub mod controller;
pub mod executor;
pub mod matcher;
pub mod presenter;

pub use controller::SearchController;
pub use executor::{Completion, Execution, SearchContext, SearchExecutor};
pub use matcher::{EntryMatcher, TextMatcher};
pub use presenter::{Presenter, Renderer, ResultView, UiEvent};
