pub mod cache;
pub mod cancel;
pub mod config;
pub mod entry;
pub mod errors;
pub mod metrics;
pub mod projector;
pub mod query;
pub mod results;
pub mod search;

pub use cache::{HistorySnapshot, SearchCache};
pub use cancel::CancellationToken;
pub use config::QuickSearchConfig;
pub use entry::{Database, Entry, EntrySource, Group};
pub use errors::{Result, SearchError};
pub use metrics::{SearchMetrics, SearchStats};
pub use projector::{ColumnKind, ColumnSpec, FieldFormatter, IconResolver, ResultProjector, Row};
pub use query::{Query, SearchOptions};
pub use results::{ScanPlan, SearchResult, SearchStatus};
pub use search::{Presenter, Renderer, ResultView, SearchController};
