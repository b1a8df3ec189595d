use config::{Config as ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::{Result, SearchError};
use crate::projector::{default_columns, ColumnSpec};
use crate::query::SearchOptions;

/// Settings for a search session.
///
/// # Configuration Locations
///
/// Later sources override earlier ones:
/// 1. Global `$CONFIG_DIR/quicksearch/config.yaml`
/// 2. Local `.quicksearch.yaml` in the current directory
/// 3. Custom config file given via `--config` (must exist)
///
/// # Configuration Format
///
/// ```yaml
/// # Result list columns, in display order
/// columns:
///   - kind: title
///   - kind: user_name
///   - kind: password
///     hide_with_asterisks: true
///   - kind: custom_string
///     custom_name: "Account"
///
/// # Initial search options
/// options:
///   case_sensitive: false
///   search_in_password: false
///   exclude_expired: true
///
/// # Worker threads (default: CPU cores)
/// thread_count: 4
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
///
/// # Keep at most this many cached searches (default: unbounded)
/// max_history: 256
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickSearchConfig {
    #[serde(default = "default_columns")]
    pub columns: Vec<ColumnSpec>,

    #[serde(default)]
    pub options: SearchOptions,

    /// Number of threads searches and projection run on
    #[serde(default = "default_thread_count")]
    pub thread_count: NonZeroUsize,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub max_history: Option<usize>,
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for QuickSearchConfig {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            options: SearchOptions::default(),
            thread_count: default_thread_count(),
            log_level: default_log_level(),
            max_history: None,
        }
    }
}

impl QuickSearchConfig {
    /// Loads configuration from the default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Loads configuration from the default locations plus `config_path`
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        let defaults = [
            dirs::config_dir().map(|p| p.join("quicksearch/config.yaml")),
            Some(PathBuf::from(".quicksearch.yaml")),
        ];
        for path in defaults.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()
    }

    fn validate(self) -> Result<Self> {
        // column 0 is the row label
        if self.columns.is_empty() {
            return Err(SearchError::config_error("at least one column is required"));
        }
        Ok(self)
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli_config: QuickSearchConfig) -> Self {
        // CLI values take precedence over config file values
        if cli_config.columns != default_columns() {
            self.columns = cli_config.columns;
        }
        self.options = merge_options(self.options, cli_config.options);
        if cli_config.thread_count != default_thread_count() {
            self.thread_count = cli_config.thread_count;
        }
        if cli_config.log_level != default_log_level() {
            self.log_level = cli_config.log_level;
        }
        if cli_config.max_history.is_some() {
            self.max_history = cli_config.max_history;
        }
        self
    }
}

/// Takes each CLI flag that differs from its default, keeping the file's
/// value for every flag the CLI left alone
fn merge_options(file: SearchOptions, cli: SearchOptions) -> SearchOptions {
    let defaults = SearchOptions::default();
    let pick = |cli: bool, default: bool, file: bool| if cli != default { cli } else { file };

    SearchOptions {
        case_sensitive: pick(cli.case_sensitive, defaults.case_sensitive, file.case_sensitive),
        regex: pick(cli.regex, defaults.regex, file.regex),
        search_in_title: pick(
            cli.search_in_title,
            defaults.search_in_title,
            file.search_in_title,
        ),
        search_in_user_name: pick(
            cli.search_in_user_name,
            defaults.search_in_user_name,
            file.search_in_user_name,
        ),
        search_in_password: pick(
            cli.search_in_password,
            defaults.search_in_password,
            file.search_in_password,
        ),
        search_in_url: pick(cli.search_in_url, defaults.search_in_url, file.search_in_url),
        search_in_notes: pick(
            cli.search_in_notes,
            defaults.search_in_notes,
            file.search_in_notes,
        ),
        search_in_other: pick(
            cli.search_in_other,
            defaults.search_in_other,
            file.search_in_other,
        ),
        search_in_tags: pick(cli.search_in_tags, defaults.search_in_tags, file.search_in_tags),
        search_in_uuid: pick(cli.search_in_uuid, defaults.search_in_uuid, file.search_in_uuid),
        exclude_expired: pick(
            cli.exclude_expired,
            defaults.exclude_expired,
            file.exclude_expired,
        ),
    }
}
