use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::warn;

use crate::entry::{Entry, NOTES_FIELD, PASSWORD_FIELD, TITLE_FIELD, URL_FIELD, USER_NAME_FIELD};

/// Text shown for columns configured as hidden
pub const HIDDEN_TEXT: &str = "********";
/// Text shown in expiry columns for entries that never expire
pub const NEVER_EXPIRES_TEXT: &str = "Never";

/// What a column displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Title,
    UserName,
    Password,
    Url,
    Notes,
    CreationTime,
    LastAccessTime,
    LastModificationTime,
    ExpiryTime,
    ExpiryTimeDateOnly,
    Uuid,
    Attachment,
    /// A custom string field named by `custom_name`
    CustomString,
    /// Text supplied by a registered [`ColumnProvider`] named by `custom_name`
    PluginExt,
    OverrideUrl,
    Tags,
    Size,
    HistoryCount,
}

/// One configured display column. Column 0 is the primary label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub kind: ColumnKind,
    #[serde(default)]
    pub custom_name: Option<String>,
    #[serde(default)]
    pub hide_with_asterisks: bool,
}

impl ColumnSpec {
    pub fn new(kind: ColumnKind) -> Self {
        Self {
            kind,
            custom_name: None,
            hide_with_asterisks: false,
        }
    }

    pub fn custom(kind: ColumnKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            custom_name: Some(name.into()),
            hide_with_asterisks: false,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.hide_with_asterisks = true;
        self
    }
}

/// Title, user name, hidden password, URL and notes
pub fn default_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new(ColumnKind::Title),
        ColumnSpec::new(ColumnKind::UserName),
        ColumnSpec::new(ColumnKind::Password).hidden(),
        ColumnSpec::new(ColumnKind::Url),
        ColumnSpec::new(ColumnKind::Notes),
    ]
}

/// Supplies cell text for [`ColumnKind::PluginExt`] columns
pub trait ColumnProvider: Send + Sync {
    fn cell_data(&self, column_name: &str, entry: &Entry) -> String;
}

/// Turns an entry and a column into display text
#[derive(Clone, Default)]
pub struct FieldFormatter {
    columns: Vec<ColumnSpec>,
    providers: HashMap<String, Arc<dyn ColumnProvider>>,
}

impl std::fmt::Debug for FieldFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldFormatter")
            .field("columns", &self.columns)
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FieldFormatter {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self {
            columns,
            providers: HashMap::new(),
        }
    }

    /// Registers the provider answering plugin columns named `name`
    pub fn register_provider(&mut self, name: impl Into<String>, provider: Arc<dyn ColumnProvider>) {
        self.providers.insert(name.into(), provider);
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Text for `entry` in column `index`.
    ///
    /// An index outside the configured columns yields an empty cell.
    pub fn field(&self, entry: &Entry, index: usize, asterisks_if_hidden: bool) -> String {
        let Some(column) = self.columns.get(index) else {
            warn!("Column {} is not configured", index);
            return String::new();
        };
        if asterisks_if_hidden && column.hide_with_asterisks {
            return HIDDEN_TEXT.to_string();
        }

        match column.kind {
            ColumnKind::Title => entry.get(TITLE_FIELD).to_string(),
            ColumnKind::UserName => entry.get(USER_NAME_FIELD).to_string(),
            ColumnKind::Password => entry.get(PASSWORD_FIELD).to_string(),
            ColumnKind::Url => entry.get(URL_FIELD).to_string(),
            ColumnKind::Notes => entry.get(NOTES_FIELD).to_string(),
            ColumnKind::CreationTime => display_time(entry.times.creation),
            ColumnKind::LastAccessTime => display_time(entry.times.last_access),
            ColumnKind::LastModificationTime => display_time(entry.times.last_modification),
            ColumnKind::ExpiryTime => entry
                .times
                .expiry
                .map(display_time)
                .unwrap_or_else(|| NEVER_EXPIRES_TEXT.to_string()),
            ColumnKind::ExpiryTimeDateOnly => entry
                .times
                .expiry
                .map(display_date)
                .unwrap_or_else(|| NEVER_EXPIRES_TEXT.to_string()),
            ColumnKind::Uuid => entry.uuid.to_uppercase(),
            ColumnKind::Attachment => entry.attachments.join(", "),
            ColumnKind::CustomString => match &column.custom_name {
                Some(name) => entry.get(name).to_string(),
                None => {
                    warn!("Custom string column {} has no field name", index);
                    String::new()
                }
            },
            ColumnKind::PluginExt => self.plugin_cell(column, entry),
            ColumnKind::OverrideUrl => entry.override_url.clone(),
            ColumnKind::Tags => entry.tags.join("; "),
            ColumnKind::Size => format_size_kb(entry.size()),
            ColumnKind::HistoryCount => entry.history_count.to_string(),
        }
    }

    fn plugin_cell(&self, column: &ColumnSpec, entry: &Entry) -> String {
        let provider = column
            .custom_name
            .as_deref()
            .and_then(|name| self.providers.get(name).map(|p| (name, p)));
        match provider {
            Some((name, provider)) => provider.cell_data(name, entry),
            None => {
                warn!("No column provider for {:?}", column.custom_name);
                String::new()
            }
        }
    }
}

fn display_time(time: SystemTime) -> String {
    humantime::format_rfc3339_seconds(time).to_string()
}

fn display_date(time: SystemTime) -> String {
    let full = display_time(time);
    match full.split_once('T') {
        Some((date, _)) => date.to_string(),
        None => full,
    }
}

/// Whole kilobytes, rounded up
pub fn format_size_kb(bytes: u64) -> String {
    format!("{} KB", bytes.div_ceil(1024))
}
