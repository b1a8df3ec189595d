//! Maps matched entries to renderable rows.
//!
//! Projection reads the entry through the external collaborators (the field
//! formatter and the icon resolver) and never mutates it. A result set is
//! projected on the rayon pool; order is preserved and the cancellation
//! token is checked once per row.
mod fields;
mod icons;

pub use fields::{
    default_columns, format_size_kb, ColumnKind, ColumnProvider, ColumnSpec, FieldFormatter,
    HIDDEN_TEXT, NEVER_EXPIRES_TEXT,
};
pub use icons::{IconResolver, STANDARD_ICON_COUNT};

use rayon::prelude::*;
use std::sync::Arc;

use crate::cancel::CancellationToken;
use crate::entry::{Color, Entry};

/// One display row
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub entry: Arc<Entry>,
    /// One cell per configured column; cell 0 is the label
    pub cells: Vec<String>,
    pub icon_index: usize,
    pub foreground: Option<Color>,
    pub background: Option<Color>,
}

impl Row {
    pub fn label(&self) -> &str {
        self.cells.first().map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResultProjector {
    formatter: FieldFormatter,
    icons: IconResolver,
}

impl ResultProjector {
    pub fn new(formatter: FieldFormatter, icons: IconResolver) -> Self {
        Self { formatter, icons }
    }

    pub fn formatter(&self) -> &FieldFormatter {
        &self.formatter
    }

    pub fn project(&self, entry: &Arc<Entry>) -> Row {
        let cells = (0..self.formatter.column_count())
            .map(|column| self.formatter.field(entry, column, true))
            .collect();
        Row {
            entry: entry.clone(),
            cells,
            icon_index: self.icons.icon_index(entry),
            foreground: entry.foreground,
            background: entry.background,
        }
    }

    /// Projects every entry in order, or returns `None` as soon as the
    /// token is observed cancelled.
    pub fn project_all(
        &self,
        entries: &[Arc<Entry>],
        token: &CancellationToken,
    ) -> Option<Vec<Row>> {
        entries
            .par_iter()
            .map(|entry| {
                if token.is_cancelled() {
                    None
                } else {
                    Some(self.project(entry))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::USER_NAME_FIELD;

    fn projector() -> ResultProjector {
        ResultProjector::new(
            FieldFormatter::new(default_columns()),
            IconResolver::new(["custom"]),
        )
    }

    #[test]
    fn test_project_row() {
        let mut entry = Entry::new("1")
            .with_title("Bank")
            .with_string(USER_NAME_FIELD, "me");
        entry.icon_id = 4;
        entry.foreground = Some(Color::new(255, 0, 0));
        let row = projector().project(&Arc::new(entry));

        assert_eq!(row.label(), "Bank");
        assert_eq!(row.cells.len(), 5);
        assert_eq!(row.cells[1], "me");
        assert_eq!(row.cells[2], HIDDEN_TEXT);
        assert_eq!(row.icon_index, 4);
        assert_eq!(row.foreground, Some(Color::new(255, 0, 0)));
        assert_eq!(row.background, None);
    }

    #[test]
    fn test_project_custom_icon() {
        let mut entry = Entry::new("1");
        entry.custom_icon = Some("custom".to_string());
        let row = projector().project(&Arc::new(entry));
        assert_eq!(row.icon_index, STANDARD_ICON_COUNT);
    }

    #[test]
    fn test_project_all_preserves_order() {
        let entries: Vec<_> = (0..100)
            .map(|i| Arc::new(Entry::new(i.to_string()).with_title(format!("e{i}"))))
            .collect();
        let rows = projector()
            .project_all(&entries, &CancellationToken::new())
            .unwrap();
        let labels: Vec<_> = rows.iter().map(Row::label).collect();
        let expected: Vec<_> = (0..100).map(|i| format!("e{i}")).collect();
        assert_eq!(labels, expected);
    }

    #[test]
    fn test_project_all_observes_cancellation() {
        let entries = vec![Arc::new(Entry::new("1"))];
        let token = CancellationToken::new();
        token.cancel();
        assert!(projector().project_all(&entries, &token).is_none());
    }

    #[test]
    fn test_project_row_without_columns() {
        let projector = ResultProjector::new(FieldFormatter::default(), IconResolver::default());
        let row = projector.project(&Arc::new(Entry::new("1").with_title("x")));
        assert!(row.cells.is_empty());
        assert_eq!(row.label(), "");
    }
}
