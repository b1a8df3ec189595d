use dashmap::DashSet;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::entry::Entry;

/// Number of icons in the standard set; custom icons are indexed after them
pub const STANDARD_ICON_COUNT: usize = 69;

/// Maps an entry to the index of the icon its row displays
#[derive(Debug, Clone, Default)]
pub struct IconResolver {
    custom: HashMap<String, usize>,
    /// Unknown custom ids already warned about
    reported: Arc<DashSet<String>>,
}

impl IconResolver {
    /// Builds a resolver from the ordered custom icon table
    pub fn new<I, S>(custom_icons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let custom = custom_icons
            .into_iter()
            .enumerate()
            .map(|(position, id)| (id.into(), position))
            .collect();
        Self {
            custom,
            reported: Arc::default(),
        }
    }

    pub fn icon_index(&self, entry: &Entry) -> usize {
        let Some(custom_id) = entry.custom_icon.as_deref() else {
            return entry.icon_id;
        };
        match self.custom.get(custom_id) {
            Some(position) => STANDARD_ICON_COUNT + position,
            None => {
                if self.reported.insert(custom_id.to_string()) {
                    warn!("Unknown custom icon {} on entry {}", custom_id, entry.uuid);
                } else {
                    debug!("Unknown custom icon {} on entry {}", custom_id, entry.uuid);
                }
                entry.icon_id
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_icon() {
        let resolver = IconResolver::default();
        let mut entry = Entry::new("1");
        entry.icon_id = 7;
        assert_eq!(resolver.icon_index(&entry), 7);
    }

    #[test]
    fn test_custom_icon_after_standard_set() {
        let resolver = IconResolver::new(["first", "second"]);
        let mut entry = Entry::new("1");
        entry.custom_icon = Some("second".to_string());
        assert_eq!(resolver.icon_index(&entry), STANDARD_ICON_COUNT + 1);
    }

    #[test]
    fn test_unknown_custom_icon_falls_back() {
        let resolver = IconResolver::new(["first"]);
        let mut entry = Entry::new("1");
        entry.icon_id = 3;
        entry.custom_icon = Some("gone".to_string());
        assert_eq!(resolver.icon_index(&entry), 3);
    }

    #[test]
    fn test_unknown_custom_icon_reported_once() {
        let resolver = IconResolver::new(["first"]);
        let mut entry = Entry::new("1");
        entry.custom_icon = Some("gone".to_string());
        let mut other = Entry::new("2");
        other.custom_icon = Some("missing".to_string());

        // clones share what was already reported
        let copy = resolver.clone();
        for _ in 0..3 {
            resolver.icon_index(&entry);
            copy.icon_index(&entry);
        }
        copy.icon_index(&other);

        assert_eq!(resolver.reported.len(), 2);
        assert!(resolver.reported.contains("gone"));
        assert!(resolver.reported.contains("missing"));
    }
}
