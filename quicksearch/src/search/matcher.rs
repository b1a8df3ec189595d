use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::trace;

use crate::entry::{
    Entry, NOTES_FIELD, PASSWORD_FIELD, TITLE_FIELD, URL_FIELD, USER_NAME_FIELD,
};
use crate::errors::{Result, SearchError};
use crate::query::{Query, SearchOptions};

static PATTERN_CACHE: Lazy<DashMap<(String, bool), Arc<Regex>>> = Lazy::new(DashMap::new);

/// Decides whether an entry matches a query.
///
/// Implementations must be consistent with [`refinement_key`]: whenever the
/// key of `a` is a prefix of the key of `b` (same options), every entry that
/// matches `b` must also match `a`. The executor relies on this to narrow a
/// scan to a previous result set.
///
/// [`refinement_key`]: EntryMatcher::refinement_key
pub trait EntryMatcher: Send + Sync {
    /// Faults are propagated and terminate the scan.
    fn is_match(&self, entry: &Entry, query: &Query) -> Result<bool>;

    /// Normalized form of `text` for the refinement prefix test, or `None`
    /// when these options never allow narrowing.
    fn refinement_key<'a>(&self, text: &'a str, options: &SearchOptions) -> Option<Cow<'a, str>>;
}

/// Default matcher: substring or regex over the fields enabled in the options
#[derive(Debug, Clone, Default)]
pub struct TextMatcher;

impl TextMatcher {
    pub fn new() -> Self {
        Self
    }

    fn compiled(pattern: &str, case_sensitive: bool) -> Result<Arc<Regex>> {
        let key = (pattern.to_string(), case_sensitive);
        if let Some(regex) = PATTERN_CACHE.get(&key) {
            return Ok(regex.clone());
        }
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|e| SearchError::invalid_pattern(e.to_string()))?;
        let regex = Arc::new(regex);
        trace!("Compiled regex pattern: {}", pattern);
        PATTERN_CACHE.insert(key, regex.clone());
        Ok(regex)
    }
}

/// Calls `f` on every field the options enable until it returns true
fn any_field(entry: &Entry, options: &SearchOptions, mut f: impl FnMut(&str) -> bool) -> bool {
    let standard = [
        (options.search_in_title, TITLE_FIELD),
        (options.search_in_user_name, USER_NAME_FIELD),
        (options.search_in_password, PASSWORD_FIELD),
        (options.search_in_url, URL_FIELD),
        (options.search_in_notes, NOTES_FIELD),
    ];
    for (enabled, field) in standard {
        if enabled && f(entry.get(field)) {
            return true;
        }
    }
    if options.search_in_other && entry.custom_strings().any(|(_, value)| f(value)) {
        return true;
    }
    if options.search_in_tags && entry.tags.iter().any(|tag| f(tag)) {
        return true;
    }
    options.search_in_uuid && f(&entry.uuid)
}

impl EntryMatcher for TextMatcher {
    fn is_match(&self, entry: &Entry, query: &Query) -> Result<bool> {
        let options = query.options();
        if options.regex {
            let regex = Self::compiled(query.text(), options.case_sensitive)?;
            return Ok(any_field(entry, options, |value| regex.is_match(value)));
        }

        if options.case_sensitive {
            let needle = query.text();
            Ok(any_field(entry, options, |value| value.contains(needle)))
        } else {
            let needle = query.text().to_lowercase();
            Ok(any_field(entry, options, |value| {
                value.to_lowercase().contains(&needle)
            }))
        }
    }

    fn refinement_key<'a>(&self, text: &'a str, options: &SearchOptions) -> Option<Cow<'a, str>> {
        if options.regex {
            None
        } else if options.case_sensitive {
            Some(Cow::Borrowed(text))
        } else {
            Some(Cow::Owned(text.to_lowercase()))
        }
    }
}
