use serde::{Deserialize, Serialize};

use crate::search::matcher::EntryMatcher;

/// Snapshot of the user-selectable search options.
///
/// Two queries only share cached results when their options are equal, so
/// every flag that can change what matches belongs here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    /// Interpret the query text as a regular expression
    pub regex: bool,
    pub search_in_title: bool,
    pub search_in_user_name: bool,
    pub search_in_password: bool,
    pub search_in_url: bool,
    pub search_in_notes: bool,
    /// Custom string fields
    pub search_in_other: bool,
    pub search_in_tags: bool,
    pub search_in_uuid: bool,
    pub exclude_expired: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            regex: false,
            search_in_title: true,
            search_in_user_name: true,
            search_in_password: false,
            search_in_url: true,
            search_in_notes: true,
            search_in_other: true,
            search_in_tags: true,
            search_in_uuid: false,
            exclude_expired: false,
        }
    }
}

/// Normalized search text plus the options it was issued with
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    text: String,
    options: SearchOptions,
}

impl Query {
    /// Creates a query, trimming surrounding whitespace from `text`
    pub fn new(text: &str, options: SearchOptions) -> Self {
        Self {
            text: text.trim().to_string(),
            options,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Exact cache-hit test: same trimmed text (case-sensitive) and same options
    pub fn param_equals(&self, other: &Query) -> bool {
        self.text == other.text && self.options == other.options
    }

    /// Returns true when every entry `candidate` can match is already among
    /// the matches of `self`, so a scan may be restricted to those.
    ///
    /// Requires equal options and `self.text` being a prefix of
    /// `candidate.text` under the matcher's normalization. A matcher that
    /// cannot guarantee this for the given options opts out entirely.
    pub fn is_refined_by(&self, candidate: &Query, matcher: &dyn EntryMatcher) -> bool {
        if self.options != candidate.options {
            return false;
        }
        let (Some(previous), Some(next)) = (
            matcher.refinement_key(&self.text, &self.options),
            matcher.refinement_key(&candidate.text, &candidate.options),
        ) else {
            return false;
        };
        next.starts_with(previous.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::matcher::TextMatcher;

    #[test]
    fn test_text_is_trimmed() {
        let query = Query::new("  alpha \t", SearchOptions::default());
        assert_eq!(query.text(), "alpha");
        assert!(Query::new(" \n ", SearchOptions::default()).is_empty());
    }

    #[test]
    fn test_param_equals() {
        let options = SearchOptions::default();
        let a = Query::new("alpha", options.clone());
        assert!(a.param_equals(&Query::new(" alpha ", options.clone())));
        assert!(!a.param_equals(&Query::new("Alpha", options.clone())));

        let other = SearchOptions {
            search_in_password: true,
            ..options
        };
        assert!(!a.param_equals(&Query::new("alpha", other)));
    }

    #[test]
    fn test_prefix_is_refinement() {
        let matcher = TextMatcher::new();
        let options = SearchOptions::default();
        let previous = Query::new("alpha", options.clone());

        assert!(previous.is_refined_by(&Query::new("alphabet", options.clone()), &matcher));
        // case-insensitive normalization
        assert!(previous.is_refined_by(&Query::new("ALPHAbet", options.clone()), &matcher));
        assert!(!previous.is_refined_by(&Query::new("alp", options.clone()), &matcher));
        // suffix and unrelated substrings do not qualify
        assert!(!previous.is_refined_by(&Query::new("betalpha", options.clone()), &matcher));
        assert!(!previous.is_refined_by(&Query::new("lpha", options), &matcher));
    }

    #[test]
    fn test_case_sensitive_refinement() {
        let matcher = TextMatcher::new();
        let options = SearchOptions {
            case_sensitive: true,
            ..SearchOptions::default()
        };
        let previous = Query::new("Al", options.clone());
        assert!(previous.is_refined_by(&Query::new("Alp", options.clone()), &matcher));
        assert!(!previous.is_refined_by(&Query::new("alp", options), &matcher));
    }

    #[test]
    fn test_option_change_is_not_refinement() {
        let matcher = TextMatcher::new();
        let previous = Query::new("alpha", SearchOptions::default());
        let candidate = Query::new(
            "alphabet",
            SearchOptions {
                exclude_expired: true,
                ..SearchOptions::default()
            },
        );
        assert!(!previous.is_refined_by(&candidate, &matcher));
    }

    #[test]
    fn test_regex_is_never_refinement() {
        let matcher = TextMatcher::new();
        let options = SearchOptions {
            regex: true,
            ..SearchOptions::default()
        };
        let previous = Query::new("ab", options.clone());
        assert!(!previous.is_refined_by(&Query::new("ab|cd", options), &matcher));
    }
}
