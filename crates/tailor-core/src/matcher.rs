//! Entry matching.
//!
//! Resolves which tailoring entry, if any, owns a given search result.
//! Matching tests whether the result's link representation contains a
//! scheme separator, an optional subdomain prefix, and then one of the
//! entry's domain fragments. This is a deliberately loose substring test
//! inherited from the rules format users already have: fragments can
//! false-positive against unrelated hosts that merely contain them, and a
//! fragment's `.` matches any character. Strict hostname parsing would
//! change which results existing rules catch, so the loose test is kept
//! as-is; it is a known limitation, not a bug to fix.

use regex::Regex;

use crate::page::ResultHandle;
use crate::types::TailoringEntry;

// =============================================================================
// Link representation
// =============================================================================

/// The string an entry's pattern is tested against: the resolved link
/// destination, or the link's visible text for engines whose hrefs are
/// redirect wrappers hiding the real destination.
pub fn link_representation<R: ResultHandle>(result: &R, treat_link_as_text: bool) -> Option<String> {
    if treat_link_as_text {
        result.link_text()
    } else {
        result.link_href()
    }
}

// =============================================================================
// Matcher
// =============================================================================

/// Patterns for an ordered rule set, compiled once per tailoring pass.
pub struct DomainMatcher {
    /// One slot per entry, in rule order. `None` for entries that can never
    /// match: empty domain lists and uncompilable fragments.
    patterns: Vec<Option<Regex>>,
}

impl DomainMatcher {
    /// Compiles patterns for the given rule set. `treat_link_as_text`
    /// selects the pattern shape: href matching requires the scheme
    /// separator, while link text carries bare destinations like
    /// `amazon.com/deal`, so the scheme prefix is optional there.
    pub fn new(entries: &[TailoringEntry], treat_link_as_text: bool) -> Self {
        Self {
            patterns: entries
                .iter()
                .map(|entry| entry_pattern(entry, treat_link_as_text))
                .collect(),
        }
    }

    /// Index of the first entry in rule order whose pattern matches the
    /// link representation. First match wins; rule order is the tie-break,
    /// never match length.
    pub fn first_match(&self, link: &str) -> Option<usize> {
        self.patterns
            .iter()
            .position(|pattern| pattern.as_ref().is_some_and(|p| p.is_match(link)))
    }
}

/// Builds the alternation pattern for one entry. Empty fragments are
/// dropped; an entry left with no fragments matches nothing and builds no
/// pattern at all.
fn entry_pattern(entry: &TailoringEntry, treat_link_as_text: bool) -> Option<Regex> {
    let fragments: Vec<&str> = entry
        .domains
        .iter()
        .map(String::as_str)
        .filter(|fragment| !fragment.is_empty())
        .collect();

    if fragments.is_empty() {
        return None;
    }

    // "://" then anything, an optional extra character for a subdomain
    // separator, one of the fragments, then anything.
    let scheme = if treat_link_as_text { "(?:.*://)?" } else { ".*://" };
    let source = format!("{}.*.?(?:{}).*", scheme, fragments.join("|"));

    match Regex::new(&source) {
        Ok(pattern) => Some(pattern),
        Err(err) => {
            log::warn!("entry {:?} has unusable domains: {err}", entry.id);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::mem::{MemPage, MemResult};
    use crate::page::SearchPage;

    fn entry(id: &str, domains: &[&str]) -> TailoringEntry {
        TailoringEntry::with_domains(id, domains)
    }

    #[test]
    fn test_matches_domain_after_scheme() {
        let entries = vec![entry("a", &["wikipedia.org"])];
        let matcher = DomainMatcher::new(&entries, false);

        assert_eq!(matcher.first_match("https://en.wikipedia.org/wiki/Rust"), Some(0));
        assert_eq!(matcher.first_match("https://wikipedia.org/"), Some(0));
        assert_eq!(matcher.first_match("https://example.com/"), None);
        // Href matching requires the scheme separator.
        assert_eq!(matcher.first_match("wikipedia.org"), None);
    }

    #[test]
    fn test_first_entry_in_order_wins() {
        let entries = vec![
            entry("r1", &["example.com"]),
            entry("r2", &["example.com", "other.com"]),
        ];
        let matcher = DomainMatcher::new(&entries, false);

        assert_eq!(matcher.first_match("https://example.com/x"), Some(0));
        assert_eq!(matcher.first_match("https://other.com/x"), Some(1));
    }

    #[test]
    fn test_empty_domain_list_matches_nothing() {
        let entries = vec![entry("empty", &[]), entry("b", &["example.com"])];
        let matcher = DomainMatcher::new(&entries, false);

        assert_eq!(matcher.first_match("https://example.com/"), Some(1));
        assert_eq!(matcher.first_match("https://anything.test/"), None);
    }

    #[test]
    fn test_blank_fragments_are_dropped_not_wildcarded() {
        // A stray empty fragment must not turn the alternation into a
        // match-everything pattern.
        let entries = vec![entry("a", &["", "example.com", ""])];
        let matcher = DomainMatcher::new(&entries, false);

        assert_eq!(matcher.first_match("https://example.com/"), Some(0));
        assert_eq!(matcher.first_match("https://unrelated.test/"), None);

        let all_blank = vec![entry("b", &["", ""])];
        assert_eq!(
            DomainMatcher::new(&all_blank, false).first_match("https://x.test/"),
            None
        );
    }

    #[test]
    fn test_substring_false_positive_is_preserved() {
        // The loose test matches fragments anywhere after the scheme; this
        // is the documented limitation and must not be "fixed" into strict
        // hostname matching.
        let entries = vec![entry("art", &["art.com"])];
        let matcher = DomainMatcher::new(&entries, false);
        assert_eq!(matcher.first_match("https://example.com/start.com-page"), Some(0));
    }

    #[test]
    fn test_uncompilable_fragments_never_match() {
        let entries = vec![entry("broken", &["("]), entry("ok", &["example.com"])];
        let matcher = DomainMatcher::new(&entries, false);
        assert_eq!(matcher.first_match("https://example.com/("), Some(1));
    }

    #[test]
    fn test_text_mode_matches_bare_destinations() {
        let entries = vec![entry("amazon", &["amazon.com"])];

        let text_matcher = DomainMatcher::new(&entries, true);
        assert_eq!(text_matcher.first_match("amazon.com/deal"), Some(0));
        assert_eq!(text_matcher.first_match("https://www.amazon.com/deal"), Some(0));
        assert_eq!(text_matcher.first_match("example.com/deal"), None);

        // The wrapper href would not have matched either way.
        let href_matcher = DomainMatcher::new(&entries, false);
        assert_eq!(href_matcher.first_match("https://redirect.example/?u=xyz"), None);
    }

    #[test]
    fn test_link_representation_prefers_text_when_flagged() {
        let page = MemPage::new(vec![MemResult::with_text(
            "https://redirect.example/?u=xyz",
            "amazon.com/deal",
        )]);
        let results = page.results();
        let result = &results[0];

        assert_eq!(
            link_representation(result, false).as_deref(),
            Some("https://redirect.example/?u=xyz")
        );
        assert_eq!(
            link_representation(result, true).as_deref(),
            Some("amazon.com/deal")
        );
    }

    #[test]
    fn test_linkless_result_has_no_representation() {
        let page = MemPage::new(vec![MemResult::default()]);
        let results = page.results();
        let result = &results[0];
        assert_eq!(link_representation(result, false), None);
        assert_eq!(link_representation(result, true), None);
    }
}
