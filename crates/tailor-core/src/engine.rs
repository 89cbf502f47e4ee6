//! The tailoring engine.
//!
//! Stateful core of the extension: tags matching results with their owning
//! entry's id, inserts treatment panels, and applies or clears the visual
//! treatment. The engine keeps nothing of its own beyond the rule set it
//! was handed; everything visible is re-derived from (page, entries) on
//! every pass, so any trigger can safely re-run it without coordination.

use crate::engines::SearchEngineDescriptor;
use crate::matcher::{link_representation, DomainMatcher};
use crate::page::{PanelMark, ResultHandle, SearchPage};
use crate::types::{TailoringEntry, Treatment};

pub struct TailoringEngine {
    descriptor: SearchEngineDescriptor,
    entries: Vec<TailoringEntry>,
}

impl TailoringEngine {
    pub fn new(descriptor: SearchEngineDescriptor, entries: Vec<TailoringEntry>) -> Self {
        Self {
            descriptor,
            entries,
        }
    }

    pub fn descriptor(&self) -> &SearchEngineDescriptor {
        &self.descriptor
    }

    pub fn entries(&self) -> &[TailoringEntry] {
        &self.entries
    }

    /// Replaces the cached rule set. Called when a change notification
    /// arrives with freshly read settings.
    pub fn set_entries(&mut self, entries: Vec<TailoringEntry>) {
        self.entries = entries;
    }

    /// Tailors every result on the page. `scope` limits the pass to the
    /// listed entry ids (a patch update after a single-entry edit); `None`
    /// re-tailors everything. Running this twice in a row with the same
    /// rules and page leaves the page byte-identical after the first run.
    pub fn tailor<P: SearchPage>(&self, page: &P, scope: Option<&[String]>) {
        let matcher = DomainMatcher::new(&self.entries, self.descriptor.treat_link_as_text);
        log::debug!(
            "tailoring {} entries on {:?} (scope: {:?})",
            self.entries.len(),
            self.descriptor.id,
            scope
        );

        self.tag_results(page, &matcher, scope);
        self.insert_panels(page);
        self.apply_treatments(page, scope);
    }

    /// Removes every applied treatment. Used when the user disables the
    /// identified engine.
    pub fn clear<P: SearchPage>(&self, page: &P) {
        for result in page.tagged_results() {
            remove_treatment(&result);
        }
    }

    /// Tag phase: stamp each result with the id of the entry that owns it.
    ///
    /// Evaluation is result-by-result against the full ordered rule list,
    /// never rule-by-rule, so first-match precedence holds even when the
    /// pass is scoped. A scoped pass only ever sets or clears tags for the
    /// listed entries: the owner is still resolved against the whole list,
    /// so a scoped entry can never steal a result that an entry earlier in
    /// rule order already claims.
    fn tag_results<P: SearchPage>(
        &self,
        page: &P,
        matcher: &DomainMatcher,
        scope: Option<&[String]>,
    ) {
        for result in page.results() {
            // A result with no link element never matches and is skipped.
            let link = link_representation(&result, self.descriptor.treat_link_as_text);
            let owner = link
                .as_deref()
                .and_then(|link| matcher.first_match(link))
                .map(|index| &self.entries[index]);
            let current = result.entry_id();

            match scope {
                None => match owner {
                    Some(entry) => result.set_entry_id(&entry.id),
                    None => {
                        // No longer matches anything; blank the tag so the
                        // apply phase prunes the leftover treatment.
                        if current.is_some_and(|tag| !tag.is_empty()) {
                            result.set_entry_id("");
                        }
                    }
                },
                Some(ids) => match owner {
                    Some(entry) if contains_id(ids, &entry.id) => result.set_entry_id(&entry.id),
                    _ => {
                        // Owned by nothing, or by an entry outside the
                        // scope. Release only claims held by scoped
                        // entries; everything else is untouched.
                        if current.is_some_and(|tag| !tag.is_empty() && contains_id(ids, &tag)) {
                            result.set_entry_id("");
                        }
                    }
                },
            }
        }
    }

    /// Panel phase: every tagged result gets a treatment panel as its first
    /// child if it lacks one.
    fn insert_panels<P: SearchPage>(&self, page: &P) {
        let mark = if self.descriptor.style_via_attribute {
            PanelMark::DataAttribute
        } else {
            PanelMark::Class
        };

        for result in page.tagged_results() {
            if result.entry_id().is_some_and(|tag| !tag.is_empty()) && !result.has_panel() {
                result.insert_panel(mark);
            }
        }
    }

    /// Apply phase: resolve each tagged result's owning entry and paint its
    /// treatment. Tags that resolve to no live entry (blanked in the tag
    /// phase, or referencing a deleted entry) are fully pruned.
    fn apply_treatments<P: SearchPage>(&self, page: &P, scope: Option<&[String]>) {
        for result in page.tagged_results() {
            let tag = result.entry_id().unwrap_or_default();
            let entry = if tag.is_empty() {
                None
            } else {
                self.entries.iter().find(|entry| entry.id == tag)
            };

            if let Some(ids) = scope {
                // Results owned by live entries outside the scope stay
                // untouched; stale tags are always pruned.
                if entry.is_some() && !contains_id(ids, &tag) {
                    continue;
                }
            }

            match entry {
                Some(entry) => apply_treatment(&result, &entry.treatment),
                None => remove_treatment(&result),
            }
        }
    }
}

fn contains_id(ids: &[String], id: &str) -> bool {
    ids.iter().any(|candidate| candidate == id)
}

fn apply_treatment<R: ResultHandle>(result: &R, treatment: &Treatment) {
    // Fully screened results leave layout entirely; panel colors are
    // irrelevant underneath.
    if treatment.opacity == 0.0 {
        result.set_suppressed(true);
        return;
    }

    result.set_suppressed(false);
    result.set_opacity(treatment.opacity);
    result.set_panel_colors(&treatment.background_color, &treatment.border_color);
}

fn remove_treatment<R: ResultHandle>(result: &R) {
    result.remove_entry_id();
    result.clear_opacity();
    result.set_suppressed(false);
    result.remove_panel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::EngineRegistry;
    use crate::page::mem::{MemPage, MemResult};

    fn descriptor(id: &str) -> SearchEngineDescriptor {
        EngineRegistry::builtin()
            .engines()
            .iter()
            .find(|engine| engine.id == id)
            .expect("builtin engine exists")
            .clone()
    }

    fn entry(id: &str, domains: &[&str]) -> TailoringEntry {
        TailoringEntry::with_domains(id, domains)
    }

    fn entry_with_opacity(id: &str, domains: &[&str], opacity: f64) -> TailoringEntry {
        let mut entry = TailoringEntry::with_domains(id, domains);
        entry.treatment.opacity = opacity;
        entry
    }

    #[test]
    fn test_end_to_end_wikipedia_scenario() {
        let engine = TailoringEngine::new(
            descriptor("google"),
            vec![entry("a", &["wikipedia.org"])],
        );
        let page = MemPage::from_hrefs(&[
            "https://en.wikipedia.org/wiki/X",
            "https://example.com",
            "https://wikipedia.org/Y",
        ]);

        engine.tailor(&page, None);

        let state = page.snapshot();
        for index in [0, 2] {
            assert_eq!(state[index].entry_id.as_deref(), Some("a"));
            assert_eq!(state[index].panel, Some(PanelMark::Class));
            assert_eq!(
                state[index].panel_background.as_deref(),
                Some("hsla(120,60%,85%,1)")
            );
            assert_eq!(
                state[index].panel_border.as_deref(),
                Some("hsla(120,50%,60%,1)")
            );
            assert_eq!(state[index].opacity, Some(1.0));
            assert!(!state[index].suppressed);
        }
        assert_eq!(state[1], MemResult::linking("https://example.com"));
    }

    #[test]
    fn test_tailor_is_idempotent() {
        let engine = TailoringEngine::new(
            descriptor("google"),
            vec![
                entry_with_opacity("dim", &["example.com"], 0.5),
                entry_with_opacity("hide", &["spam.test"], 0.0),
            ],
        );
        let page = MemPage::from_hrefs(&[
            "https://example.com/a",
            "https://spam.test/b",
            "https://unrelated.test/c",
        ]);

        engine.tailor(&page, None);
        let first = page.snapshot();
        engine.tailor(&page, None);
        assert_eq!(page.snapshot(), first);
        engine.tailor(&page, None);
        assert_eq!(page.snapshot(), first);
    }

    #[test]
    fn test_first_match_precedence_over_later_rules() {
        let engine = TailoringEngine::new(
            descriptor("google"),
            vec![
                entry("r1", &["example.com"]),
                entry("r2", &["example.com", "other.com"]),
            ],
        );
        let page = MemPage::from_hrefs(&["https://example.com/x"]);

        engine.tailor(&page, None);
        assert_eq!(page.snapshot()[0].entry_id.as_deref(), Some("r1"));
    }

    #[test]
    fn test_empty_domain_entry_tags_nothing() {
        let engine = TailoringEngine::new(descriptor("google"), vec![entry("empty", &[])]);
        let page = MemPage::from_hrefs(&["https://example.com/x"]);

        engine.tailor(&page, None);
        assert_eq!(page.snapshot()[0].entry_id, None);
        assert_eq!(page.snapshot()[0].panel, None);
    }

    #[test]
    fn test_opacity_zero_suppresses_instead_of_dimming() {
        let engine = TailoringEngine::new(
            descriptor("google"),
            vec![
                entry_with_opacity("hide", &["spam.test"], 0.0),
                entry_with_opacity("dim", &["example.com"], 0.5),
            ],
        );
        let page = MemPage::from_hrefs(&["https://spam.test/a", "https://example.com/b"]);

        engine.tailor(&page, None);

        let state = page.snapshot();
        assert!(state[0].suppressed);
        // Colors are not painted under a suppressed result.
        assert_eq!(state[0].panel_background, None);

        assert!(!state[1].suppressed);
        assert_eq!(state[1].opacity, Some(0.5));
        assert!(state[1].panel_background.is_some());
    }

    #[test]
    fn test_stale_tags_are_pruned_after_entry_deletion() {
        let mut engine = TailoringEngine::new(
            descriptor("google"),
            vec![entry_with_opacity("doomed", &["example.com"], 0.5)],
        );
        let page = MemPage::from_hrefs(&["https://example.com/x"]);

        engine.tailor(&page, None);
        assert_eq!(page.snapshot()[0].entry_id.as_deref(), Some("doomed"));

        engine.set_entries(Vec::new());
        engine.tailor(&page, None);

        let snapshot = page.snapshot();
        let state = &snapshot[0];
        assert_eq!(state.entry_id, None);
        assert_eq!(state.opacity, None);
        assert_eq!(state.panel, None);
        assert!(!state.suppressed);
    }

    #[test]
    fn test_scoped_update_leaves_other_entries_untouched() {
        let mut engine = TailoringEngine::new(
            descriptor("google"),
            vec![
                entry("x", &["example.com"]),
                entry("y", &["other.com"]),
            ],
        );
        let page = MemPage::from_hrefs(&["https://example.com/a", "https://other.com/b"]);
        engine.tailor(&page, None);
        let before = page.snapshot();

        // Recolor entry x only, then patch-update it.
        let mut entries = engine.entries().to_vec();
        entries[0].treatment.background_color = "hsla(0,80%,50%,1)".to_string();
        engine.set_entries(entries);
        engine.tailor(&page, Some(&["x".to_string()]));

        let after = page.snapshot();
        assert_eq!(
            after[0].panel_background.as_deref(),
            Some("hsla(0,80%,50%,1)")
        );
        // The result owned by y is byte-identical.
        assert_eq!(after[1], before[1]);
    }

    #[test]
    fn test_scoped_update_never_steals_from_higher_precedence_entry() {
        let mut engine = TailoringEngine::new(
            descriptor("google"),
            vec![
                entry("first", &["example.com"]),
                entry("second", &["nothing.test"]),
            ],
        );
        let page = MemPage::from_hrefs(&["https://example.com/x"]);
        engine.tailor(&page, None);
        assert_eq!(page.snapshot()[0].entry_id.as_deref(), Some("first"));

        // The lower-precedence entry now also matches; a patch update for
        // it alone must not take over the result.
        let mut entries = engine.entries().to_vec();
        entries[1].domains = vec!["example.com".to_string()];
        engine.set_entries(entries);
        engine.tailor(&page, Some(&["second".to_string()]));

        assert_eq!(page.snapshot()[0].entry_id.as_deref(), Some("first"));
    }

    #[test]
    fn test_scoped_update_releases_a_no_longer_matching_claim() {
        let mut engine = TailoringEngine::new(
            descriptor("google"),
            vec![entry_with_opacity("x", &["example.com"], 0.5)],
        );
        let page = MemPage::from_hrefs(&["https://example.com/a"]);
        engine.tailor(&page, None);
        assert_eq!(page.snapshot()[0].entry_id.as_deref(), Some("x"));

        // The entry's domains change away from this result.
        let mut entries = engine.entries().to_vec();
        entries[0].domains = vec!["elsewhere.test".to_string()];
        engine.set_entries(entries);
        engine.tailor(&page, Some(&["x".to_string()]));

        let snapshot = page.snapshot();
        let state = &snapshot[0];
        assert_eq!(state.entry_id, None);
        assert_eq!(state.opacity, None);
        assert_eq!(state.panel, None);
    }

    #[test]
    fn test_link_text_engines_match_on_text() {
        let engine = TailoringEngine::new(
            descriptor("yahoo"),
            vec![entry("amazon", &["amazon.com"])],
        );
        let page = MemPage::new(vec![
            MemResult::with_text("https://redirect.example/?u=xyz", "amazon.com/deal"),
            MemResult::with_text("https://redirect.example/?u=abc", "example.com/page"),
        ]);

        engine.tailor(&page, None);

        let state = page.snapshot();
        assert_eq!(state[0].entry_id.as_deref(), Some("amazon"));
        assert_eq!(state[1].entry_id, None);
    }

    #[test]
    fn test_style_via_attribute_marks_panels_with_data_attribute() {
        let engine = TailoringEngine::new(
            descriptor("bing"),
            vec![entry("a", &["example.com"])],
        );
        let page = MemPage::from_hrefs(&["https://example.com/x"]);

        engine.tailor(&page, None);
        assert_eq!(page.snapshot()[0].panel, Some(PanelMark::DataAttribute));
    }

    #[test]
    fn test_linkless_results_are_skipped_not_fatal() {
        let engine = TailoringEngine::new(
            descriptor("google"),
            vec![entry("a", &["example.com"])],
        );
        let page = MemPage::new(vec![
            MemResult::default(),
            MemResult::linking("https://example.com/x"),
        ]);

        engine.tailor(&page, None);

        let state = page.snapshot();
        assert_eq!(state[0].entry_id, None);
        assert_eq!(state[1].entry_id.as_deref(), Some("a"));
    }

    #[test]
    fn test_empty_page_is_a_no_op() {
        let engine = TailoringEngine::new(
            descriptor("google"),
            vec![entry("a", &["example.com"])],
        );
        let page = MemPage::default();
        engine.tailor(&page, None);
        assert!(page.is_empty());
    }

    #[test]
    fn test_results_added_later_are_tailored_by_the_next_pass() {
        // Models the mutation watcher's behavior: each batch of container
        // mutations re-runs a full pass.
        let engine = TailoringEngine::new(
            descriptor("duckduckgo"),
            vec![entry("a", &["wikipedia.org"])],
        );
        let page = MemPage::from_hrefs(&["https://en.wikipedia.org/wiki/X"]);
        engine.tailor(&page, None);

        page.push(MemResult::linking("https://de.wikipedia.org/wiki/Y"));
        page.push(MemResult::linking("https://example.com"));
        engine.tailor(&page, None);

        let state = page.snapshot();
        assert_eq!(state[0].entry_id.as_deref(), Some("a"));
        assert_eq!(state[1].entry_id.as_deref(), Some("a"));
        assert_eq!(state[2].entry_id, None);
    }

    #[test]
    fn test_rule_edit_moves_ownership_on_full_pass() {
        let mut engine = TailoringEngine::new(
            descriptor("google"),
            vec![entry("a", &["example.com"]), entry("b", &["example.com"])],
        );
        let page = MemPage::from_hrefs(&["https://example.com/x"]);
        engine.tailor(&page, None);
        assert_eq!(page.snapshot()[0].entry_id.as_deref(), Some("a"));

        // First entry stops matching; the next full pass hands the result
        // to the later entry.
        let mut entries = engine.entries().to_vec();
        entries[0].domains = vec!["elsewhere.test".to_string()];
        engine.set_entries(entries);
        engine.tailor(&page, None);
        assert_eq!(page.snapshot()[0].entry_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_clear_removes_all_treatments() {
        let engine = TailoringEngine::new(
            descriptor("google"),
            vec![
                entry_with_opacity("hide", &["spam.test"], 0.0),
                entry("keep", &["example.com"]),
            ],
        );
        let page = MemPage::from_hrefs(&["https://spam.test/a", "https://example.com/b"]);
        engine.tailor(&page, None);
        engine.clear(&page);

        for state in page.snapshot() {
            assert_eq!(state.entry_id, None);
            assert_eq!(state.panel, None);
            assert_eq!(state.opacity, None);
            assert!(!state.suppressed);
        }
    }

    #[test]
    fn test_unhiding_after_opacity_change() {
        // A hidden result must come back once its entry's opacity rises.
        let mut engine = TailoringEngine::new(
            descriptor("google"),
            vec![entry_with_opacity("x", &["example.com"], 0.0)],
        );
        let page = MemPage::from_hrefs(&["https://example.com/a"]);
        engine.tailor(&page, None);
        assert!(page.snapshot()[0].suppressed);

        let mut entries = engine.entries().to_vec();
        entries[0].treatment.opacity = 0.7;
        engine.set_entries(entries);
        engine.tailor(&page, Some(&["x".to_string()]));

        let snapshot = page.snapshot();
        let state = &snapshot[0];
        assert!(!state.suppressed);
        assert_eq!(state.opacity, Some(0.7));
    }
}
