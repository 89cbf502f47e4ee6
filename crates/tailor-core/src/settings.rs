//! Persisted user settings.
//!
//! Storage itself is an external collaborator: a synced key-value store
//! read asynchronously by the extension glue. This module owns the JSON
//! shape, the defaults seeded for first-run users, and the structural
//! validation run on imported settings files. Each page context keeps its
//! own copy of this data and refreshes it on change notifications; there is
//! no shared mutable state across tabs.

use serde::{Deserialize, Serialize};

use crate::color::Hsla;
use crate::engines::EngineRegistry;
use crate::types::{TailoringEntry, Treatment};

/// Storage key holding the ordered tailoring entry list.
pub const KEY_TAILORING_ENTRIES: &str = "tailoringEntries";
/// Storage key holding per-engine enablement.
pub const KEY_SEARCH_ENGINES: &str = "searchEngines";
/// Storage key holding the settings UI's color preview backdrop.
pub const KEY_COLOR_HINT_BACKGROUND: &str = "colorHintBackground";

/// Id of the entry seeded for users with no stored settings.
pub const DEFAULT_ENTRY_ID: &str = "1577836800000-00001";

/// Error reading a settings document.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("malformed settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

// =============================================================================
// User data
// =============================================================================

/// Per-engine user preference. The descriptor says what an engine is; this
/// says whether the user wants it tailored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct SearchEnginePreference {
    pub id: String,
    pub label: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Everything the extension persists, as one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase", default)]
pub struct UserData {
    pub tailoring_entries: Vec<TailoringEntry>,
    pub search_engines: Vec<SearchEnginePreference>,
    /// Backdrop color behind the settings UI's treatment previews.
    pub color_hint_background: String,
}

impl Default for UserData {
    /// The data seeded for users with no preexisting settings: one
    /// wikipedia.org entry with the default green treatment, every engine
    /// enabled.
    fn default() -> Self {
        Self {
            tailoring_entries: vec![TailoringEntry {
                id: DEFAULT_ENTRY_ID.to_string(),
                domains: vec!["wikipedia.org".to_string()],
                treatment: Treatment::default(),
            }],
            search_engines: vec![
                engine_pref("google", "Google"),
                engine_pref("duckduckgo", "DuckDuckGo"),
                engine_pref("bing", "Bing"),
                engine_pref("yahoo", "Yahoo!"),
            ],
            color_hint_background: "hsla(0,0%,100%,1)".to_string(),
        }
    }
}

fn engine_pref(id: &str, label: &str) -> SearchEnginePreference {
    SearchEnginePreference {
        id: id.to_string(),
        label: label.to_string(),
        enabled: true,
    }
}

impl UserData {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parses stored settings, degrading to the defaults when the storage
    /// read failed or produced garbage. The page falls back to default
    /// behavior rather than freezing on stale state.
    pub fn from_json_or_default(json: Option<&str>) -> Self {
        match json {
            Some(json) => Self::from_json(json).unwrap_or_else(|err| {
                log::warn!("stored settings unreadable, using defaults: {err}");
                Self::default()
            }),
            None => {
                log::warn!("no stored settings available, using defaults");
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn entry(&self, id: &str) -> Option<&TailoringEntry> {
        self.tailoring_entries.iter().find(|entry| entry.id == id)
    }

    /// Whether the user wants the given engine tailored. Engines with no
    /// stored preference default to enabled.
    pub fn engine_enabled(&self, engine_id: &str) -> bool {
        self.search_engines
            .iter()
            .find(|pref| pref.id == engine_id)
            .map_or(true, |pref| pref.enabled)
    }

    /// Structural checks for imported settings. Issues are reported, never
    /// auto-fixed.
    pub fn validate(&self, registry: &EngineRegistry) -> Vec<SettingsIssue> {
        let mut issues = Vec::new();

        for (index, entry) in self.tailoring_entries.iter().enumerate() {
            if entry.id.is_empty() {
                issues.push(SettingsIssue::EmptyEntryId { index });
                continue;
            }
            if self.tailoring_entries[..index]
                .iter()
                .any(|earlier| earlier.id == entry.id)
            {
                issues.push(SettingsIssue::DuplicateEntryId {
                    id: entry.id.clone(),
                });
            }

            let opacity = entry.treatment.opacity;
            if !(0.0..=1.0).contains(&opacity) || opacity.is_nan() {
                issues.push(SettingsIssue::OpacityOutOfRange {
                    id: entry.id.clone(),
                    opacity,
                });
            }

            for (field, value) in [
                ("background", &entry.treatment.background_color),
                ("border", &entry.treatment.border_color),
            ] {
                if value.parse::<Hsla>().is_err() {
                    issues.push(SettingsIssue::UnparseableColor {
                        id: entry.id.clone(),
                        field,
                        value: value.clone(),
                    });
                }
            }
        }

        for pref in &self.search_engines {
            if !registry.engines().iter().any(|engine| engine.id == pref.id) {
                issues.push(SettingsIssue::UnknownEngine {
                    id: pref.id.clone(),
                });
            }
        }

        issues
    }
}

/// One problem found while validating a settings document.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsIssue {
    #[error("entry #{index} has an empty id")]
    EmptyEntryId { index: usize },
    #[error("entry id {id:?} appears more than once")]
    DuplicateEntryId { id: String },
    #[error("entry {id:?}: opacity {opacity} is outside [0, 1]")]
    OpacityOutOfRange { id: String, opacity: f64 },
    #[error("entry {id:?}: {field} color {value:?} is not an hsla() string")]
    UnparseableColor {
        id: String,
        field: &'static str,
        value: String,
    },
    #[error("engine preference {id:?} matches no known engine")]
    UnknownEngine { id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_seed_wikipedia_and_all_engines() {
        let data = UserData::default();
        assert_eq!(data.tailoring_entries.len(), 1);
        assert_eq!(data.tailoring_entries[0].id, DEFAULT_ENTRY_ID);
        assert_eq!(
            data.tailoring_entries[0].domains,
            vec!["wikipedia.org".to_string()]
        );
        assert_eq!(data.search_engines.len(), 4);
        assert!(data.search_engines.iter().all(|pref| pref.enabled));
        assert!(data.validate(&EngineRegistry::builtin()).is_empty());
    }

    #[test]
    fn test_round_trip_preserves_camel_case_keys() {
        let data = UserData::default();
        let json = data.to_json().expect("serializes");
        assert!(json.contains("\"tailoringEntries\""));
        assert!(json.contains("\"searchEngines\""));
        assert!(json.contains("\"colorHintBackground\""));
        assert_eq!(UserData::from_json(&json).expect("parses"), data);
    }

    #[test]
    fn test_missing_keys_fall_back_per_field() {
        let data = UserData::from_json("{}").expect("parses");
        assert_eq!(data, UserData::default());

        let data =
            UserData::from_json(r#"{"tailoringEntries":[]}"#).expect("parses");
        assert!(data.tailoring_entries.is_empty());
        assert_eq!(data.search_engines.len(), 4);
    }

    #[test]
    fn test_garbage_degrades_to_defaults() {
        assert_eq!(
            UserData::from_json_or_default(Some("{broken")),
            UserData::default()
        );
        assert_eq!(UserData::from_json_or_default(None), UserData::default());
    }

    #[test]
    fn test_unknown_engines_default_to_enabled() {
        let data = UserData::default();
        assert!(data.engine_enabled("not-a-known-engine"));
    }

    #[test]
    fn test_validate_flags_structural_problems() {
        let registry = EngineRegistry::builtin();
        let mut data = UserData::default();
        data.tailoring_entries.push(TailoringEntry {
            id: DEFAULT_ENTRY_ID.to_string(),
            domains: vec![],
            treatment: Treatment {
                background_color: "#00ff00".to_string(),
                border_color: "hsla(120,50%,60%,1)".to_string(),
                opacity: 1.5,
            },
        });
        data.search_engines.push(SearchEnginePreference {
            id: "altavista".to_string(),
            label: "AltaVista".to_string(),
            enabled: true,
        });

        let issues = data.validate(&registry);
        assert!(issues.contains(&SettingsIssue::DuplicateEntryId {
            id: DEFAULT_ENTRY_ID.to_string()
        }));
        assert!(issues.iter().any(|issue| matches!(
            issue,
            SettingsIssue::OpacityOutOfRange { .. }
        )));
        assert!(issues.iter().any(|issue| matches!(
            issue,
            SettingsIssue::UnparseableColor { field: "background", .. }
        )));
        assert!(issues.contains(&SettingsIssue::UnknownEngine {
            id: "altavista".to_string()
        }));
    }
}
