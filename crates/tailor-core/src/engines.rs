//! Search engine registry.
//!
//! Static configuration mapping each supported search engine to a page-URL
//! pattern, the selectors locating its results, and behavioral flags. One
//! descriptor is selected per page load; a page matching no descriptor is
//! untailorable and every downstream operation is skipped.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::settings::UserData;

// =============================================================================
// Descriptors
// =============================================================================

/// CSS selectors locating the pieces of a results page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selectors {
    /// The element containing the list of search results.
    pub result_container: String,
    /// One search result within the container.
    pub result: String,
    /// The result's primary link, relative to the result.
    pub result_link: String,
}

/// Per-engine configuration. Immutable at runtime; sourced from the built-in
/// table or from the remotely updatable config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEngineDescriptor {
    pub id: String,
    /// Regex tested against the full page URL.
    pub match_pattern: String,
    pub selectors: Selectors,
    /// Whether this engine loads results asynchronously, requiring a
    /// mutation watcher on the results container.
    #[serde(default)]
    pub observe: bool,
    /// Some engines strip class attributes from nodes injected into their
    /// results, so treatment panels are marked with a data attribute there.
    #[serde(default)]
    pub style_via_attribute: bool,
    /// Match against the link's visible text instead of its href, for
    /// engines that hide real destinations behind redirect wrappers.
    #[serde(default)]
    pub treat_link_as_text: bool,
}

// =============================================================================
// Registry
// =============================================================================

/// Error loading an engine configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("malformed engine config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("engine config contains no engines")]
    Empty,
}

/// Ordered collection of engine descriptors. Identification is first-match,
/// so order is part of the configuration.
#[derive(Debug, Clone)]
pub struct EngineRegistry {
    engines: Vec<SearchEngineDescriptor>,
}

impl EngineRegistry {
    pub fn new(engines: Vec<SearchEngineDescriptor>) -> Self {
        Self { engines }
    }

    /// The engines supported out of the box.
    pub fn builtin() -> Self {
        Self::new(vec![
            SearchEngineDescriptor {
                id: "google".to_string(),
                match_pattern: ".*://.*.?google.com/search.*".to_string(),
                selectors: Selectors {
                    result_container: "#search".to_string(),
                    result: ".rc".to_string(),
                    result_link: ".r > a".to_string(),
                },
                observe: false,
                style_via_attribute: false,
                treat_link_as_text: false,
            },
            SearchEngineDescriptor {
                id: "duckduckgo".to_string(),
                match_pattern: ".*://.*.?duckduckgo.com/.*".to_string(),
                selectors: Selectors {
                    result_container: ".results".to_string(),
                    result: ".result".to_string(),
                    result_link: ".result__a".to_string(),
                },
                observe: true,
                style_via_attribute: false,
                treat_link_as_text: false,
            },
            SearchEngineDescriptor {
                id: "bing".to_string(),
                match_pattern: ".*://.*.?bing.com/search.*".to_string(),
                selectors: Selectors {
                    result_container: "#b_results".to_string(),
                    result: ".b_algo".to_string(),
                    result_link: ".b_algo h2 a".to_string(),
                },
                observe: false,
                style_via_attribute: true,
                treat_link_as_text: false,
            },
            SearchEngineDescriptor {
                id: "yahoo".to_string(),
                match_pattern: ".*://search.yahoo.com/search.*".to_string(),
                selectors: Selectors {
                    result_container: "#web > ol".to_string(),
                    result: ".algo".to_string(),
                    result_link: ".algo .ac-algo".to_string(),
                },
                observe: false,
                style_via_attribute: false,
                // Yahoo hrefs are r.search.yahoo.com redirect wrappers; the
                // visible link text carries the real destination.
                treat_link_as_text: true,
            },
        ])
    }

    /// Loads descriptors from the remotely updatable config JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let engines: Vec<SearchEngineDescriptor> = serde_json::from_str(json)?;
        if engines.is_empty() {
            return Err(ConfigError::Empty);
        }
        Ok(Self::new(engines))
    }

    pub fn engines(&self) -> &[SearchEngineDescriptor] {
        &self.engines
    }

    /// Identifies the engine serving the given page, if any. First pattern
    /// match in registry order wins; a descriptor with an uncompilable
    /// pattern is skipped.
    pub fn identify(&self, page_url: &str) -> Option<&SearchEngineDescriptor> {
        self.engines.iter().find(|engine| {
            match Regex::new(&engine.match_pattern) {
                Ok(pattern) => pattern.is_match(page_url),
                Err(err) => {
                    log::warn!(
                        "engine {:?} has an uncompilable match pattern: {err}",
                        engine.id
                    );
                    false
                }
            }
        })
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// =============================================================================
// Status
// =============================================================================

/// What the engine may do on the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// The page matched no descriptor; tailoring is a silent no-op.
    Unsupported,
    /// A descriptor matched but the user disabled this engine. Existing
    /// treatments must be cleared and nothing new applied.
    Disabled,
    Enabled,
}

/// Resolves the status of the identified engine against user preferences.
/// Engines with no stored preference default to enabled.
pub fn engine_status(
    descriptor: Option<&SearchEngineDescriptor>,
    user_data: &UserData,
) -> EngineStatus {
    match descriptor {
        None => EngineStatus::Unsupported,
        Some(engine) => {
            if user_data.engine_enabled(&engine.id) {
                EngineStatus::Enabled
            } else {
                EngineStatus::Disabled
            }
        }
    }
}
