//! Core type definitions for the tailoring engine.
//!
//! These types mirror the persisted storage format (camelCase JSON keys)
//! and are shared by the engine, the wasm bindings, and the CLI.

use serde::{Deserialize, Serialize};

// =============================================================================
// Treatment
// =============================================================================

/// Visual treatment applied to search results owned by a tailoring entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Treatment {
    /// HSLA color string painted onto the treatment panel background.
    pub background_color: String,
    /// HSLA color string painted onto the treatment panel border.
    pub border_color: String,
    /// Result opacity in [0, 1]. Exactly 0 removes the result from layout
    /// entirely rather than leaving a transparent, focusable ghost.
    pub opacity: f64,
}

impl Default for Treatment {
    /// The treatment given to freshly created entries.
    fn default() -> Self {
        Self {
            background_color: "hsla(120,60%,85%,1)".to_string(),
            border_color: "hsla(120,50%,60%,1)".to_string(),
            opacity: 1.0,
        }
    }
}

// =============================================================================
// Tailoring Entry
// =============================================================================

/// A user-defined rule mapping domain fragments to a visual treatment.
///
/// The id is the sole correlation key between page state and rule state: a
/// tailored result carries its owning entry's id in a data attribute and
/// nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct TailoringEntry {
    /// Opaque unique id, stable for the entry's lifetime.
    pub id: String,
    /// Domain fragments to match against result links. Order only matters
    /// for display; an empty list matches nothing.
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub treatment: Treatment,
}

impl TailoringEntry {
    /// Creates an entry with no domains and the default treatment, the shape
    /// the settings UI starts from.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            domains: Vec::new(),
            treatment: Treatment::default(),
        }
    }

    /// Convenience constructor for tools and tests.
    pub fn with_domains(id: impl Into<String>, domains: &[&str]) -> Self {
        Self {
            id: id.into(),
            domains: domains.iter().map(|domain| domain.to_string()).collect(),
            treatment: Treatment::default(),
        }
    }
}

// =============================================================================
// Entry Ids
// =============================================================================

/// Span of the random suffix in generated entry ids.
pub const ENTRY_ID_RANDOM_SPAN: u32 = 100_000;

/// Formats a new entry id from a millisecond timestamp and a random value.
///
/// Id generation is pure; callers supply the clock and the randomness
/// (`js_sys::Date`/`Math.random` in the wasm crate, `SystemTime`/`rand` in
/// the CLI).
pub fn entry_id_from_parts(timestamp_ms: u64, random: u32) -> String {
    format!("{}-{}", timestamp_ms, random % ENTRY_ID_RANDOM_SPAN)
}
