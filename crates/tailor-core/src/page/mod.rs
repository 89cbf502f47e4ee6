//! Page abstraction.
//!
//! The engine mutates a live results page only through these traits, and
//! stores all tailoring state in the page itself: the owning entry's id in
//! a data attribute, plus an injected treatment panel node. Nothing else
//! determines appearance, which is what lets every pass re-derive the full
//! picture and makes re-tailoring idempotent.
//!
//! [`mem`] provides the in-memory implementation used by tests and the CLI
//! simulator; the wasm crate adapts the real DOM.

use serde::{Deserialize, Serialize};

pub mod mem;

/// Data attribute carrying the owning entry id on a tailored result.
pub const ENTRY_ID_ATTR: &str = "data-tailoring-entry-id";
/// Class marking a treatment panel.
pub const PANEL_CLASS: &str = "treatment-panel";
/// Data attribute marking a treatment panel where classes get stripped.
pub const PANEL_ATTR: &str = "data-treatment-panel";
/// Selector matching a treatment panel under either marking.
pub const PANEL_SELECTOR: &str = ".treatment-panel, [data-treatment-panel]";
/// Data attribute stamped onto the page root naming the identified engine.
pub const TARGET_ATTR: &str = "data-tailoring-target";

/// How a treatment panel is marked for styling. Engines that strip class
/// attributes from injected nodes get the data-attribute marking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PanelMark {
    Class,
    DataAttribute,
}

/// One search result, identified by its position in the live container.
pub trait ResultHandle {
    /// Resolved destination of the result's primary link, if the link
    /// element exists.
    fn link_href(&self) -> Option<String>;

    /// Visible text of the result's primary link.
    fn link_text(&self) -> Option<String>;

    /// Current entry id tag. `Some("")` is a blanked tag awaiting pruning;
    /// `None` means the attribute is absent.
    fn entry_id(&self) -> Option<String>;

    fn set_entry_id(&self, id: &str);

    fn remove_entry_id(&self);

    fn has_panel(&self) -> bool;

    /// Inserts a treatment panel as the result's first child.
    fn insert_panel(&self, mark: PanelMark);

    fn remove_panel(&self);

    fn set_panel_colors(&self, background: &str, border: &str);

    /// Sets the result's inline opacity.
    fn set_opacity(&self, opacity: f64);

    /// Clears the inline opacity override.
    fn clear_opacity(&self);

    /// Removes the result from layout entirely (true) or clears the display
    /// override (false).
    fn set_suppressed(&self, suppressed: bool);
}

/// A search results page. Implementations resolve the engine descriptor's
/// selectors; a page with no results container simply yields no results.
pub trait SearchPage {
    type Result: ResultHandle;

    /// All result elements currently in the container, in page order.
    fn results(&self) -> Vec<Self::Result>;

    /// Results carrying the entry id attribute, blanked tags included.
    fn tagged_results(&self) -> Vec<Self::Result>;
}
