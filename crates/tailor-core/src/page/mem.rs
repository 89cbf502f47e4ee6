//! In-memory results page.
//!
//! Backs the engine's unit tests and the CLI simulator. A result stores
//! exactly what the DOM contract stores (tag attribute, panel presence and
//! colors, inline opacity, display override), so assertions on a
//! [`MemResult`] snapshot are assertions on the DOM contract.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::{PanelMark, ResultHandle, SearchPage};

/// The primary link of an in-memory result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MemLink {
    pub href: String,
    pub text: String,
}

/// One in-memory search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MemResult {
    /// `None` models a result whose link element is missing.
    pub link: Option<MemLink>,
    pub entry_id: Option<String>,
    pub panel: Option<PanelMark>,
    pub panel_background: Option<String>,
    pub panel_border: Option<String>,
    pub opacity: Option<f64>,
    pub suppressed: bool,
}

impl MemResult {
    /// A result linking to the given destination.
    pub fn linking(href: &str) -> Self {
        Self {
            link: Some(MemLink {
                href: href.to_string(),
                text: href.to_string(),
            }),
            ..Self::default()
        }
    }

    /// A result whose link text differs from its href, as on engines that
    /// wrap destinations in redirects.
    pub fn with_text(href: &str, text: &str) -> Self {
        Self {
            link: Some(MemLink {
                href: href.to_string(),
                text: text.to_string(),
            }),
            ..Self::default()
        }
    }
}

/// An in-memory results container.
#[derive(Debug, Clone, Default)]
pub struct MemPage {
    results: Rc<RefCell<Vec<MemResult>>>,
}

impl MemPage {
    pub fn new(results: Vec<MemResult>) -> Self {
        Self {
            results: Rc::new(RefCell::new(results)),
        }
    }

    pub fn from_hrefs(hrefs: &[&str]) -> Self {
        Self::new(hrefs.iter().map(|href| MemResult::linking(href)).collect())
    }

    /// Appends a result, as an infinite-scroll engine would.
    pub fn push(&self, result: MemResult) {
        self.results.borrow_mut().push(result);
    }

    pub fn len(&self) -> usize {
        self.results.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.borrow().is_empty()
    }

    /// A copy of the current result states, for assertions and output.
    pub fn snapshot(&self) -> Vec<MemResult> {
        self.results.borrow().clone()
    }
}

/// Handle onto one slot of a [`MemPage`].
pub struct MemResultHandle {
    results: Rc<RefCell<Vec<MemResult>>>,
    index: usize,
}

impl MemResultHandle {
    fn read<T>(&self, f: impl FnOnce(&MemResult) -> T) -> T {
        f(&self.results.borrow()[self.index])
    }

    fn write(&self, f: impl FnOnce(&mut MemResult)) {
        f(&mut self.results.borrow_mut()[self.index]);
    }
}

impl ResultHandle for MemResultHandle {
    fn link_href(&self) -> Option<String> {
        self.read(|result| result.link.as_ref().map(|link| link.href.clone()))
    }

    fn link_text(&self) -> Option<String> {
        self.read(|result| result.link.as_ref().map(|link| link.text.clone()))
    }

    fn entry_id(&self) -> Option<String> {
        self.read(|result| result.entry_id.clone())
    }

    fn set_entry_id(&self, id: &str) {
        self.write(|result| result.entry_id = Some(id.to_string()));
    }

    fn remove_entry_id(&self) {
        self.write(|result| result.entry_id = None);
    }

    fn has_panel(&self) -> bool {
        self.read(|result| result.panel.is_some())
    }

    fn insert_panel(&self, mark: PanelMark) {
        self.write(|result| result.panel = Some(mark));
    }

    fn remove_panel(&self) {
        self.write(|result| {
            result.panel = None;
            result.panel_background = None;
            result.panel_border = None;
        });
    }

    fn set_panel_colors(&self, background: &str, border: &str) {
        self.write(|result| {
            if result.panel.is_some() {
                result.panel_background = Some(background.to_string());
                result.panel_border = Some(border.to_string());
            }
        });
    }

    fn set_opacity(&self, opacity: f64) {
        self.write(|result| result.opacity = Some(opacity));
    }

    fn clear_opacity(&self) {
        self.write(|result| result.opacity = None);
    }

    fn set_suppressed(&self, suppressed: bool) {
        self.write(|result| result.suppressed = suppressed);
    }
}

impl SearchPage for MemPage {
    type Result = MemResultHandle;

    fn results(&self) -> Vec<Self::Result> {
        (0..self.results.borrow().len())
            .map(|index| MemResultHandle {
                results: Rc::clone(&self.results),
                index,
            })
            .collect()
    }

    fn tagged_results(&self) -> Vec<Self::Result> {
        self.results
            .borrow()
            .iter()
            .enumerate()
            .filter(|(_, result)| result.entry_id.is_some())
            .map(|(index, _)| MemResultHandle {
                results: Rc::clone(&self.results),
                index,
            })
            .collect()
    }
}
