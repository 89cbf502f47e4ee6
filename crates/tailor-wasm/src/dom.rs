//! Live-DOM adapter.
//!
//! Implements the core page traits on top of `web-sys`. Absent pieces (a
//! missing results container, a result without a link, a non-HTML node
//! where one is expected) read as "nothing there" rather than as errors,
//! which is exactly what the engine's recovery rules want.

use wasm_bindgen::JsCast;
use web_sys::{CssStyleDeclaration, Document, Element, HtmlAnchorElement, HtmlElement};

use tailor_core::engines::Selectors;
use tailor_core::page::{
    PanelMark, ResultHandle, SearchPage, ENTRY_ID_ATTR, PANEL_ATTR, PANEL_CLASS, PANEL_SELECTOR,
    TARGET_ATTR,
};

/// Stamps the page root with the identified engine's id for styling hooks.
pub fn mark_page_target(document: &Document, engine_id: &str) {
    if let Some(root) = document.document_element() {
        let _ = root.set_attribute(TARGET_ATTR, engine_id);
    }
}

/// The results container of a live page, resolved from the descriptor's
/// selectors.
pub struct DomPage {
    container: Element,
    result_selector: String,
    link_selector: String,
}

impl DomPage {
    /// Locates the results container. `None` means there is nothing to
    /// tailor and every pass over this page is a no-op.
    pub fn locate(document: &Document, selectors: &Selectors) -> Option<Self> {
        let container = document
            .query_selector(&selectors.result_container)
            .ok()??;
        Some(Self {
            container,
            result_selector: selectors.result.clone(),
            link_selector: selectors.result_link.clone(),
        })
    }

    pub fn container(&self) -> &Element {
        &self.container
    }

    fn collect(&self, selector: &str) -> Vec<DomResult> {
        let mut results = Vec::new();
        if let Ok(nodes) = self.container.query_selector_all(selector) {
            for index in 0..nodes.length() {
                let element = nodes
                    .get(index)
                    .and_then(|node| node.dyn_into::<Element>().ok());
                if let Some(element) = element {
                    results.push(DomResult {
                        element,
                        link_selector: self.link_selector.clone(),
                    });
                }
            }
        }
        results
    }
}

impl SearchPage for DomPage {
    type Result = DomResult;

    fn results(&self) -> Vec<DomResult> {
        self.collect(&self.result_selector)
    }

    fn tagged_results(&self) -> Vec<DomResult> {
        self.collect(&format!("[{ENTRY_ID_ATTR}]"))
    }
}

/// One live result element.
pub struct DomResult {
    element: Element,
    link_selector: String,
}

impl DomResult {
    fn link_element(&self) -> Option<Element> {
        self.element.query_selector(&self.link_selector).ok().flatten()
    }

    fn panel_element(&self) -> Option<Element> {
        self.element.query_selector(PANEL_SELECTOR).ok().flatten()
    }

    fn style(&self) -> Option<CssStyleDeclaration> {
        self.element.dyn_ref::<HtmlElement>().map(|element| element.style())
    }
}

impl ResultHandle for DomResult {
    fn link_href(&self) -> Option<String> {
        let link = self.link_element()?;
        // The anchor property resolves relative hrefs against the page;
        // fall back to the raw attribute for non-anchor link elements.
        match link.dyn_ref::<HtmlAnchorElement>() {
            Some(anchor) => Some(anchor.href()),
            None => link.get_attribute("href"),
        }
    }

    fn link_text(&self) -> Option<String> {
        self.link_element()?.text_content()
    }

    fn entry_id(&self) -> Option<String> {
        self.element.get_attribute(ENTRY_ID_ATTR)
    }

    fn set_entry_id(&self, id: &str) {
        let _ = self.element.set_attribute(ENTRY_ID_ATTR, id);
    }

    fn remove_entry_id(&self) {
        let _ = self.element.remove_attribute(ENTRY_ID_ATTR);
    }

    fn has_panel(&self) -> bool {
        self.panel_element().is_some()
    }

    fn insert_panel(&self, mark: PanelMark) {
        let document = match self.element.owner_document() {
            Some(document) => document,
            None => return,
        };
        let panel = match document.create_element("div") {
            Ok(panel) => panel,
            Err(_) => return,
        };
        match mark {
            PanelMark::Class => {
                let _ = panel.class_list().add_1(PANEL_CLASS);
            }
            PanelMark::DataAttribute => {
                let _ = panel.set_attribute(PANEL_ATTR, "");
            }
        }
        let _ = self.element.insert_adjacent_element("afterbegin", &panel);
    }

    fn remove_panel(&self) {
        if let Some(panel) = self.panel_element() {
            panel.remove();
        }
    }

    fn set_panel_colors(&self, background: &str, border: &str) {
        let style = self
            .panel_element()
            .and_then(|panel| panel.dyn_into::<HtmlElement>().ok())
            .map(|panel| panel.style());
        if let Some(style) = style {
            let _ = style.set_property("background-color", background);
            let _ = style.set_property("border-color", border);
        }
    }

    fn set_opacity(&self, opacity: f64) {
        if let Some(style) = self.style() {
            let _ = style.set_property("opacity", &opacity.to_string());
        }
    }

    fn clear_opacity(&self) {
        if let Some(style) = self.style() {
            let _ = style.remove_property("opacity");
        }
    }

    fn set_suppressed(&self, suppressed: bool) {
        if let Some(style) = self.style() {
            if suppressed {
                let _ = style.set_property("display", "none");
            } else {
                let _ = style.remove_property("display");
            }
        }
    }
}
