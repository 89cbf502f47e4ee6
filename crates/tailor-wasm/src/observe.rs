//! Mutation watcher.
//!
//! Engines flagged `observe` load results asynchronously (infinite scroll,
//! AJAX result batches); the watcher re-runs a full tailoring pass on every
//! batch of child-list mutations in the results container. Observers are
//! not additive: exactly one may be live per page, and attaching a new one
//! replaces and thereby disconnects the old.

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, MutationObserver, MutationObserverInit};

pub struct ResultsObserver {
    observer: MutationObserver,
    // Keeps the callback alive for as long as the observer may fire.
    _callback: Closure<dyn FnMut()>,
}

impl ResultsObserver {
    /// Attaches a child-list observer to the results container.
    pub fn attach(container: &Element, on_mutation: Box<dyn FnMut()>) -> Result<Self, JsValue> {
        let callback = Closure::wrap(on_mutation);
        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;

        let options = MutationObserverInit::new();
        options.set_child_list(true);
        observer.observe_with_options(container, &options)?;

        Ok(Self {
            observer,
            _callback: callback,
        })
    }

    pub fn disconnect(&self) {
        self.observer.disconnect();
    }
}

impl Drop for ResultsObserver {
    fn drop(&mut self) {
        self.disconnect();
    }
}
