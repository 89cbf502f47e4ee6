//! WebAssembly bindings for the Search Tailor content script
//!
//! The JS glue owns the browser APIs with suspend points (the async
//! `browser.storage` reads and the message port) and hands their results
//! in as JSON strings. Everything past this boundary is a single
//! synchronous pass over the live DOM, so interleaved triggers (mutation
//! batch vs. change message) can land in any order and still converge.

mod dom;
mod observe;

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};

use wasm_bindgen::prelude::*;
use web_sys::Document;

use tailor_core::types::{entry_id_from_parts, ENTRY_ID_RANDOM_SPAN};
use tailor_core::{
    engine_status, ChangeNotification, EngineRegistry, EngineStatus, TailoringEngine, UserData,
};

use dom::{mark_page_target, DomPage};
use observe::ResultsObserver;

struct TailorState {
    engine: TailoringEngine,
    user_data: UserData,
    observer: Option<ResultsObserver>,
}

thread_local! {
    static STATE: RefCell<Option<TailorState>> = const { RefCell::new(None) };
}

/// Initializes tailoring for the current page: identifies the engine,
/// stamps the page root, runs the first pass, and attaches the mutation
/// watcher for engines that load results asynchronously. Returns the
/// identified engine's id, or `None` when the page is unsupported (in
/// which case nothing was touched).
#[wasm_bindgen]
pub fn init(
    page_url: &str,
    stored_settings: Option<String>,
    engine_config: Option<String>,
) -> Result<Option<String>, JsValue> {
    init_logging();

    let registry = match engine_config.as_deref() {
        Some(json) => EngineRegistry::from_json(json).unwrap_or_else(|err| {
            log::warn!("remote engine config unusable, using builtins: {err}");
            EngineRegistry::builtin()
        }),
        None => EngineRegistry::builtin(),
    };

    let descriptor = match registry.identify(page_url) {
        Some(descriptor) => descriptor.clone(),
        None => return Ok(None),
    };
    let engine_id = descriptor.id.clone();
    let wants_observer = descriptor.observe;

    let user_data = UserData::from_json_or_default(stored_settings.as_deref());

    let document = page_document()?;
    mark_page_target(&document, &engine_id);

    let engine = TailoringEngine::new(descriptor, user_data.tailoring_entries.clone());
    STATE.with(|cell| {
        *cell.borrow_mut() = Some(TailorState {
            engine,
            user_data,
            observer: None,
        });
    });

    run_pass(None);

    if wants_observer {
        start_observer()?;
    }

    Ok(Some(engine_id))
}

/// Re-tailors the current page. `updated_ids` is an optional array of
/// entry ids that scopes the pass; null or undefined re-tailors everything.
#[wasm_bindgen]
pub fn tailor(updated_ids: JsValue) {
    let scope: Option<Vec<String>> = if updated_ids.is_null() || updated_ids.is_undefined() {
        None
    } else {
        let values = js_sys::Array::from(&updated_ids);
        Some(values.iter().filter_map(|value| value.as_string()).collect())
    };
    run_pass(scope.as_deref());
}

/// Handles one raw message from the extension's channel together with
/// freshly re-read settings. Returns whether the message was a change
/// notification; unrelated messages are ignored untouched.
#[wasm_bindgen]
pub fn apply_change(message_json: &str, stored_settings: Option<String>) -> bool {
    let notification = match ChangeNotification::parse(message_json) {
        Some(notification) => notification,
        None => return false,
    };
    log::debug!("change received: {}", notification.reason());

    let user_data = UserData::from_json_or_default(stored_settings.as_deref());
    let refreshed = STATE.with(|cell| {
        let mut borrow = cell.borrow_mut();
        match borrow.as_mut() {
            Some(state) => {
                state.engine.set_entries(user_data.tailoring_entries.clone());
                state.user_data = user_data;
                true
            }
            None => false,
        }
    });

    if refreshed {
        run_pass(notification.updated_ids.as_deref());
    }
    true
}

/// Removes every treatment from the current page.
#[wasm_bindgen]
pub fn clear_treatments() {
    STATE.with(|cell| {
        if let Some(state) = cell.borrow().as_ref() {
            if let Some(page) = locate_page(state) {
                state.engine.clear(&page);
            }
        }
    });
}

/// Attaches the mutation watcher to the results container, replacing any
/// prior watcher. Returns whether one is now attached (engines without the
/// `observe` flag never get one).
#[wasm_bindgen]
pub fn start_observer() -> Result<bool, JsValue> {
    STATE.with(|cell| {
        let mut borrow = cell.borrow_mut();
        let state = match borrow.as_mut() {
            Some(state) => state,
            None => return Ok(false),
        };
        if !state.engine.descriptor().observe {
            return Ok(false);
        }
        let page = match locate_page(state) {
            Some(page) => page,
            None => return Ok(false),
        };

        // Observers are not additive; drop (and thereby disconnect) any
        // prior one before attaching.
        state.observer = None;
        let observer = ResultsObserver::attach(page.container(), Box::new(|| run_pass(None)))?;
        state.observer = Some(observer);
        Ok(true)
    })
}

/// Disconnects the mutation watcher, if one is attached.
#[wasm_bindgen]
pub fn stop_observer() -> bool {
    STATE.with(|cell| {
        match cell.borrow_mut().as_mut() {
            Some(state) => state.observer.take().is_some(),
            None => false,
        }
    })
}

/// The id of the engine identified for this page.
#[wasm_bindgen]
pub fn engine_id() -> Option<String> {
    STATE.with(|cell| {
        cell.borrow()
            .as_ref()
            .map(|state| state.engine.descriptor().id.clone())
    })
}

/// `"unsupported"`, `"disabled"` or `"enabled"`.
#[wasm_bindgen]
pub fn status() -> String {
    STATE.with(|cell| {
        let status = match cell.borrow().as_ref() {
            Some(state) => engine_status(Some(state.engine.descriptor()), &state.user_data),
            None => EngineStatus::Unsupported,
        };
        match status {
            EngineStatus::Unsupported => "unsupported",
            EngineStatus::Disabled => "disabled",
            EngineStatus::Enabled => "enabled",
        }
        .to_string()
    })
}

/// Generates an id for a freshly created tailoring entry.
#[wasm_bindgen]
pub fn new_entry_id() -> String {
    let timestamp = js_sys::Date::now() as u64;
    let random = (js_sys::Math::random() * f64::from(ENTRY_ID_RANDOM_SPAN)) as u32;
    entry_id_from_parts(timestamp, random)
}

/// Toggles debug logging to the console. Warnings and errors always pass.
#[wasm_bindgen]
pub fn set_debug(enabled: bool) {
    DEBUG.store(enabled, Ordering::Relaxed);
}

// =============================================================================
// Internals
// =============================================================================

/// One synchronous tailoring pass over the live page, honoring the engine
/// status: enabled pages tailor, disabled pages shed their treatments, and
/// a missing container is a no-op.
fn run_pass(scope: Option<&[String]>) {
    STATE.with(|cell| {
        let borrow = cell.borrow();
        let state = match borrow.as_ref() {
            Some(state) => state,
            None => return,
        };
        let page = match locate_page(state) {
            Some(page) => page,
            None => return,
        };

        match engine_status(Some(state.engine.descriptor()), &state.user_data) {
            EngineStatus::Enabled => state.engine.tailor(&page, scope),
            EngineStatus::Disabled => state.engine.clear(&page),
            EngineStatus::Unsupported => {}
        }
    });
}

fn locate_page(state: &TailorState) -> Option<DomPage> {
    let document = web_sys::window()?.document()?;
    DomPage::locate(&document, &state.engine.descriptor().selectors)
}

fn page_document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("no document available"))
}

// =============================================================================
// Logging
// =============================================================================

static DEBUG: AtomicBool = AtomicBool::new(false);
static LOGGER: ConsoleLogger = ConsoleLogger;

struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::Level::Warn || DEBUG.load(Ordering::Relaxed)
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[tailor] {}", record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&line),
            log::Level::Warn => web_sys::console::warn_1(&line),
            _ => web_sys::console::log_1(&line),
        }
    }

    fn flush(&self) {}
}

fn init_logging() {
    // set_logger fails after the first call; later calls are harmless.
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(log::LevelFilter::Debug);
}
