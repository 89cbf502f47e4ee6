//! Search Tailor Core Library
//!
//! This crate provides the result-tailoring engine for the Search Tailor
//! extension: it matches search-result links against user-defined domain
//! rules and applies visual treatments (hide, dim, highlight) to the
//! matching results.
//!
//! # Architecture
//!
//! The engine is a pure function of (current page, current rule set): all
//! tailoring state lives in the page itself as a data attribute plus an
//! injected panel node, so a pass can be re-run from any trigger (initial
//! load, DOM mutation, change notification) and always converges to the
//! same state. The crate never touches a real DOM; the page is accessed
//! through the traits in [`page`], with a `web-sys` adapter living in the
//! wasm crate and an in-memory implementation here for tests and tooling.
//!
//! # Modules
//!
//! - `engines`: search engine registry (URL patterns, selectors, flags)
//! - `types`: tailoring entries and treatments
//! - `settings`: persisted user data, defaults, validation
//! - `matcher`: entry-to-result matching with first-match precedence
//! - `engine`: the tailoring engine (tag / panel / apply phases)
//! - `page`: page abstraction and the in-memory implementation
//! - `notify`: change-notification wire format
//! - `color`: HSLA color string handling

pub mod color;
pub mod engine;
pub mod engines;
pub mod matcher;
pub mod notify;
pub mod page;
pub mod settings;
pub mod types;

// Re-export commonly used types
pub use engine::TailoringEngine;
pub use engines::{engine_status, EngineRegistry, EngineStatus, SearchEngineDescriptor, Selectors};
pub use matcher::DomainMatcher;
pub use notify::ChangeNotification;
pub use page::{PanelMark, ResultHandle, SearchPage};
pub use settings::{SearchEnginePreference, SettingsError, UserData};
pub use types::{TailoringEntry, Treatment};
