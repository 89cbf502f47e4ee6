//! Tailoring simulator.
//!
//! Replays a full or scoped tailoring pass over a results fixture and
//! prints the resulting page state, for debugging rule sets without a
//! browser. The fixture is the in-memory page's serialized form, so the
//! output is exactly the DOM contract: tag attribute, panel, colors,
//! opacity, display override.

use std::fs;

use tailor_core::engines::SearchEngineDescriptor;
use tailor_core::page::mem::{MemPage, MemResult};
use tailor_core::{engine_status, EngineRegistry, EngineStatus, TailoringEngine, UserData};

pub struct SimulateOptions {
    pub settings_path: String,
    pub results_path: String,
    pub engine_id: String,
    pub scope: Option<Vec<String>>,
}

pub fn run_simulate(opts: SimulateOptions) -> Result<(), String> {
    let settings = fs::read_to_string(&opts.settings_path)
        .map_err(|e| format!("Failed to read '{}': {}", opts.settings_path, e))?;
    let data = UserData::from_json(&settings)
        .map_err(|e| format!("Invalid settings in '{}': {}", opts.settings_path, e))?;

    let fixture = fs::read_to_string(&opts.results_path)
        .map_err(|e| format!("Failed to read '{}': {}", opts.results_path, e))?;
    let results: Vec<MemResult> = serde_json::from_str(&fixture)
        .map_err(|e| format!("Invalid results fixture in '{}': {}", opts.results_path, e))?;

    let registry = EngineRegistry::builtin();
    let descriptor = registry
        .engines()
        .iter()
        .find(|engine| engine.id == opts.engine_id)
        .ok_or_else(|| format!("Unknown engine '{}'", opts.engine_id))?;

    let page = simulate(&data, descriptor, results, opts.scope.as_deref());

    let output = serde_json::to_string_pretty(&page)
        .map_err(|e| format!("Failed to serialize page state: {}", e))?;
    println!("{output}");
    Ok(())
}

/// One pass over an in-memory page, honoring the engine's enabled status
/// the way the content script does.
pub fn simulate(
    data: &UserData,
    descriptor: &SearchEngineDescriptor,
    results: Vec<MemResult>,
    scope: Option<&[String]>,
) -> Vec<MemResult> {
    let page = MemPage::new(results);
    let engine = TailoringEngine::new(descriptor.clone(), data.tailoring_entries.clone());

    match engine_status(Some(descriptor), data) {
        EngineStatus::Enabled => engine.tailor(&page, scope),
        EngineStatus::Disabled => engine.clear(&page),
        EngineStatus::Unsupported => {}
    }

    page.snapshot()
}
