//! Remote engine configuration.
//!
//! Selectors rot faster than extension releases ship, so the engine
//! descriptor table can be updated from a remote JSON file. Fetches are
//! conditional: the last ETag is kept beside the local copy and sent as
//! `If-None-Match`, and a 304 leaves everything untouched.

use std::fs;
use std::path::Path;

use tailor_core::EngineRegistry;

/// Where the engine config lives when no URL is given.
pub const DEFAULT_CONFIG_URL: &str =
    "https://raw.githubusercontent.com/example/search-tailor/main/config/search-engines.json";

pub struct FetchConfigOptions {
    pub url: String,
    pub output: String,
}

pub fn run_fetch_config(opts: FetchConfigOptions) -> Result<(), String> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to start tokio runtime: {}", e))?;
    runtime.block_on(fetch_config(opts))
}

async fn fetch_config(opts: FetchConfigOptions) -> Result<(), String> {
    let etag_path = format!("{}.etag", opts.output);
    let stored_etag = fs::read_to_string(&etag_path).ok();

    let client = reqwest::Client::new();
    let mut request = client.get(&opts.url);
    if let Some(etag) = stored_etag.as_deref() {
        request = request.header(reqwest::header::IF_NONE_MATCH, etag.trim());
    }

    let response = request
        .send()
        .await
        .map_err(|e| format!("Failed to fetch '{}': {}", opts.url, e))?;

    if response.status() == reqwest::StatusCode::NOT_MODIFIED {
        println!("Config is current; '{}' untouched", opts.output);
        return Ok(());
    }
    if !response.status().is_success() {
        return Err(format!("Fetch failed: HTTP {}", response.status()));
    }

    let etag = response
        .headers()
        .get(reqwest::header::ETAG)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let body = response
        .text()
        .await
        .map_err(|e| format!("Failed to read response body: {}", e))?;

    // Never replace a working config with one the registry cannot load.
    EngineRegistry::from_json(&body)
        .map_err(|e| format!("Fetched config is invalid: {}", e))?;

    if let Some(parent) = Path::new(&opts.output).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create '{}': {}", parent.display(), e))?;
        }
    }
    fs::write(&opts.output, &body)
        .map_err(|e| format!("Failed to write '{}': {}", opts.output, e))?;

    match etag {
        Some(etag) => fs::write(&etag_path, etag)
            .map_err(|e| format!("Failed to write '{}': {}", etag_path, e))?,
        None => {
            let _ = fs::remove_file(&etag_path);
        }
    }

    println!("Wrote {} bytes to '{}'", body.len(), opts.output);
    Ok(())
}
