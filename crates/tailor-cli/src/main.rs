//! Search Tailor CLI
//!
//! Developer tooling for settings files and rule sets: validation,
//! inspection, link matching, a full tailoring simulator, and the remote
//! engine-config fetcher.

use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use rand::Rng;

use tailor_core::matcher::DomainMatcher;
use tailor_core::types::{entry_id_from_parts, TailoringEntry, ENTRY_ID_RANDOM_SPAN};
use tailor_core::{EngineRegistry, UserData};

mod bench;
#[cfg(feature = "e2e")]
mod e2e;
mod remote;
mod sim;

#[derive(Parser)]
#[command(name = "tailor-cli")]
#[command(about = "Search Tailor settings and rule-set tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a fresh settings file with the default seed data
    Init {
        /// Output settings file
        #[arg(short, long, default_value = "settings.json")]
        output: String,
    },

    /// Validate a settings file
    Validate {
        /// Settings file to validate
        #[arg(short, long)]
        input: String,
    },

    /// Summarize a settings file
    Info {
        /// Settings file to inspect
        #[arg(short, long)]
        input: String,
    },

    /// Test which entry owns a result link
    Match {
        /// Settings file holding the rule set
        #[arg(short, long)]
        settings: String,

        /// The link to test
        link: String,

        /// Treat the link as visible text rather than an href
        #[arg(long)]
        text: bool,
    },

    /// Append a new tailoring entry to a settings file
    AddEntry {
        /// Settings file to modify
        #[arg(short, long)]
        settings: String,

        /// Domain fragments for the new entry
        #[arg(short, long, required = true)]
        domain: Vec<String>,

        /// Treatment opacity
        #[arg(long)]
        opacity: Option<f64>,

        /// Treatment panel background color (hsla)
        #[arg(long)]
        background: Option<String>,

        /// Treatment panel border color (hsla)
        #[arg(long)]
        border: Option<String>,
    },

    /// Replay a tailoring pass over a results fixture
    Simulate {
        /// Settings file holding the rule set
        #[arg(short, long)]
        settings: String,

        /// JSON fixture of results
        #[arg(short, long)]
        results: String,

        /// Engine descriptor to simulate under
        #[arg(short, long, default_value = "google")]
        engine: String,

        /// Limit the pass to these entry ids (comma separated)
        #[arg(long, value_delimiter = ',')]
        scope: Option<Vec<String>>,
    },

    /// Fetch the remote engine config (ETag-aware)
    FetchConfig {
        /// Config URL
        #[arg(short, long, default_value = remote::DEFAULT_CONFIG_URL)]
        url: String,

        /// Output file
        #[arg(short, long, default_value = "search-engines.json")]
        output: String,
    },

    /// Micro-benchmark the matcher against a rule set
    Bench {
        /// Settings file holding the rule set
        #[arg(short, long)]
        settings: String,

        /// File of result links, one per line
        #[arg(short, long)]
        links: Option<String>,

        /// Passes over the link set
        #[arg(short, long, default_value_t = 1000)]
        iterations: usize,
    },

    /// Run end-to-end checks against a live engine via chromedriver
    #[cfg(feature = "e2e")]
    E2e {
        /// Chromedriver URL
        #[arg(long, default_value = "http://localhost:9515")]
        chromedriver_url: String,

        /// Path to the unpacked extension
        #[arg(long)]
        extension_path: String,

        /// Run the browser headless
        #[arg(long)]
        headless: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { output } => cmd_init(&output),
        Commands::Validate { input } => cmd_validate(&input),
        Commands::Info { input } => cmd_info(&input),
        Commands::Match {
            settings,
            link,
            text,
        } => cmd_match(&settings, &link, text),
        Commands::AddEntry {
            settings,
            domain,
            opacity,
            background,
            border,
        } => cmd_add_entry(&settings, &domain, opacity, background, border),
        Commands::Simulate {
            settings,
            results,
            engine,
            scope,
        } => sim::run_simulate(sim::SimulateOptions {
            settings_path: settings,
            results_path: results,
            engine_id: engine,
            scope,
        }),
        Commands::FetchConfig { url, output } => {
            remote::run_fetch_config(remote::FetchConfigOptions { url, output })
        }
        Commands::Bench {
            settings,
            links,
            iterations,
        } => bench::run_bench(bench::BenchOptions {
            settings_path: settings,
            links_path: links,
            iterations,
        }),
        #[cfg(feature = "e2e")]
        Commands::E2e {
            chromedriver_url,
            extension_path,
            headless,
        } => e2e::run_e2e(e2e::E2eOptions {
            chromedriver_url,
            extension_path,
            headless,
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_settings(path: &str) -> Result<UserData, String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    UserData::from_json(&content).map_err(|e| format!("Invalid settings in '{}': {}", path, e))
}

fn write_settings(path: &str, data: &UserData) -> Result<(), String> {
    let json = data
        .to_json_pretty()
        .map_err(|e| format!("Failed to serialize settings: {}", e))?;
    fs::write(path, json + "\n").map_err(|e| format!("Failed to write '{}': {}", path, e))
}

fn cmd_init(output: &str) -> Result<(), String> {
    write_settings(output, &UserData::default())?;
    println!("Wrote default settings to '{}'", output);
    Ok(())
}

fn cmd_validate(input: &str) -> Result<(), String> {
    let data = load_settings(input)?;
    let issues = data.validate(&EngineRegistry::builtin());

    if issues.is_empty() {
        println!("Settings '{}' are valid", input);
        println!("  Entries:  {}", data.tailoring_entries.len());
        println!("  Engines:  {}", data.search_engines.len());
        return Ok(());
    }

    for issue in &issues {
        eprintln!("  - {issue}");
    }
    Err(format!("{} issue(s) found in '{}'", issues.len(), input))
}

fn cmd_info(input: &str) -> Result<(), String> {
    let data = load_settings(input)?;

    println!("Settings: {}", input);
    println!();
    println!("Entries ({}):", data.tailoring_entries.len());
    for entry in &data.tailoring_entries {
        println!(
            "  {}  opacity {:<4}  [{}]",
            entry.id,
            entry.treatment.opacity,
            entry.domains.join(", ")
        );
    }
    println!();
    println!("Engines:");
    for pref in &data.search_engines {
        let marker = if pref.enabled { "enabled " } else { "disabled" };
        println!("  {}  {} ({})", marker, pref.label, pref.id);
    }
    println!();
    println!("Color hint background: {}", data.color_hint_background);

    Ok(())
}

fn cmd_match(settings: &str, link: &str, as_text: bool) -> Result<(), String> {
    let data = load_settings(settings)?;
    let matcher = DomainMatcher::new(&data.tailoring_entries, as_text);

    match matcher.first_match(link) {
        Some(index) => {
            let entry = &data.tailoring_entries[index];
            println!(
                "{} -> entry {} (domains: {})",
                link,
                entry.id,
                entry.domains.join(", ")
            );
        }
        None => println!("{} -> no match", link),
    }

    Ok(())
}

fn cmd_add_entry(
    settings: &str,
    domains: &[String],
    opacity: Option<f64>,
    background: Option<String>,
    border: Option<String>,
) -> Result<(), String> {
    let mut data = load_settings(settings)?;

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("System clock is before the epoch: {}", e))?
        .as_millis() as u64;
    let random = rand::thread_rng().gen_range(0..ENTRY_ID_RANDOM_SPAN);
    let id = entry_id_from_parts(timestamp, random);

    let mut entry = TailoringEntry::new(id.clone());
    entry.domains = domains.to_vec();
    if let Some(opacity) = opacity {
        entry.treatment.opacity = opacity;
    }
    if let Some(background) = background {
        entry.treatment.background_color = background;
    }
    if let Some(border) = border {
        entry.treatment.border_color = border;
    }

    let probe = UserData {
        tailoring_entries: vec![entry.clone()],
        ..UserData::default()
    };
    if let Some(issue) = probe.validate(&EngineRegistry::builtin()).into_iter().next() {
        return Err(format!("New entry is invalid: {issue}"));
    }

    data.tailoring_entries.push(entry);
    write_settings(settings, &data)?;
    println!("Added entry {} to '{}'", id, settings);
    Ok(())
}
