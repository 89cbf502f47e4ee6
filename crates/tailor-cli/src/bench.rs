//! Matcher micro-benchmark.
//!
//! Matches a batch of result links against a rule set the way a tailoring
//! pass does (patterns compiled once, then first-match per link) and
//! reports latency percentiles.

use std::fs;
use std::time::Instant;

use tailor_core::matcher::DomainMatcher;
use tailor_core::UserData;

pub struct BenchOptions {
    pub settings_path: String,
    pub links_path: Option<String>,
    pub iterations: usize,
}

const SAMPLE_LINKS: &[&str] = &[
    "https://en.wikipedia.org/wiki/Rust_(programming_language)",
    "https://www.example.com/some/result",
    "https://docs.rs/regex/latest/regex/",
    "https://stackoverflow.com/questions/000/result",
    "https://wikipedia.org/wiki/Search_engine",
    "https://news.ycombinator.com/item?id=1",
];

pub fn run_bench(opts: BenchOptions) -> Result<(), String> {
    let settings = fs::read_to_string(&opts.settings_path)
        .map_err(|e| format!("Failed to read '{}': {}", opts.settings_path, e))?;
    let data = UserData::from_json(&settings)
        .map_err(|e| format!("Invalid settings in '{}': {}", opts.settings_path, e))?;

    let links: Vec<String> = match &opts.links_path {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| format!("Failed to read '{}': {}", path, e))?
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect(),
        None => SAMPLE_LINKS.iter().map(|link| link.to_string()).collect(),
    };

    if links.is_empty() {
        return Err("No links to match".to_string());
    }

    let compile_start = Instant::now();
    let matcher = DomainMatcher::new(&data.tailoring_entries, false);
    let compile_us = compile_start.elapsed().as_secs_f64() * 1e6;

    // Warmup
    for link in &links {
        let _ = matcher.first_match(link);
    }

    let mut samples_ns: Vec<u64> = Vec::with_capacity(opts.iterations * links.len());
    let mut hits = 0usize;

    let total_start = Instant::now();
    for _ in 0..opts.iterations {
        for link in &links {
            let start = Instant::now();
            let matched = matcher.first_match(link);
            samples_ns.push(start.elapsed().as_nanos() as u64);
            if matched.is_some() {
                hits += 1;
            }
        }
    }
    let total_ms = total_start.elapsed().as_secs_f64() * 1000.0;

    samples_ns.sort_unstable();
    let total = samples_ns.len();

    println!("Matcher benchmark");
    println!("  Entries:    {}", data.tailoring_entries.len());
    println!("  Links:      {}", links.len());
    println!("  Matches:    {} / {}", hits, total);
    println!("  Compile:    {:.1}us", compile_us);
    println!(
        "  Latency:    p50 {}ns, p95 {}ns, p99 {}ns, max {}ns",
        percentile(&samples_ns, 50),
        percentile(&samples_ns, 95),
        percentile(&samples_ns, 99),
        samples_ns.last().copied().unwrap_or(0),
    );
    println!("  Total:      {:.1}ms for {} matches", total_ms, total);

    Ok(())
}

fn percentile(sorted: &[u64], pct: usize) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let index = (sorted.len() * pct / 100).min(sorted.len() - 1);
    sorted[index]
}
