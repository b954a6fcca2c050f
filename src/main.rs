//! Translate a page snapshot the way the browser overlay would.
//!
//! Usage:
//!   translation-overlay <snapshot.json>                 # boot with the stored language
//!   translation-overlay <snapshot.json> --lang ar       # switch to Arabic after boot
//!   translation-overlay <snapshot.json> --html --out page.html
//!   translation-overlay <snapshot.json> --chart stats.json   # also print translated chart data
//!
//! Optional environment variables:
//! - ASSET_BASE_URL (defaults to http://127.0.0.1:8000)
//! - STATIC_URL (defaults to /static/)
//! - PREFERENCE_FILE (defaults to .ui-lang.json)
//! - FETCH_TIMEOUT_SECS (defaults to 10)
//! - FETCH_MAX_ATTEMPTS (defaults to 2)

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tracing::info;
use translation_overlay::{
    config::OverlayConfig, dom::Document, engine::OverlayEngine, i18n::OverlayMetrics,
    preference::FileStore,
};

struct Args {
    snapshot: String,
    language: Option<String>,
    out: Option<String>,
    chart: Option<String>,
    html: bool,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut snapshot = None;
    let mut language = None;
    let mut out = None;
    let mut chart = None;
    let mut html = false;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--lang" => language = Some(iter.next().context("--lang needs a value")?.clone()),
            "--out" => out = Some(iter.next().context("--out needs a value")?.clone()),
            "--chart" => chart = Some(iter.next().context("--chart needs a value")?.clone()),
            "--html" => html = true,
            other if other.starts_with("--") => bail!("Unknown option: {}", other),
            other => snapshot = Some(other.to_string()),
        }
    }

    Ok(Args {
        snapshot: snapshot.context("Missing snapshot path")?,
        language,
        out,
        chart,
        html,
    })
}

fn print_usage() {
    println!("Usage: translation-overlay <snapshot.json> [--lang en|ar] [--out PATH] [--html] [--chart PATH]");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translation_overlay=info".parse()?),
        )
        .init();

    let raw_args: Vec<String> = std::env::args().collect();
    if raw_args.len() < 2 {
        print_usage();
        return Ok(());
    }
    let args = parse_args(&raw_args)?;

    let config = OverlayConfig::from_env()?;
    let store = Arc::new(FileStore::new(&config.preference_file));

    let raw = std::fs::read_to_string(&args.snapshot)
        .with_context(|| format!("Failed to read snapshot {}", args.snapshot))?;
    let document = Document::from_json(&raw)
        .with_context(|| format!("Failed to parse snapshot {}", args.snapshot))?;

    let engine = OverlayEngine::new(config, store, document)?;

    // Step 1: Boot with the stored language
    engine.boot().await.wait().await;

    // Step 2: Optional switch, as if the user clicked the control
    if let Some(code) = &args.language {
        match engine.switch_language(code).await {
            Some(handles) => {
                handles.wait().await;
            }
            None => bail!("Unsupported language: {}", code),
        }
    }

    let document = engine.document().await;
    let output = if args.html {
        document.to_html()
    } else {
        serde_json::to_string_pretty(&document.to_snapshot())?
    };

    match &args.out {
        Some(path) => {
            std::fs::write(path, &output).with_context(|| format!("Failed to write {}", path))?;
            info!("Wrote translated page to {}", path);
        }
        None => println!("{}", output),
    }

    if let Some(path) = &args.chart {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read chart data {}", path))?;
        let data: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse chart data {}", path))?;
        println!("{}", serde_json::to_string_pretty(&engine.chart_data(&data).await)?);
    }

    let report = OverlayMetrics::global().report();
    info!(
        "Done: {} resources ({:.0}% ok), {:.0}% keys resolved, {} sweep rewrites",
        report.resource_fetches, report.fetch_success_rate, report.key_coverage, report.sweep_rewrites
    );
    Ok(())
}
