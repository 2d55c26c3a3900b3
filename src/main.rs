//! lp-intel — Binary Entrypoint
//! Loads sources + keyword categories, reads local documents, classifies them
//! and prints one JSON insight per line on stdout.

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lp_intel::config::{self, Settings};
use lp_intel::{run_once, CancellationToken, Classifier, LocalTextFeed};

#[derive(Debug, Default)]
struct Args {
    sources: Option<PathBuf>,
    keywords: Option<PathBuf>,
    workers: Option<usize>,
}

fn usage() -> &'static str {
    "usage: lp-intel [--sources PATH] [--keywords PATH] [--workers N]"
}

fn parse_args(mut it: impl Iterator<Item = String>) -> Result<Args> {
    let mut args = Args::default();
    while let Some(flag) = it.next() {
        let mut value = || it.next().with_context(|| format!("{flag} needs a value"));
        match flag.as_str() {
            "--sources" => args.sources = Some(PathBuf::from(value()?)),
            "--keywords" => args.keywords = Some(PathBuf::from(value()?)),
            "--workers" => {
                args.workers = Some(value()?.parse().context("--workers expects a number")?)
            }
            "-h" | "--help" => {
                println!("{}", usage());
                std::process::exit(0);
            }
            other => bail!("unknown argument `{other}`\n{}", usage()),
        }
    }
    Ok(args)
}

/// Logs go to stderr (stdout carries insights). RUST_LOG overrides the
/// default filter; LP_LOG_FORMAT=json switches to JSON lines.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lp_intel=info,warn"));
    let json = std::env::var(config::ENV_LOG_FORMAT)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().compact().with_writer(std::io::stderr)))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let args = parse_args(std::env::args().skip(1))?;
    let settings = Settings::from_env();

    let sources_path = match args.sources.clone() {
        Some(p) => p,
        None => config::resolve_sources_path()?,
    };
    let sources = config::load_sources_from(&sources_path)?;
    let keywords = match &args.keywords {
        Some(p) => config::load_keywords_from(p)?,
        None => config::load_keywords_default()?,
    };
    let index = Arc::new(keywords.to_index()?);
    let classifier = Classifier::new(index)?.with_workers(args.workers.unwrap_or(settings.workers));

    // Relative source paths resolve against the sources file directory.
    let feed = match sources_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => LocalTextFeed::with_root(dir),
        _ => LocalTextFeed::new(),
    };

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!(target: "ingest", "interrupt received; finishing in-flight documents");
            on_signal.cancel();
        }
    });

    let report = run_once(&feed, &sources, &classifier, &cancel).await;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for insight in &report.outcome.insights {
        serde_json::to_writer(&mut out, insight)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    if report.outcome.cancelled {
        tracing::warn!(
            target: "ingest",
            processed = report.outcome.processed,
            total = report.outcome.total,
            "partial results (cancelled)"
        );
    }
    Ok(())
}
