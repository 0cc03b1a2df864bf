mod report;
mod trace;

use anyhow::{Context, Result};
use clap::Parser;
use futures::stream::{self, StreamExt};
use plan_router::{EscalationController, RouterConfig};
use report::{ReplayRecord, ReplaySummary};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Replay a recorded generator trace through the plan router
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON-lines trace of small/large generator outputs
    #[arg(long)]
    trace: PathBuf,

    /// Router policy file (TOML); PLAN_ROUTER_* env vars override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Requests in flight at once (1 replays strictly in trace order)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    concurrency: u16,

    /// Print JSON lines instead of text
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => RouterConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load router config {}", path.display()))?,
        None => RouterConfig::default(),
    }
    .with_env_overrides(|var| std::env::var(var).ok())
    .context("Invalid PLAN_ROUTER_* environment override")?;

    let entries = trace::load_trace(&args.trace)?;
    info!(
        entries = entries.len(),
        window_capacity = config.window_capacity,
        percentile = config.percentile_rank,
        max_delegation_ratio = config.max_delegation_ratio,
        "Replaying trace"
    );

    let (small, large) = trace::scripted_generators(&entries);
    let controller = Arc::new(
        EscalationController::with_config(small, large, config)
            .context("Failed to build escalation controller")?,
    );

    let mut records = stream::iter(entries.into_iter().enumerate())
        .map(|(index, entry)| {
            let controller = Arc::clone(&controller);
            async move {
                let key = trace::entry_key(index, &entry.utterance);
                let result = controller.generate_plan(&key).await;
                ReplayRecord::new(index, entry.utterance, result)
            }
        })
        .buffered(usize::from(args.concurrency));

    let mut summary = ReplaySummary::default();
    while let Some(record) = records.next().await {
        summary.add(&record);
        if args.json {
            println!("{}", serde_json::to_string(&record)?);
        } else {
            println!("{}", record.render());
        }
    }
    summary.usage = Some(controller.usage());

    if args.json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!("{}", summary.render());
    }

    Ok(())
}
