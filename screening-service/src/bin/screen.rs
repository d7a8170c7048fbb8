//! Screen one subject and print the JSON report

use anyhow::Context;
use audit_ledger::ExportFormat;
use clap::Parser;
use screening_service::{Config, RawArticle, Screener, ScreeningReport, ScreeningRequest};
use std::path::PathBuf;

/// Sanctions and adverse-media screening
#[derive(Parser)]
#[command(name = "screen", version, about = "Screen a subject against sanctions and adverse media")]
struct Cli {
    /// Subject name, e.g. "Putin Vladimir"
    name: String,

    /// Date of birth (recorded, not matched)
    #[arg(long)]
    dob: Option<String>,

    /// Country filter; "Any" disables it
    #[arg(long, default_value = "Any")]
    country: String,

    /// TOML configuration file
    #[arg(long, env = "SCREENING_CONFIG")]
    config: Option<PathBuf>,

    /// JSON array of media feed items to index before screening
    #[arg(long)]
    media: Option<PathBuf>,

    /// Also print the audit trail (json or csv)
    #[arg(long)]
    export_audit: Option<ExportFormat>,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var("SCREENING_LOG_FORMAT").map_or(false, |f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_env().context("applying SCREENING_* overrides")?;

    let screener = Screener::from_config(config).context("building screener")?;

    if let Some(path) = &cli.media {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading media feed {}", path.display()))?;
        let items: Vec<RawArticle> =
            serde_json::from_str(&text).context("media feed must be a JSON array of articles")?;
        let stats = screener.ingest_media(&path.display().to_string(), items);
        tracing::info!(inserted = stats.inserted, skipped = stats.skipped, "Media indexed");
    }

    let request = ScreeningRequest::new(cli.name, cli.dob.as_deref(), &cli.country);
    let result = screener.screen(&request).await?;

    for warning in &result.warnings {
        tracing::warn!(%warning, "Screening completed with warning");
    }

    let report = ScreeningReport::from_result(&result);
    println!("{}", report.to_json_pretty()?);

    if let Some(format) = cli.export_audit {
        println!("{}", screener.export_audit_log(format)?);
    }

    Ok(())
}
