use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use comps::cli::{formatters, Cli, Commands};
use comps::config::AnalysisConfig;
use comps::pipeline;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }

    match cli.command {
        Commands::Run { config, json } => handle_run(&config, json),
        Commands::Audit { config } => handle_audit(&config),
    }
}

fn handle_run(config_path: &std::path::Path, json: bool) -> Result<()> {
    let config = AnalysisConfig::from_file(config_path)?;
    info!(config = ?config_path, "starting pipeline run");

    let snapshot = pipeline::run_pipeline(&config)?;
    let recency_months = config.enrichment.recency_months;

    if json {
        println!("{}", formatters::render_run_json(&snapshot, recency_months)?);
    } else {
        print!("{}", formatters::render_run_text(&snapshot, recency_months));
    }
    Ok(())
}

fn handle_audit(config_path: &std::path::Path) -> Result<()> {
    let config = AnalysisConfig::from_file(config_path)?;
    let snapshot = pipeline::run_pipeline(&config)?;

    let mut violations = 0;
    for handle in snapshot.handles() {
        let count = pipeline::verify_invariants(handle, &config.filters);
        println!("{}", formatters::render_audit_line(&handle.dataset.name, count));
        violations += count;
    }

    if violations > 0 {
        anyhow::bail!("{} listings violate the configured comparable envelope", violations);
    }
    Ok(())
}
