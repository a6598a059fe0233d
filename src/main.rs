use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use maven_exploder::cli::Cli;
use maven_exploder::config::Settings;
use maven_exploder::orchestrator::{ExplodeSummary, Exploder};
use maven_exploder::remote::HttpFetcher;
use maven_exploder::ui;

/// Conventional exit status after SIGINT.
const INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    tokio::select! {
        outcome = run(&cli) => match outcome {
            Ok(summary) => {
                ui::summary(&summary);
                ExitCode::SUCCESS
            }
            Err(e) => {
                ui::error(&format!("{:#}", e));
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            ui::warning("Interrupted, partially exploded artifacts are left in place");
            ExitCode::from(INTERRUPTED)
        }
    }
}

async fn run(cli: &Cli) -> Result<ExplodeSummary> {
    let settings = Settings::resolve(cli)?;
    let fetcher = HttpFetcher::new(settings.timeout).context("Failed to build HTTP client")?;
    let disassembler = settings.disassembler.build();

    let exploder = Exploder::new(settings, Arc::new(fetcher), disassembler);
    exploder
        .run()
        .await
        .with_context(|| format!("Failed to mirror {}", exploder.settings().base_url))
}
