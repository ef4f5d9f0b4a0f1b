#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the incident ingestion tool.

use std::process::ExitCode;

use blotter_ingest::IngestError;
use blotter_ingest::cli::Cli;
use blotter_ingest::config::IngestConfig;
use blotter_source::registry::all_regions;
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    pretty_env_logger::init();

    let cli = Cli::parse();

    if cli.list_regions {
        print_regions();
        return ExitCode::SUCCESS;
    }

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<(), IngestError> {
    let config = IngestConfig::from_cli(cli)?;
    blotter_ingest::run(&config).await?;
    Ok(())
}

fn print_regions() {
    println!("{:<10} {:<16} {:<8} NAME", "ID", "ALIASES", "LIMIT");
    println!("{}", "-".repeat(60));
    for region in all_regions() {
        println!(
            "{:<10} {:<16} {:<8} {}",
            region.id,
            region.aliases.join(","),
            region.limit,
            region.name
        );
    }
}
