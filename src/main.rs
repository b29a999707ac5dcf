//! envdoc CLI
//!
//! Entry point for the `envdoc` command-line tool.

use clap::Parser;
use envdoc::{run, DocgenConfig, RunMode, RunReport};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "envdoc")]
#[command(about = "Regenerate env variable reference tables from Helm charts", version)]
struct Cli {
    /// Path to run config file
    #[arg(long, short = 'c', default_value = envdoc::config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Report stale documents without writing them
    #[arg(long)]
    check: bool,

    /// Output the run report in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let config = match DocgenConfig::from_file(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config {}: {}", cli.config.display(), e);
            process::exit(1);
        }
    };

    let mode = if cli.check { RunMode::Check } else { RunMode::Write };
    let report = match run(&config, mode) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    } else {
        print_report(&report);
    }

    if report.check && !report.is_up_to_date() {
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("envdoc=warn,envdoc_extract=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_report(report: &RunReport) {
    for document in &report.documents {
        let path = document.output.display();
        if !report.check {
            println!("Markdown documentation generated in {}", path);
        } else if document.changed {
            println!("Stale: {}", path);
        } else {
            println!("Up to date: {}", path);
        }
    }
}
