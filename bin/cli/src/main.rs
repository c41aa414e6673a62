//! Command line tools for pieceflow drafts and flow versions.

mod commands;
mod config;
mod error;

use crate::config::CliConfig;
use crate::error::CliError;
use clap::{Parser, Subcommand};
use pieceflow_core::Result;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "pieceflow", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Materialize a draft trigger into a named flow version and print it
    Materialize {
        /// Draft trigger JSON file
        draft: PathBuf,
        /// Display name of the created flow; defaults to the file name
        #[arg(long)]
        name: Option<String>,
    },
    /// Validate a flow version JSON file and list its issues
    Validate {
        /// Flow version JSON file
        flow_version: PathBuf,
    },
    /// Print the webhook URL of a flow
    WebhookUrl {
        /// Flow id, with or without its `flow_` prefix
        flow_id: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match CliConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", CliError::Config { details: e.to_string() });
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli.command, &config).await {
        Ok(code) => code,
        Err(report) => {
            tracing::error!(error = %report, "command failed");
            eprintln!("error: {report}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &CliConfig) -> Result<ExitCode, CliError> {
    match command {
        Command::Materialize { draft, name } => {
            let version = commands::materialize(config, &draft, name).await?;
            println!("{}", commands::to_pretty_json(&version)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate { flow_version } => {
            let report = commands::validate(&flow_version)?;
            if report.is_valid() {
                println!("valid");
                return Ok(ExitCode::SUCCESS);
            }
            for issue in &report.issues {
                println!("{issue}");
            }
            Ok(ExitCode::FAILURE)
        }
        Command::WebhookUrl { flow_id } => {
            println!("{}", commands::webhook_url(config, &flow_id)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
