//! Dunya CLI - Main entry point

use std::process;

use clap::Parser;
use dunya_cli::{
    api::ApiClient,
    commands::{self, download::DownloadArgs},
    config::CliConfig,
    Cli, Commands,
};
use dunya_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use tracing::error;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let log_config = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Warn })
        .output(LogOutput::Console)
        .log_file_prefix("dunya-cli")
        .build();

    // Environment variables take precedence
    let log_config = LogConfig::from_env_with(log_config.clone()).unwrap_or(log_config);

    // The CLI works without logging
    let _ = init_logging(&log_config);

    if let Err(e) = execute_command(&cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn execute_command(cli: &Cli) -> dunya_cli::Result<()> {
    let config = CliConfig::new(&cli.server_url, cli.token.clone())?;
    let client = ApiClient::new(&config)?;

    match &cli.command {
        Commands::Collections => commands::collections::run(&client).await,

        Commands::Document { mbid } => commands::document::run(&client, mbid).await,

        Commands::Download {
            mbid,
            slug,
            subtype,
            part,
            version,
            output,
            sha256,
        } => {
            let args = DownloadArgs {
                mbid: mbid.clone(),
                slug: slug.clone(),
                subtype: subtype.clone(),
                part: *part,
                version: version.clone(),
                output: output.clone(),
                sha256: sha256.clone(),
            };
            commands::download::run(&client, args, true).await.map(|_| ())
        },

        Commands::Status => commands::status::run(&client).await,
    }
}
