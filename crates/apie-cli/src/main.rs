//! APIE command-line client
//!
//! Uploads a binary to the analysis server and renders the result: either
//! the single JSON response, or the live event stream followed as it runs.

mod cli;
mod output;

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use apie_core::{AnalysisClient, ExportArtifact, ExportRequest, StreamOptions};

use cli::{Cli, Command};
use output::TerminalSurface;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);
    if let Err(err) = run(cli).await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing(debug: bool) {
    let default = if debug {
        "apie=debug,apie_core=debug"
    } else {
        "apie=warn,apie_core=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let server = cli.server_url();
    debug!("using server {server}");
    let client = AnalysisClient::new(&server)?;
    match cli.command {
        Command::Analyze {
            file,
            verbose,
            export,
            reports_dir,
            idle_timeout,
        } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("cannot read {}", file.display()))?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "uploaded.bin".to_string());
            if verbose {
                analyze_streaming(
                    &client,
                    &file_name,
                    bytes,
                    export,
                    &reports_dir,
                    Duration::from_secs(idle_timeout),
                )
                .await
            } else {
                analyze_single_shot(&client, &file_name, bytes, export, &reports_dir).await
            }
        }
        Command::Lookup { names } => {
            let response = client.lookup(&names).await?;
            output::render_results(&response.results);
            Ok(())
        }
    }
}

/// Follow the live event stream; findings print as the server reports them.
async fn analyze_streaming(
    client: &AnalysisClient,
    file_name: &str,
    bytes: Vec<u8>,
    export: bool,
    reports_dir: &Path,
    idle_timeout: Duration,
) -> Result<()> {
    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    let options = StreamOptions {
        export: export.then(|| ExportRequest {
            header: format!("APIE report for {file_name}"),
        }),
        idle_timeout,
        cancel,
    };
    let mut surface = TerminalSurface::default();
    let summary = client
        .analyze_stream(file_name, bytes, &mut surface, options)
        .await?;
    println!();

    if let Some(artifact) = &summary.artifact {
        let path = artifact
            .write_to(reports_dir)
            .with_context(|| format!("cannot write report under {}", reports_dir.display()))?;
        println!("Report saved to {}", path.display());
    }
    if !summary.completed {
        bail!("analysis stream ended before completion");
    }
    Ok(())
}

/// Wait for the full JSON result, then render it in one pass.
async fn analyze_single_shot(
    client: &AnalysisClient,
    file_name: &str,
    bytes: Vec<u8>,
    export: bool,
    reports_dir: &Path,
) -> Result<()> {
    let response = client.analyze(file_name, bytes, export).await?;
    output::render_results(&response.results);

    if export {
        let lines = output::format_results(&response.results);
        let artifact =
            ExportArtifact::build(&format!("APIE report for {file_name}"), &lines, Utc::now());
        let path = artifact
            .write_to(reports_dir)
            .with_context(|| format!("cannot write report under {}", reports_dir.display()))?;
        println!("Report saved to {}", path.display());
    }
    Ok(())
}

fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });
}
