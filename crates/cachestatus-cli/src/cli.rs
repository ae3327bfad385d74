//! CLI for the cachestatus cache-verification tool.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use cachestatus_core::check::{run_check, CheckConfig};
use cachestatus_core::checksum::HashKind;
use cachestatus_core::config;
use cachestatus_core::filelist;
use cachestatus_core::model::VHost;
use cachestatus_core::worker::CheckOptions;

use crate::server;

/// Flags mirror the tool's historical interface: one flat set, no
/// subcommands. `--port` switches to HTTP server mode.
#[derive(Debug, Parser)]
#[command(name = "cachestatus", version)]
#[command(about = "Verify expected files are present on a cache node", long_about = None)]
pub struct Cli {
    /// URL or path of the file list or manifest.
    #[arg(long, value_name = "URL")]
    pub filelist: Option<String>,

    /// Write a manifest of verified files to this path.
    #[arg(long = "create-manifest", value_name = "PATH")]
    pub create_manifest: Option<PathBuf>,

    /// Server to check (host or host:port).
    #[arg(long, default_value = "localhost")]
    pub server: String,

    /// Host header for checks, or source hostname when creating a manifest.
    #[arg(long, default_value = "")]
    pub hostname: String,

    /// Check (or record) content checksums.
    #[arg(long)]
    pub checksum: bool,

    /// How many concurrent probe workers to run (default from config).
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Hash function for checksums: sha256 or crc32.
    #[arg(long, value_name = "NAME")]
    pub hash: Option<String>,

    /// Log each file's outcome, not just the bad ones.
    #[arg(long)]
    pub verbose: bool,

    /// Listen on this port and serve checks over HTTP instead.
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,
}

pub async fn run_from_args() -> Result<ExitCode> {
    let cli = Cli::parse();
    let cfg = config::load_or_init()?;

    if let Some(port) = cli.port {
        tracing::info!("http server mode");
        server::serve(port, cfg).await?;
        return Ok(ExitCode::SUCCESS);
    }

    tracing::info!("command line mode");
    let Some(filelist) = cli.filelist else {
        bail!("--filelist is required outside server mode");
    };

    let hash = match &cli.hash {
        Some(name) => HashKind::from_name(name)?,
        None => cfg.hash,
    };

    tracing::info!("getting file list from {}", filelist);
    let vhost = VHost::new(filelist, cli.hostname.clone());
    let vhost = tokio::task::spawn_blocking(move || -> Result<VHost> {
        let mut vhost = vhost;
        filelist::load_file_list(&mut vhost)?;
        Ok(vhost)
    })
    .await
    .context("file list task")??;
    tracing::info!("got {} files", vhost.files.len());

    let check_cfg = CheckConfig {
        server: cli.server.clone(),
        workers: cli.workers.unwrap_or(cfg.workers).max(1),
        options: CheckOptions {
            checksum: cli.checksum,
            hash,
            timeouts: cfg.probe_timeouts(),
        },
        manifest_path: cli.create_manifest.clone(),
        manifest_queue: cfg.manifest_queue,
    };

    let board = run_check(vhost, &check_cfg).await?;
    let report = board.snapshot();

    if cli.verbose {
        for status in report.status.values() {
            tracing::info!("{} {} [{}]", status.path, status.status, status.status.mark());
        }
    }

    // Bad paths go to stdout so they can be piped into a purge script.
    for path in &report.bad_files {
        println!("{}", path);
    }

    Ok(if report.bad_files.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
