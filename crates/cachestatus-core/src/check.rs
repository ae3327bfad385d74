//! Run driver: wires board, pool, and manifest together for one check.

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

use crate::manifest::Manifest;
use crate::model::VHost;
use crate::status::StatusBoard;
use crate::worker::{work_queue, CheckOptions, WorkerPool};

/// Explicit per-run configuration; constructors take this instead of any
/// process-wide state.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Target server to probe, host or host:port.
    pub server: String,
    /// Number of concurrent probe workers.
    pub workers: usize,
    pub options: CheckOptions,
    /// When set, verified-good files are recorded to a manifest at this path.
    pub manifest_path: Option<PathBuf>,
    /// Manifest writer queue capacity override.
    pub manifest_queue: Option<usize>,
}

impl CheckConfig {
    pub fn new(server: impl Into<String>, workers: usize) -> CheckConfig {
        CheckConfig {
            server: server.into(),
            workers: workers.max(1),
            options: CheckOptions::default(),
            manifest_path: None,
            manifest_queue: None,
        }
    }
}

/// Runs one full check: starts `workers` probe workers against `cfg.server`,
/// feeds every file of the vhost followed by one shutdown sentinel per
/// worker, waits for completion, and returns the board with the final state.
///
/// Setup failures (e.g. the manifest path cannot be created) abort before
/// any worker starts; per-file failures never do.
pub async fn run_check(vhost: VHost, cfg: &CheckConfig) -> Result<StatusBoard> {
    let workers = cfg.workers.max(1);
    let board = StatusBoard::new(vhost.files.len());
    let (tx, rx) = work_queue();
    let mut pool = WorkerPool::new(&vhost, &cfg.server, board.clone(), rx, cfg.options.clone());

    let manifest = match &cfg.manifest_path {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("could not open manifest '{}'", path.display()))?;
            let manifest = match cfg.manifest_queue {
                Some(capacity) => Manifest::with_capacity(file, capacity),
                None => Manifest::create(file),
            };
            pool.set_output(manifest.sender());
            Some(manifest)
        }
        None => None,
    };

    for _ in 0..workers {
        pool.start();
    }

    let printer = board.spawn_printer();

    for file in vhost.files {
        debug_assert!(!file.path.is_empty(), "ingestion must drop empty paths");
        tx.send(Some(file))
            .await
            .map_err(|_| anyhow!("work queue closed before all files were enqueued"))?;
    }
    // One sentinel per started worker, after all real entries.
    for _ in 0..workers {
        tx.send(None)
            .await
            .map_err(|_| anyhow!("work queue closed before all sentinels were sent"))?;
    }

    pool.wait().await;

    board.quit();
    let _ = printer.await;

    if let Some(manifest) = manifest {
        manifest.close().await;
    }

    tracing::info!("{}", board);
    Ok(board)
}
