//! Probe worker pool: N concurrent workers draining a shared work queue.
//!
//! The queue carries `Option<FileEntry>`; `None` is the shutdown sentinel.
//! The producer sends exactly one sentinel per started worker, after every
//! real entry — the channel itself is never closed, so real work and
//! termination signals share one queue. An extra or missing sentinel is a
//! programming error of the producer, not a runtime condition the pool
//! tolerates silently.
//!
//! Probes run blocking curl via `spawn_blocking`; a file's failure never
//! aborts the pool or other workers.

use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

use crate::checksum::HashKind;
use crate::model::{FileEntry, FileStatus, StatusMark, VHost};
use crate::probe::{self, ProbeTimeouts};
use crate::status::StatusBoard;

/// Producer side of the work queue.
pub type WorkSender = mpsc::Sender<Option<FileEntry>>;
/// Consumer side of the work queue, shared across workers.
pub type WorkReceiver = mpsc::Receiver<Option<FileEntry>>;

/// Creates the work queue shared by the producer and the pool. Capacity 1 is
/// the closest bounded analogue of an unbuffered channel: the producer can
/// stay at most one entry ahead of the pool, so feeding the queue is natural
/// admission control.
pub fn work_queue() -> (WorkSender, WorkReceiver) {
    mpsc::channel(1)
}

/// Per-run probe options.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Verify (or, for manifest creation, record) content checksums.
    pub checksum: bool,
    /// Hash strategy used when `checksum` is set.
    pub hash: HashKind,
    pub timeouts: ProbeTimeouts,
}

impl CheckOptions {
    fn verify(&self) -> Option<HashKind> {
        self.checksum.then_some(self.hash)
    }
}

/// Fixed pool of probe workers bound to one target server and one vhost.
pub struct WorkerPool {
    server: String,
    hostname: String,
    board: StatusBoard,
    queue: Arc<Mutex<WorkReceiver>>,
    options: CheckOptions,
    output: Option<mpsc::Sender<FileStatus>>,
    workers: JoinSet<()>,
}

impl WorkerPool {
    pub fn new(
        vhost: &VHost,
        server: &str,
        board: StatusBoard,
        queue: WorkReceiver,
        options: CheckOptions,
    ) -> WorkerPool {
        WorkerPool {
            server: server.to_string(),
            hostname: vhost.hostname.clone(),
            board,
            queue: Arc::new(Mutex::new(queue)),
            options,
            output: None,
            workers: JoinSet::new(),
        }
    }

    /// Attaches a manifest record sink. Call before `start`; workers started
    /// earlier will not see it.
    pub fn set_output(&mut self, sink: mpsc::Sender<FileStatus>) {
        self.output = Some(sink);
    }

    /// Spawns one additional probe worker bound to this pool's queue.
    /// Call N times to reach the desired concurrency.
    pub fn start(&mut self) {
        let ctx = WorkerContext {
            server: self.server.clone(),
            hostname: self.hostname.clone(),
            board: self.board.clone(),
            queue: Arc::clone(&self.queue),
            options: self.options.clone(),
            output: self.output.clone(),
        };
        self.workers.spawn(worker_loop(ctx));
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Waits for every started worker to observe its sentinel and exit.
    /// Consumes the pool: no outcome can be reported after this returns.
    pub async fn wait(mut self) {
        while let Some(res) = self.workers.join_next().await {
            if let Err(e) = res {
                tracing::error!("probe worker task failed: {}", e);
            }
        }
    }
}

struct WorkerContext {
    server: String,
    hostname: String,
    board: StatusBoard,
    queue: Arc<Mutex<WorkReceiver>>,
    options: CheckOptions,
    output: Option<mpsc::Sender<FileStatus>>,
}

async fn worker_loop(ctx: WorkerContext) {
    loop {
        // Hold the queue lock only for the receive; probing runs unlocked so
        // the other workers keep draining.
        let item = ctx.queue.lock().await.recv().await;
        let entry = match item {
            Some(Some(entry)) => entry,
            // Sentinel: no more work for this worker.
            Some(None) => break,
            // Producer gone without sentinels; treat as shutdown.
            None => {
                tracing::warn!("work queue closed without sentinel");
                break;
            }
        };

        let outcome = probe_one(&ctx, entry).await;

        // A manifest records verified-good files, not failures. The send is
        // best-effort: a full queue drops the record rather than stalling
        // the probe loop.
        if outcome.status.is_ok() {
            if let Some(sink) = &ctx.output {
                match sink.try_send(outcome.clone()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::warn!(path = %outcome.path, "manifest queue full, record dropped");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        tracing::warn!(path = %outcome.path, "manifest writer gone, record dropped");
                    }
                }
            }
        }

        ctx.board.report(outcome);
    }
}

/// Probes one file and classifies the result. Transport failures are
/// classified, never propagated: a probe must not kill the worker.
async fn probe_one(ctx: &WorkerContext, mut entry: FileEntry) -> FileStatus {
    entry.last_checked = Some(SystemTime::now());

    let server = ctx.server.clone();
    let hostname = ctx.hostname.clone();
    let path = entry.path.clone();
    let timeouts = ctx.options.timeouts;

    let result =
        tokio::task::spawn_blocking(move || probe::fetch(&server, &hostname, &path, timeouts))
            .await;

    let outcome = match result {
        Ok(probe_result) => probe::classify(&entry, &probe_result, ctx.options.verify()),
        Err(e) => {
            tracing::error!(path = %entry.path, "probe task failed: {}", e);
            FileStatus {
                path: entry.path.clone(),
                checksum: None,
                size: None,
                last_modified: None,
                status: StatusMark::RequestError,
            }
        }
    };

    entry.cached = outcome.status.is_present();
    tracing::debug!(
        path = %outcome.path,
        status = %outcome.status,
        cached = entry.cached,
        "probed"
    );
    outcome
}
