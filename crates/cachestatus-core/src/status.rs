//! Thread-safe status board: collection point for probe outcomes.
//!
//! All workers report into one board; the only shared mutable state in a run
//! lives behind its mutex. A background printer task periodically logs
//! progress until told to quit.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

use crate::model::FileStatus;

/// How often the background printer logs a progress line.
const PRINT_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
struct BoardState {
    status: BTreeMap<String, FileStatus>,
    bad_files: Vec<String>,
}

#[derive(Debug)]
struct Inner {
    total: usize,
    state: Mutex<BoardState>,
    quit: watch::Sender<bool>,
}

/// Cheaply cloneable handle to the shared board. Safe for concurrent
/// `report` calls from all workers immediately after construction.
#[derive(Debug, Clone)]
pub struct StatusBoard {
    inner: Arc<Inner>,
}

/// Serializable snapshot of the full board, suitable as an HTTP response
/// body or for assertions in tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    /// Files enqueued for this run.
    pub total: usize,
    /// Outcomes reported so far.
    pub processed: usize,
    /// Outcome per path.
    pub status: BTreeMap<String, FileStatus>,
    /// Paths of non-OK outcomes, in arrival order across workers.
    pub bad_files: Vec<String>,
}

impl StatusBoard {
    /// `expected_count` is the number of files that will be enqueued; the
    /// board never reports more outcomes than that (each path is reported
    /// at most once, by the single worker that probed it).
    pub fn new(expected_count: usize) -> StatusBoard {
        let (quit, _) = watch::channel(false);
        StatusBoard {
            inner: Arc::new(Inner {
                total: expected_count,
                state: Mutex::new(BoardState::default()),
                quit,
            }),
        }
    }

    /// Records one outcome. Non-OK outcomes are also appended to the
    /// bad-file list, which reflects completion order, not file-list order.
    pub fn report(&self, outcome: FileStatus) {
        let mut state = self.inner.state.lock().unwrap();
        if !outcome.status.is_ok() {
            state.bad_files.push(outcome.path.clone());
        }
        state.status.insert(outcome.path.clone(), outcome);
    }

    pub fn total(&self) -> usize {
        self.inner.total
    }

    pub fn processed(&self) -> usize {
        self.inner.state.lock().unwrap().status.len()
    }

    pub fn bad_count(&self) -> usize {
        self.inner.state.lock().unwrap().bad_files.len()
    }

    /// True when every reported outcome was OK (an empty run is clean).
    pub fn is_clean(&self) -> bool {
        self.bad_count() == 0
    }

    pub fn snapshot(&self) -> StatusReport {
        let state = self.inner.state.lock().unwrap();
        StatusReport {
            total: self.inner.total,
            processed: state.status.len(),
            status: state.status.clone(),
            bad_files: state.bad_files.clone(),
        }
    }

    /// Starts the background progress printer. It logs on a fixed interval
    /// and exits its loop when `quit` is signalled or every board handle is
    /// gone; the returned handle completes once the task has stopped.
    pub fn spawn_printer(&self) -> tokio::task::JoinHandle<()> {
        let board = self.clone();
        let mut quit = self.inner.quit.subscribe();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(PRINT_INTERVAL);
            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        let (processed, bad) = {
                            let state = board.inner.state.lock().unwrap();
                            (state.status.len(), state.bad_files.len())
                        };
                        tracing::info!(
                            "{}/{} files processed ({} bad)",
                            processed,
                            board.inner.total,
                            bad
                        );
                    }
                    res = quit.changed() => {
                        // Signalled or sender dropped: stop the task, not
                        // just this wait.
                        let _ = res;
                        break;
                    }
                }
            }
        })
    }

    /// Signals the printer to stop. Must not deadlock if the printer has
    /// already exited; the watch send result is deliberately ignored.
    pub fn quit(&self) {
        let _ = self.inner.quit.send(true);
    }
}

impl fmt::Display for StatusBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock().unwrap();
        write!(
            f,
            "checked {} of {} files, {} bad",
            state.status.len(),
            self.inner.total,
            state.bad_files.len()
        )
    }
}
