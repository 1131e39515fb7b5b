//! Session management
//!
//! Runs the story on a single worker thread and reports how it ended.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::bridge::{OutputSink, OutputWriter};
use super::event::HostEvent;
use super::prompt::{self, PromptReader, Submitter};

/// Text written when the story reaches one of its endings
pub const GAME_ENDED: &str = "\n[Game ended]\n";

/// Written ahead of every exit report so it never inherits the story's style
const RESET_STYLE: &str = "\x1b[0m";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("a game is already running")]
    AlreadyRunning,

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),
}

/// What the worker is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    Idle,
    Running,
    AwaitingInput,
}

impl WorkerPhase {
    pub fn label(self) -> &'static str {
        match self {
            WorkerPhase::Idle => "READY",
            WorkerPhase::Running => "RUNNING",
            WorkerPhase::AwaitingInput => "AWAITING INPUT",
        }
    }
}

/// A story session: at most one worker at a time
pub struct Session {
    /// Id handed to the next run
    next_run: u64,
    /// Running flag
    running: Arc<AtomicBool>,
    /// Set while the worker is blocked in `read_line`
    awaiting: Option<Arc<AtomicBool>>,
    /// Input queue of the current run
    submitter: Option<Submitter>,
    /// Worker thread handle
    worker: Option<JoinHandle<()>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            next_run: 1,
            running: Arc::new(AtomicBool::new(false)),
            awaiting: None,
            submitter: None,
            worker: None,
        }
    }

    /// Start a new run of `story` on a worker thread.
    ///
    /// Each run gets a fresh input queue. The outcome is written through
    /// `writer` and followed by [`HostEvent::WorkerExited`].
    pub fn start<F>(
        &mut self,
        writer: OutputWriter,
        events: Sender<HostEvent>,
        story: F,
    ) -> Result<u64, SessionError>
    where
        F: FnOnce(&OutputWriter, &mut PromptReader) -> anyhow::Result<()> + Send + 'static,
    {
        if self.is_running() {
            return Err(SessionError::AlreadyRunning);
        }
        self.reap();

        let run = self.next_run;
        self.next_run += 1;

        let (submitter, mut reader) = prompt::channel(writer.clone());
        let awaiting = reader.awaiting_flag();
        self.running.store(true, Ordering::SeqCst);

        let running = self.running.clone();
        let spawned = thread::Builder::new()
            .name(format!("story-{run}"))
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| story(&writer, &mut reader)));

                let report = match result {
                    Ok(Ok(())) => {
                        info!("Run {} finished", run);
                        GAME_ENDED.to_string()
                    }
                    Ok(Err(e)) => {
                        warn!("Run {} failed: {:#}", run, e);
                        format!("\n[Error] {e:#}\n")
                    }
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        error!("Run {} panicked: {}", run, message);
                        format!("\n[Error] {message}\n")
                    }
                };

                writer.write(RESET_STYLE);
                writer.write(&report);
                running.store(false, Ordering::SeqCst);
                let _ = events.send(HostEvent::WorkerExited { run });
            });

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                self.submitter = Some(submitter);
                self.awaiting = Some(awaiting);
                info!("Run {} started", run);
                Ok(run)
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                Err(SessionError::Spawn(e))
            }
        }
    }

    /// Check if a worker is active
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn phase(&self) -> WorkerPhase {
        if !self.is_running() {
            return WorkerPhase::Idle;
        }
        match &self.awaiting {
            Some(flag) if flag.load(Ordering::SeqCst) => WorkerPhase::AwaitingInput,
            _ => WorkerPhase::Running,
        }
    }

    /// Hand a submitted line to the running story.
    ///
    /// Returns `false` (and drops the line) when no story is running.
    pub fn submit(&self, value: String) -> bool {
        match &self.submitter {
            Some(submitter) if self.is_running() => submitter.submit(value),
            _ => {
                debug!("No run active, dropping input {:?}", value);
                false
            }
        }
    }

    /// Join a finished worker. Returns `true` if one was reaped.
    pub fn reap(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.submitter = None;
        self.awaiting = None;
        match self.worker.take() {
            Some(handle) => {
                if handle.join().is_err() {
                    // Panics are caught inside the worker; this is unexpected
                    error!("Worker thread panicked outside the story");
                }
                true
            }
            None => false,
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Closing the queue unblocks a worker waiting for input
        self.submitter = None;

        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
