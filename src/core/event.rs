//! Events sent from worker-side code to the UI loop

/// Host events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Output is waiting in the pending buffer
    Output,
    /// The story worker for the given run has finished
    WorkerExited { run: u64 },
}
