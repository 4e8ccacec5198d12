use thiserror::Error;

/// Lifecycle misuse and thread creation failures surfaced to the caller.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("transcription worker was already started")]
    AlreadyStarted,
    #[error("transcription worker was stopped and cannot be started again")]
    Stopped,
    #[error("failed to spawn transcription thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// A failure raised by the source while the producer was fetching.
///
/// Source faults never reach the consumer directly. The producer hands them
/// to the configured [`FaultReporter`](crate::FaultReporter) and exits.
#[derive(Debug, Error)]
#[error("source fault on '{worker}' after {appended} fragment(s): {error:#}")]
pub struct SourceFault {
    /// Name of the producer thread that observed the fault.
    pub worker: String,
    /// Fragments appended to the queue before the fault.
    pub appended: u64,
    pub error: anyhow::Error,
}
