//! Background transcription worker.
//!
//! A [`TranscriptionWorker`] owns one producer thread that keeps pulling text
//! fragments from a blocking [`FragmentSource`] and appends them to a FIFO
//! queue. A consumer thread (typically a UI refresh loop) polls the queue with
//! [`TranscriptionWorker::has_pending`] and drains it with
//! [`TranscriptionWorker::take`], neither of which ever blocks on the source.
//!
//! ```text
//!  ┌────────────────┐  fetch_next_fragment  ┌───────────────────┐
//!  │ FragmentSource │◀──────────────────────│  producer thread  │
//!  └────────────────┘                       └─────────┬─────────┘
//!                                                     │ push_back
//!                                           ┌─────────▼─────────┐
//!                                           │  Mutex<VecDeque>  │
//!                                           └─────────┬─────────┘
//!                                                     │ pop_front
//!                                           ┌─────────▼─────────┐
//!                                           │  consumer (take)  │
//!                                           └───────────────────┘
//! ```
//!
//! Cancellation is cooperative: [`TranscriptionWorker::stop`] raises a flag
//! that the producer checks between fetches, so a fetch already in flight is
//! never interrupted.

mod error;
pub mod logging;
pub mod settings;
mod source;
mod worker;

pub use error::{SourceFault, WorkerError};
pub use settings::{LogLevel, WorkerSettings};
pub use source::{ChannelSource, FragmentSource};
pub use worker::{FaultReporter, LogReporter, TranscriptionWorker, WorkerState};
