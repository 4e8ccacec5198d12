use crate::error::{SourceFault, WorkerError};
use crate::settings::WorkerSettings;
use crate::source::FragmentSource;
use anyhow::anyhow;
use log::{debug, error, info, warn};
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

/// Receives source faults observed by the producer thread.
pub trait FaultReporter: Send + Sync {
    fn report(&self, fault: &SourceFault);
}

/// Default reporter: writes the fault to the `log` facade.
pub struct LogReporter;

impl FaultReporter for LogReporter {
    fn report(&self, fault: &SourceFault) {
        error!("{}", fault);
    }
}

/// Lifecycle of a worker as seen from the consumer side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// `start` has not been called
    Idle,
    /// Producer thread is alive
    Running,
    /// Producer ended on its own, after a source fault or panic
    Exited,
    /// `stop` was requested and the producer is gone
    Stopped,
}

type FragmentQueue = Arc<Mutex<VecDeque<String>>>;

/// Pulls fragments from a [`FragmentSource`] on a background thread and queues
/// them for a polling consumer.
///
/// The producer thread is the only writer to the queue and [`take`] is the
/// only way items leave it. The stop flag goes from `false` to `true` once
/// and never back, so a stopped worker cannot be restarted; build a new one.
///
/// [`take`]: TranscriptionWorker::take
pub struct TranscriptionWorker {
    source: Arc<dyn FragmentSource>,
    reporter: Arc<dyn FaultReporter>,
    settings: WorkerSettings,

    /// Set once by `stop` (or drop), checked by the producer between fetches
    stop_requested: Arc<AtomicBool>,

    /// True from spawn until the producer thread returns or unwinds
    producer_alive: Arc<AtomicBool>,

    /// Completed fragments, oldest first
    buffer: FragmentQueue,

    started: AtomicBool,
    producer: Mutex<Option<JoinHandle<()>>>,
}

impl TranscriptionWorker {
    pub fn new(source: Arc<dyn FragmentSource>) -> Self {
        Self::with_settings(source, WorkerSettings::default())
    }

    pub fn with_settings(source: Arc<dyn FragmentSource>, settings: WorkerSettings) -> Self {
        Self {
            source,
            reporter: Arc::new(LogReporter),
            settings,
            stop_requested: Arc::new(AtomicBool::new(false)),
            producer_alive: Arc::new(AtomicBool::new(false)),
            buffer: Arc::new(Mutex::new(VecDeque::new())),
            started: AtomicBool::new(false),
            producer: Mutex::new(None),
        }
    }

    /// Routes source faults to `reporter` instead of the log.
    pub fn with_reporter(mut self, reporter: Arc<dyn FaultReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Spawns the producer thread and returns without waiting for it.
    ///
    /// The thread may already be inside the source by the time this returns.
    pub fn start(&self) -> Result<(), WorkerError> {
        let mut producer = lock(&self.producer);

        if self.started.load(Ordering::Acquire) {
            return Err(WorkerError::AlreadyStarted);
        }
        if self.stop_requested.load(Ordering::Acquire) {
            return Err(WorkerError::Stopped);
        }

        let context = ProducerContext {
            name: self.settings.thread_name.clone(),
            source: Arc::clone(&self.source),
            reporter: Arc::clone(&self.reporter),
            stop_requested: Arc::clone(&self.stop_requested),
            buffer: Arc::clone(&self.buffer),
        };
        let alive = AliveGuard::raise(Arc::clone(&self.producer_alive));

        let handle = thread::Builder::new()
            .name(self.settings.thread_name.clone())
            .spawn(move || {
                let _alive = alive;
                run_production_loop(context);
            })?;

        self.started.store(true, Ordering::Release);
        *producer = Some(handle);
        info!("Transcription worker '{}' started", self.settings.thread_name);
        Ok(())
    }

    /// Asks the producer to finish and blocks until it has.
    ///
    /// The producer only sees the request between fetches, so this waits for
    /// any fetch already in flight to return. Once it returns nothing else is
    /// appended to the queue. Calling it again, or on a worker that never
    /// started, does nothing.
    pub fn stop(&self) {
        if !self.stop_requested.swap(true, Ordering::AcqRel) {
            debug!("Stop requested for '{}'", self.settings.thread_name);
        }

        let handle = lock(&self.producer).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!(
                    "Transcription thread '{}' panicked before it could be joined",
                    self.settings.thread_name
                );
            }
            info!("Transcription worker '{}' stopped", self.settings.thread_name);
        }
    }

    /// Whether the producer thread is still alive.
    ///
    /// Observing `false` without having called [`stop`](Self::stop) means
    /// the producer died on a source fault.
    pub fn is_running(&self) -> bool {
        self.producer_alive.load(Ordering::Acquire)
    }

    /// True when no completed fragment is waiting, i.e. output is still in
    /// progress. The answer can go stale as soon as the lock is released.
    pub fn has_pending(&self) -> bool {
        lock(&self.buffer).is_empty()
    }

    /// Removes and returns the oldest queued fragment, or an empty string when
    /// the queue is empty. Never blocks on the source.
    pub fn take(&self) -> String {
        lock(&self.buffer).pop_front().unwrap_or_default()
    }

    pub fn state(&self) -> WorkerState {
        if self.is_running() {
            WorkerState::Running
        } else if !self.started.load(Ordering::Acquire) {
            WorkerState::Idle
        } else if self.stop_requested.load(Ordering::Acquire) {
            WorkerState::Stopped
        } else {
            WorkerState::Exited
        }
    }
}

impl Drop for TranscriptionWorker {
    fn drop(&mut self) {
        // A source call cannot be interrupted, so dropping only signals the
        // producer and leaves it to exit after its current fetch.
        self.stop_requested.store(true, Ordering::Release);
        if self.is_running() {
            warn!(
                "Transcription worker '{}' dropped while running; producer detached",
                self.settings.thread_name
            );
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the liveness flag when the producer thread finishes, including when
/// it unwinds.
struct AliveGuard(Arc<AtomicBool>);

impl AliveGuard {
    fn raise(flag: Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct ProducerContext {
    name: String,
    source: Arc<dyn FragmentSource>,
    reporter: Arc<dyn FaultReporter>,
    stop_requested: Arc<AtomicBool>,
    buffer: FragmentQueue,
}

fn run_production_loop(ctx: ProducerContext) {
    let mut appended: u64 = 0;

    while !ctx.stop_requested.load(Ordering::Acquire) {
        let fetched = panic::catch_unwind(AssertUnwindSafe(|| ctx.source.fetch_next_fragment()))
            .unwrap_or_else(|payload| Err(anyhow!("source panicked: {}", panic_message(&*payload))));

        match fetched {
            Ok(fragment) if fragment.is_empty() => {}
            Ok(fragment) => {
                debug!("Buffered fragment: '{}'", fragment);
                lock(&ctx.buffer).push_back(fragment);
                appended += 1;
            }
            Err(error) => {
                ctx.reporter.report(&SourceFault {
                    worker: ctx.name.clone(),
                    appended,
                    error,
                });
                break;
            }
        }
    }

    debug!(
        "Transcription thread '{}' exiting after {} fragment(s)",
        ctx.name, appended
    );
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
