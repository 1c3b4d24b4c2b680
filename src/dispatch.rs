//! Task queue, worker thread and the dispatcher service object
//!
//! Producers append to a FIFO queue; a single background worker drains it
//! and renders each task to the console and log file. The worker holds the
//! queue guard across the whole read-rotate-render-pop sequence, so at most
//! one task is ever in flight and an observably empty queue means every
//! enqueued line has fully reached its outputs.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, JoinHandle};

use crate::console::{self, ConsoleBackend, SilentBackend};
use crate::level::Level;
use crate::logger::Logger;
use crate::render;
use crate::rotate::{self, RotatingLogFile};

/// Name given to the background worker thread
const WORKER_NAME: &str = "tintlog-worker";

/// Callback invoked after each rendered line with the original text and a
/// copy with all color codes stripped
pub(crate) type OnLog = dyn Fn(&str, &str) + Send + Sync;

/// One pending log entry, owned by the queue until the worker renders it
pub(crate) struct LogTask {
    /// Logger name, possibly empty, possibly carrying color codes
    pub name: String,
    /// Fully rendered message text; may contain color codes and newlines
    pub message: String,
    pub level: Level,
}

/// Queue contents behind [`Shared::queue`]
struct Queue {
    tasks: VecDeque<LogTask>,
    /// Set when the dispatcher shuts down; the worker drains and exits, and
    /// later enqueues are discarded
    shutdown: bool,
}

/// State shared between producers, the worker and the dispatcher handle
pub(crate) struct Shared {
    queue: Mutex<Queue>,
    /// Signaled for every enqueued task and on shutdown
    task_ready: Condvar,
    /// Signaled whenever the queue drains to empty
    drained: Condvar,
    /// Slot for the per-line callback
    callback: Mutex<Option<Arc<OnLog>>>,
}

impl Shared {
    fn new() -> Self {
        Self {
            queue: Mutex::new(Queue {
                tasks: VecDeque::new(),
                shutdown: false,
            }),
            task_ready: Condvar::new(),
            drained: Condvar::new(),
            callback: Mutex::new(None),
        }
    }

    /// Take the queue guard, shrugging off poisoning: a thread that
    /// panicked near the queue must not take logging down with it
    fn lock_queue(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a task at the tail and wake the worker.
    ///
    /// Blocks only for the critical section, though that includes any
    /// render currently holding the guard.
    pub(crate) fn enqueue(&self, task: LogTask) {
        let mut queue = self.lock_queue();
        if queue.shutdown {
            // Nothing will ever drain this queue again
            return;
        }
        queue.tasks.push_back(task);
        drop(queue);
        self.task_ready.notify_one();
    }

    /// Block the calling thread until the queue is observably empty
    pub(crate) fn wait(&self) {
        let mut queue = self.lock_queue();
        while !queue.tasks.is_empty() {
            queue = self
                .drained
                .wait(queue)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub(crate) fn set_on_log(&self, callback: Arc<OnLog>) {
        *self
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(callback);
    }

    fn callback(&self) -> Option<Arc<OnLog>> {
        self.callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Owner of one delivery pipeline: the queue, the worker thread and the
/// worker's console backend and file rotator.
///
/// Dropping a dispatcher renders everything still queued, then stops and
/// joins the worker. The process-global dispatcher behind [`Logger::new`]
/// lives in static storage and is never dropped; its worker runs until the
/// process exits.
pub struct Dispatcher {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl Dispatcher {
    /// Start configuring a dispatcher
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Create a logger bound to this dispatcher
    pub fn logger(&self, name: impl Into<String>) -> Logger {
        Logger::with_shared(name.into(), Arc::clone(&self.shared))
    }

    /// Block until every queued task has been rendered.
    ///
    /// There is no timeout: if other threads keep logging faster than the
    /// worker drains, this never returns.
    pub fn wait(&self) {
        self.shared.wait();
    }

    /// Register a callback invoked after each rendered line with the
    /// original text and a color-stripped copy.
    ///
    /// The callback runs on the worker thread while the queue guard is
    /// held: logging or calling [`wait`](Dispatcher::wait) from inside it
    /// deadlocks. Panics in the callback are caught and discarded.
    pub fn set_on_log(&self, callback: impl Fn(&str, &str) + Send + Sync + 'static) {
        self.shared.set_on_log(Arc::new(callback));
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        {
            let mut queue = self.shared.lock_queue();
            queue.shutdown = true;
        }
        self.shared.task_ready.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Configuration for a [`Dispatcher`]; all settings are programmatic
pub struct Builder {
    logs_dir: PathBuf,
    file_output: bool,
    console_output: bool,
}

impl Builder {
    fn new() -> Self {
        Self {
            logs_dir: rotate::default_logs_dir(),
            file_output: true,
            console_output: true,
        }
    }

    /// Directory the log files live in; defaults to `logs` next to the
    /// running executable
    pub fn logs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.logs_dir = dir.into();
        self
    }

    /// Mirror entries into `latest.log`, on by default
    pub fn file_output(mut self, enabled: bool) -> Self {
        self.file_output = enabled;
        self
    }

    /// Render entries to the terminal, on by default.
    ///
    /// Disabling this forces the silent backend even when stderr is an
    /// interactive terminal, leaving file output as the only sink.
    pub fn console_output(mut self, enabled: bool) -> Self {
        self.console_output = enabled;
        self
    }

    /// Spawn the worker thread and hand out the dispatcher
    pub fn build(self) -> Dispatcher {
        let console: Box<dyn ConsoleBackend> = if self.console_output {
            console::detect()
        } else {
            Box::new(SilentBackend)
        };
        let rotator = self
            .file_output
            .then(|| RotatingLogFile::new(self.logs_dir));

        let shared = Arc::new(Shared::new());
        let for_worker = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || worker_loop(for_worker, console, rotator))
            .ok();
        if worker.is_none() {
            // No worker will ever drain the queue; refuse tasks instead of
            // growing it without bound
            shared.lock_queue().shutdown = true;
        }

        Dispatcher { shared, worker }
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: OnceLock<Dispatcher> = OnceLock::new();

/// The process-global dispatcher, spawned on first use with default
/// configuration
pub(crate) fn global() -> &'static Dispatcher {
    GLOBAL.get_or_init(|| Dispatcher::builder().build())
}

/// The process-global dispatcher, if one has been spawned
pub(crate) fn try_global() -> Option<&'static Dispatcher> {
    GLOBAL.get()
}

/// Drain loop run by the worker thread.
///
/// Tasks are rendered strictly in queue order. The guard is released only
/// while parked waiting for work, so producers may briefly block on enqueue
/// while a render is in flight; in exchange, console and file writes of one
/// task never interleave with another's.
fn worker_loop(
    shared: Arc<Shared>,
    mut console: Box<dyn ConsoleBackend>,
    mut rotator: Option<RotatingLogFile>,
) {
    lower_priority();

    if let Some(rotator) = rotator.as_mut() {
        rotator.open(rotate::today());
    }

    let mut queue = shared.lock_queue();
    loop {
        while queue.tasks.is_empty() && !queue.shutdown {
            queue = shared
                .task_ready
                .wait(queue)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if queue.tasks.is_empty() {
            // Shutdown with nothing left to render
            shared.drained.notify_all();
            return;
        }

        if let Some(rotator) = rotator.as_mut() {
            rotator.rotate_if_stale(rotate::today());
        }

        let callback = shared.callback();
        if let Some(task) = queue.tasks.front() {
            render::render_task(
                task,
                console.as_mut(),
                rotator.as_mut().and_then(RotatingLogFile::handle),
                callback.as_ref(),
            );
        }
        queue.tasks.pop_front();

        if queue.tasks.is_empty() {
            shared.drained.notify_all();
        }
    }
}

/// Drop the worker to the lowest scheduling priority; log delivery should
/// yield to the process's real work. Best effort, the result is ignored.
#[cfg(target_os = "linux")]
fn lower_priority() {
    // The target is a thread id, so only the worker is affected
    unsafe {
        libc::setpriority(libc::PRIO_PROCESS as _, libc::gettid() as _, 19);
    }
}

#[cfg(not(target_os = "linux"))]
fn lower_priority() {}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use tempfile::TempDir;

    use super::*;

    fn quiet_dispatcher() -> Dispatcher {
        Dispatcher::builder()
            .console_output(false)
            .file_output(false)
            .build()
    }

    fn collect_stripped(dispatcher: &Dispatcher) -> Arc<Mutex<Vec<String>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        dispatcher.set_on_log(move |_, stripped| {
            sink.lock().unwrap().push(stripped.to_string());
        });
        seen
    }

    #[test]
    fn test_single_producer_order_is_exact() {
        let dispatcher = quiet_dispatcher();
        let seen = collect_stripped(&dispatcher);
        let logger = dispatcher.logger("");

        for i in 0..100 {
            logger.info(format!("message {i}"));
        }
        dispatcher.wait();

        let expected: Vec<String> = (0..100).map(|i| format!("message {i}")).collect();
        assert_eq!(*seen.lock().unwrap(), expected);
    }

    #[test]
    fn test_multi_producer_subsequences_are_preserved() {
        let dispatcher = quiet_dispatcher();
        let seen = collect_stripped(&dispatcher);

        let producers: Vec<_> = (0..4)
            .map(|p| {
                let logger = dispatcher.logger("");
                thread::spawn(move || {
                    for i in 0..50 {
                        logger.info(format!("p{p} {i}"));
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }
        dispatcher.wait();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 200);
        for p in 0..4 {
            let prefix = format!("p{p} ");
            let of_producer: Vec<&str> = seen
                .iter()
                .filter(|line| line.starts_with(&prefix))
                .map(String::as_str)
                .collect();
            let expected: Vec<String> = (0..50).map(|i| format!("p{p} {i}")).collect();
            assert_eq!(of_producer, expected);
        }
    }

    #[test]
    fn test_wait_returns_after_everything_rendered() {
        let dispatcher = quiet_dispatcher();
        let rendered = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&rendered);
        dispatcher.set_on_log(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let logger = dispatcher.logger("drain");

        for _ in 0..32 {
            logger.info("pending");
        }
        dispatcher.wait();

        assert_eq!(rendered.load(Ordering::SeqCst), 32);
    }

    #[test]
    fn test_wait_on_idle_queue_returns_immediately() {
        let dispatcher = quiet_dispatcher();
        dispatcher.wait();
    }

    #[test]
    fn test_wait_observes_exact_counts_across_rounds() {
        let dispatcher = quiet_dispatcher();
        let rendered = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&rendered);
        dispatcher.set_on_log(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        for round in 0..20 {
            let producers: Vec<_> = (0..3)
                .map(|p| {
                    let logger = dispatcher.logger("round");
                    thread::spawn(move || {
                        for i in 0..10 {
                            logger.info(format!("r{round} p{p} {i}"));
                        }
                    })
                })
                .collect();
            for producer in producers {
                producer.join().unwrap();
            }
            dispatcher.wait();

            // Everything enqueued before this wait() must be rendered, and
            // nothing lost or duplicated in earlier rounds
            assert_eq!(rendered.load(Ordering::SeqCst), (round + 1) * 30);
        }
    }

    #[test]
    fn test_drop_drains_pending_tasks() {
        let rendered = Arc::new(AtomicUsize::new(0));
        {
            let dispatcher = quiet_dispatcher();
            let counter = Arc::clone(&rendered);
            dispatcher.set_on_log(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            let logger = dispatcher.logger("");
            for _ in 0..16 {
                logger.warn("going down");
            }
        }
        assert_eq!(rendered.load(Ordering::SeqCst), 16);
    }

    #[test]
    fn test_logging_after_shutdown_is_discarded() {
        let dispatcher = quiet_dispatcher();
        let logger = dispatcher.logger("late");
        drop(dispatcher);

        // The worker is gone; the call must neither block nor panic
        logger.error("nobody listening");
    }

    #[test]
    fn test_callback_runs_on_worker_thread() {
        let dispatcher = quiet_dispatcher();
        let name = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&name);
        dispatcher.set_on_log(move |_, _| {
            *sink.lock().unwrap() = thread::current().name().map(String::from);
        });

        dispatcher.logger("").info("where am I");
        dispatcher.wait();

        assert_eq!(name.lock().unwrap().as_deref(), Some(WORKER_NAME));
    }

    #[test]
    fn test_file_mirror_goes_through_rotator() {
        let dir = TempDir::new().unwrap();
        let dispatcher = Dispatcher::builder()
            .console_output(false)
            .logs_dir(dir.path())
            .build();
        let logger = dispatcher.logger("disk");

        logger.info("first §aline§r");
        logger.info("second line");
        dispatcher.wait();

        let contents = fs::read_to_string(dir.path().join("latest.log")).unwrap();
        let lines: Vec<&str> = contents.split_terminator('\n').collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("] [disk] first line"));
        assert!(lines[1].ends_with("] [disk] second line"));
        assert!(!contents.contains('§'));
    }

    #[test]
    fn test_unwritable_logs_dir_still_renders() {
        let dir = TempDir::new().unwrap();
        let blocked = dir.path().join("blocked");
        fs::write(&blocked, "file, not a directory").unwrap();

        let dispatcher = Dispatcher::builder()
            .console_output(false)
            .logs_dir(&blocked)
            .build();
        let seen = collect_stripped(&dispatcher);

        dispatcher.logger("").info("still here");
        dispatcher.wait();

        assert_eq!(seen.lock().unwrap().as_slice(), ["still here"]);
    }

    #[test]
    fn test_file_output_disabled_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let dispatcher = Dispatcher::builder()
            .console_output(false)
            .file_output(false)
            .logs_dir(dir.path())
            .build();

        dispatcher.logger("").info("console only");
        dispatcher.wait();
        drop(dispatcher);

        assert!(!dir.path().join("latest.log").exists());
    }
}
