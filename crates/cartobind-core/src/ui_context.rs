//! The UI scheduling context.
//!
//! [`UiContext`] is the single logical UI thread of the bridge. It owns a
//! task queue (fed from any thread) and a one-shot timer queue, and it only
//! runs work when its owner thread drives it through
//! [`process_pending`](UiContext::process_pending) or
//! [`run_until`](UiContext::run_until).
//!
//! Time comes from a [`Clock`]. Production code uses [`SystemClock`]; tests
//! inject a [`ManualClock`] to step through coalescing windows
//! deterministically.
//!
//! # Example
//!
//! ```
//! use cartobind_core::{ManualClock, UiContext};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let ui = UiContext::with_clock(clock.clone());
//!
//! let fired = Arc::new(AtomicBool::new(false));
//! let fired_clone = fired.clone();
//! ui.schedule_after(Duration::from_millis(10), move || {
//!     fired_clone.store(true, Ordering::SeqCst);
//! });
//!
//! ui.process_pending();
//! assert!(!fired.load(Ordering::SeqCst));
//!
//! clock.advance(Duration::from_millis(10));
//! ui.process_pending();
//! assert!(fired.load(Ordering::SeqCst));
//! ```

use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::error::{Result, SchedulerError};
use crate::logging::targets;
use crate::thread_check::ThreadAffinity;

new_key_type! {
    /// A unique identifier for a scheduled UI task.
    pub struct ScheduledTaskId;
}

/// A source of monotonic time.
pub trait Clock: Send + Sync + 'static {
    /// The current instant.
    fn now(&self) -> Instant;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<ManualClockState>,
}

#[derive(Debug)]
struct ManualClockState {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    /// A clock frozen at the moment of creation.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ManualClockState {
                origin: Instant::now(),
                elapsed: Mutex::new(Duration::ZERO),
            }),
        }
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        *self.inner.elapsed.lock() += by;
    }

    /// Time elapsed since creation.
    pub fn elapsed(&self) -> Duration {
        *self.inner.elapsed.lock()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.inner.origin + *self.inner.elapsed.lock()
    }
}

type UiTask = Box<dyn FnOnce() + Send + 'static>;

enum UiMessage {
    Task(UiTask),
    /// Wakes a blocked `run_until` after a timer was scheduled.
    Wake,
}

struct ScheduledTask {
    run_at: Instant,
    task: UiTask,
}

/// An entry in the timer queue (min-heap by run time).
#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    id: ScheduledTaskId,
    run_at: Instant,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.run_at == other.run_at
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // Reverse order for min-heap (BinaryHeap is max-heap by default).
        other.run_at.cmp(&self.run_at)
    }
}

#[derive(Default)]
struct TimerQueue {
    tasks: SlotMap<ScheduledTaskId, ScheduledTask>,
    queue: BinaryHeap<QueueEntry>,
}

impl TimerQueue {
    fn insert(&mut self, run_at: Instant, task: UiTask) -> ScheduledTaskId {
        let id = self.tasks.insert(ScheduledTask { run_at, task });
        self.queue.push(QueueEntry { id, run_at });
        id
    }

    /// Drop cancelled entries from the front of the heap.
    fn prune(&mut self) {
        while let Some(entry) = self.queue.peek() {
            if self.tasks.contains_key(entry.id) {
                break;
            }
            self.queue.pop();
        }
    }

    fn next_deadline(&mut self) -> Option<Instant> {
        self.prune();
        self.queue.peek().map(|entry| entry.run_at)
    }

    fn pop_due(&mut self, now: Instant) -> Option<ScheduledTask> {
        loop {
            let entry = *self.queue.peek()?;
            if entry.run_at > now {
                return None;
            }
            self.queue.pop();
            if let Some(task) = self.tasks.remove(entry.id) {
                return Some(task);
            }
        }
    }
}

struct UiInner {
    clock: Arc<dyn Clock>,
    sender: Sender<UiMessage>,
    receiver: Receiver<UiMessage>,
    timers: Mutex<TimerQueue>,
    affinity: ThreadAffinity,
}

/// Handle to the UI scheduling context. Cheap to clone; every clone refers
/// to the same queues.
#[derive(Clone)]
pub struct UiContext {
    inner: Arc<UiInner>,
}

impl UiContext {
    /// Create a context owned by the current thread, using wall-clock time.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Create a context owned by the current thread with a custom clock.
    pub fn with_clock(clock: impl Clock) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            inner: Arc::new(UiInner {
                clock: Arc::new(clock),
                sender,
                receiver,
                timers: Mutex::new(TimerQueue::default()),
                affinity: ThreadAffinity::current(),
            }),
        }
    }

    /// The current instant according to this context's clock.
    pub fn now(&self) -> Instant {
        self.inner.clock.now()
    }

    /// Whether the calling thread owns this context.
    pub fn is_ui_thread(&self) -> bool {
        self.inner.affinity.is_same_thread()
    }

    /// Queue a task to run on the UI thread. Callable from any thread.
    pub fn post<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        // The receiver lives in `inner`, so the channel cannot be disconnected.
        let _ = self.inner.sender.send(UiMessage::Task(Box::new(task)));
    }

    /// Schedule a one-shot task `delay` from now.
    pub fn schedule_after<F>(&self, delay: Duration, task: F) -> ScheduledTaskId
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule_at(self.now() + delay, task)
    }

    /// Schedule a one-shot task at `instant`.
    pub fn schedule_at<F>(&self, instant: Instant, task: F) -> ScheduledTaskId
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.inner.timers.lock().insert(instant, Box::new(task));
        tracing::trace!(target: targets::UI_CONTEXT, ?id, "task scheduled");
        let _ = self.inner.sender.send(UiMessage::Wake);
        id
    }

    /// Cancel a scheduled task that has not run yet.
    pub fn cancel(&self, id: ScheduledTaskId) -> Result<()> {
        match self.inner.timers.lock().tasks.remove(id) {
            Some(_) => Ok(()),
            None => Err(SchedulerError::InvalidTaskId.into()),
        }
    }

    /// Number of scheduled tasks waiting to run.
    pub fn scheduled_count(&self) -> usize {
        self.inner.timers.lock().tasks.len()
    }

    /// Time until the next scheduled task is due, if any.
    pub fn time_until_next(&self) -> Option<Duration> {
        let deadline = self.inner.timers.lock().next_deadline()?;
        Some(deadline.saturating_duration_since(self.now()))
    }

    /// Run every posted task and every scheduled task that is due.
    ///
    /// Must be called from the owner thread. Returns the number of tasks run.
    #[tracing::instrument(skip(self), target = "cartobind_core::ui_context", level = "trace")]
    pub fn process_pending(&self) -> usize {
        self.inner
            .affinity
            .debug_assert_same_thread_with_msg("UiContext driven from a non-UI thread");

        let mut processed = 0;
        loop {
            match self.inner.receiver.try_recv() {
                Ok(UiMessage::Task(task)) => {
                    task();
                    processed += 1;
                }
                Ok(UiMessage::Wake) => {}
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }

        let now = self.now();
        loop {
            // Release the timer lock before running, tasks may schedule more.
            let due = self.inner.timers.lock().pop_due(now);
            let Some(scheduled) = due else { break };
            tracing::trace!(target: targets::UI_CONTEXT, late_by = ?now.saturating_duration_since(scheduled.run_at), "timer fired");
            (scheduled.task)();
            processed += 1;
        }

        processed
    }

    /// Drive the context until `done` returns `true` or `timeout` (wall-clock)
    /// elapses. Returns whether `done` was satisfied.
    pub fn run_until<F>(&self, mut done: F, timeout: Duration) -> bool
    where
        F: FnMut() -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            self.process_pending();
            if done() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let mut wait = deadline - now;
            if let Some(next) = self.time_until_next() {
                wait = wait.min(next.max(Duration::from_millis(1)));
            }
            match self.inner.receiver.recv_timeout(wait) {
                Ok(UiMessage::Task(task)) => task(),
                Ok(UiMessage::Wake) | Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return done(),
            }
        }
    }
}

impl Default for UiContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UiContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiContext")
            .field("owner", &self.inner.affinity.thread_id())
            .field("scheduled", &self.scheduled_count())
            .field("queued", &self.inner.receiver.len())
            .finish()
    }
}

static_assertions::assert_impl_all!(UiContext: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_post_runs_on_process() {
        let ui = UiContext::with_clock(ManualClock::new());
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let count = count.clone();
            ui.post(move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(ui.process_pending(), 3);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_timers_fire_in_deadline_order() {
        let clock = ManualClock::new();
        let ui = UiContext::with_clock(clock.clone());
        let order = Arc::new(Mutex::new(Vec::new()));

        for (delay, label) in [(30, "c"), (10, "a"), (20, "b")] {
            let order = order.clone();
            ui.schedule_after(ms(delay), move || order.lock().push(label));
        }

        assert_eq!(ui.time_until_next(), Some(ms(10)));
        clock.advance(ms(25));
        ui.process_pending();
        assert_eq!(*order.lock(), vec!["a", "b"]);

        clock.advance(ms(5));
        ui.process_pending();
        assert_eq!(*order.lock(), vec!["a", "b", "c"]);
        assert_eq!(ui.time_until_next(), None);
    }

    #[test]
    fn test_cancel_scheduled_task() {
        let clock = ManualClock::new();
        let ui = UiContext::with_clock(clock.clone());
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = count.clone();
        let id = ui.schedule_after(ms(10), move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(ui.scheduled_count(), 1);
        assert!(ui.cancel(id).is_ok());
        assert!(ui.cancel(id).is_err());

        clock.advance(ms(20));
        ui.process_pending();
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(ui.time_until_next(), None);
    }

    #[test]
    fn test_post_from_other_thread() {
        let ui = UiContext::new();
        let count = Arc::new(AtomicUsize::new(0));

        let ui_clone = ui.clone();
        let count_clone = count.clone();
        std::thread::spawn(move || {
            ui_clone.post(move || {
                count_clone.fetch_add(1, Ordering::SeqCst);
            });
        })
        .join()
        .unwrap();

        let done = ui.run_until(|| count.load(Ordering::SeqCst) == 1, Duration::from_secs(1));
        assert!(done);
    }

    #[test]
    fn test_run_until_times_out() {
        let ui = UiContext::new();
        assert!(!ui.run_until(|| false, ms(20)));
    }

    #[test]
    fn test_run_until_fires_wall_clock_timer() {
        let ui = UiContext::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        ui.schedule_after(ms(5), move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert!(ui.run_until(|| count.load(Ordering::SeqCst) == 1, Duration::from_secs(1)));
    }
}
