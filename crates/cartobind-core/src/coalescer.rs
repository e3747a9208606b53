//! Change coalescing ("throttling") onto the UI context.
//!
//! A [`Coalescer<T>`] collapses bursts of tokens into one emission per fixed
//! window, always carrying the most recent token:
//!
//! - the first token of a burst schedules a flush at `first + window`;
//! - later tokens inside the window only replace the pending value;
//! - the flush runs on the [`UiContext`] and emits the latest token.
//!
//! Under continuous input this degrades to one emission per window boundary;
//! the output is never starved. Earlier tokens of a window are never seen by
//! the consumer.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use crate::logging::targets;
use crate::signal::Signal;
use crate::subscription::Subscription;
use crate::ui_context::{ScheduledTaskId, UiContext};

/// Default coalescing window.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(10);

struct CoalescerState<T> {
    latest: Option<T>,
    pending: Option<ScheduledTaskId>,
    disposed: bool,
}

struct CoalescerInner<T> {
    window: Duration,
    ui: UiContext,
    state: Mutex<CoalescerState<T>>,
    output: Arc<Signal<T>>,
}

impl<T: Clone + Send + 'static> CoalescerInner<T> {
    fn send(self: &Arc<Self>, token: T) {
        let mut state = self.state.lock();
        if state.disposed {
            return;
        }
        state.latest = Some(token);
        if state.pending.is_none() {
            let weak = Arc::downgrade(self);
            let id = self.ui.schedule_after(self.window, move || {
                if let Some(inner) = weak.upgrade() {
                    inner.flush();
                }
            });
            state.pending = Some(id);
            tracing::trace!(target: targets::COALESCER, window = ?self.window, "window opened");
        }
    }

    fn flush(&self) {
        let token = {
            let mut state = self.state.lock();
            state.pending = None;
            if state.disposed {
                return;
            }
            state.latest.take()
        };
        if let Some(token) = token {
            tracing::trace!(target: targets::COALESCER, "window flushed");
            self.output.emit(token);
        }
    }

    fn dispose(&self) -> bool {
        let pending = {
            let mut state = self.state.lock();
            if state.disposed {
                return false;
            }
            state.disposed = true;
            state.latest = None;
            state.pending.take()
        };
        if let Some(id) = pending {
            let _ = self.ui.cancel(id);
        }
        self.output.disconnect_all();
        true
    }
}

/// Trailing-edge throttle delivering the latest token once per window.
pub struct Coalescer<T> {
    inner: Arc<CoalescerInner<T>>,
}

impl<T: Clone + Send + 'static> Coalescer<T> {
    /// Create a coalescer that flushes on `ui` after `window`.
    pub fn new(ui: UiContext, window: Duration) -> Self {
        Self {
            inner: Arc::new(CoalescerInner {
                window,
                ui,
                state: Mutex::new(CoalescerState {
                    latest: None,
                    pending: None,
                    disposed: false,
                }),
                output: Arc::new(Signal::new()),
            }),
        }
    }

    /// The coalescing window.
    pub fn window(&self) -> Duration {
        self.inner.window
    }

    /// Feed a token in.
    pub fn send(&self, token: T) {
        self.inner.send(token);
    }

    /// A cloneable, non-owning input handle.
    ///
    /// Sending through it after the coalescer is disposed or dropped does
    /// nothing.
    pub fn input(&self) -> CoalescerInput<T> {
        CoalescerInput {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Receive coalesced tokens.
    pub fn subscribe<F>(&self, slot: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        if self.is_disposed() {
            return Subscription::empty();
        }
        self.inner.output.subscribe(slot)
    }

    /// Whether a flush is scheduled.
    pub fn is_pending(&self) -> bool {
        self.inner.state.lock().pending.is_some()
    }

    /// Cancel the pending flush, drop listeners and ignore further input.
    ///
    /// Returns `true` the first time only.
    pub fn dispose(&self) -> bool {
        self.inner.dispose()
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.inner.state.lock().disposed
    }
}

impl<T> Drop for Coalescer<T> {
    fn drop(&mut self) {
        let pending = {
            let mut state = self.inner.state.lock();
            state.disposed = true;
            state.latest = None;
            state.pending.take()
        };
        if let Some(id) = pending {
            let _ = self.inner.ui.cancel(id);
        }
    }
}

impl<T> fmt::Debug for Coalescer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Coalescer")
            .field("window", &self.inner.window)
            .field("pending", &state.pending.is_some())
            .field("disposed", &state.disposed)
            .finish()
    }
}

/// Non-owning input side of a [`Coalescer`].
pub struct CoalescerInput<T> {
    inner: Weak<CoalescerInner<T>>,
}

impl<T> Clone for CoalescerInput<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> CoalescerInput<T> {
    /// Feed a token in, if the coalescer is still alive.
    pub fn send(&self, token: T) {
        if let Some(inner) = self.inner.upgrade() {
            inner.send(token);
        }
    }
}
