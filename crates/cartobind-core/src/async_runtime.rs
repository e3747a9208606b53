//! Async runtime integration.
//!
//! Native operations complete on arbitrary threads. [`AsyncRuntime`] awaits
//! their [`Operation`](crate::Operation) futures on a Tokio runtime and
//! delivers the results back onto the [`UiContext`], so view models only ever
//! apply state on the UI thread.
//!
//! # Example: Delivering Results to the UI Thread
//!
//! ```no_run
//! use cartobind_core::{AsyncRuntime, AsyncRuntimeConfig, UiContext};
//! use std::time::Duration;
//!
//! let ui = UiContext::new();
//! let runtime = AsyncRuntime::new(AsyncRuntimeConfig::default(), ui.clone()).unwrap();
//!
//! runtime.spawn_with_callback(async { 42 }, |value| {
//!     // Runs on the UI thread.
//!     println!("Got result: {value}");
//! });
//!
//! ui.run_until(|| runtime.active_tasks() == 0, Duration::from_secs(1));
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::runtime::{Builder, Handle, Runtime};

use crate::error::{BridgeError, Result};
use crate::logging::targets;
use crate::ui_context::UiContext;

/// Configuration for the async runtime.
#[derive(Debug, Clone)]
pub struct AsyncRuntimeConfig {
    /// Number of worker threads. Defaults to the number of CPU cores.
    pub worker_threads: Option<usize>,
    /// Name prefix for runtime threads.
    pub thread_name: String,
    /// Enable the time driver (required for `tokio::time`).
    pub enable_time: bool,
}

impl Default for AsyncRuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            thread_name: "cartobind-async".to_string(),
            enable_time: true,
        }
    }
}

impl AsyncRuntimeConfig {
    /// Set the number of worker threads.
    pub fn with_worker_threads(mut self, count: usize) -> Self {
        self.worker_threads = Some(count);
        self
    }

    /// Set the thread name prefix.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

/// The async runtime manager.
///
/// Owns a multi-threaded Tokio runtime and the [`UiContext`] that results are
/// posted to.
pub struct AsyncRuntime {
    runtime: Option<Runtime>,
    handle: Handle,
    ui: UiContext,
    active_tasks: Arc<AtomicU64>,
}

impl AsyncRuntime {
    /// Create a runtime that delivers callbacks to `ui`.
    pub fn new(config: AsyncRuntimeConfig, ui: UiContext) -> Result<Self> {
        let mut builder = Builder::new_multi_thread();
        builder.thread_name(&config.thread_name);

        if let Some(workers) = config.worker_threads {
            builder.worker_threads(workers);
        }

        if config.enable_time {
            builder.enable_time();
        }

        let runtime = builder
            .build()
            .map_err(|e| BridgeError::AsyncRuntime(e.to_string()))?;
        let handle = runtime.handle().clone();
        tracing::debug!(target: targets::ASYNC, thread_name = %config.thread_name, "async runtime started");

        Ok(Self {
            runtime: Some(runtime),
            handle,
            ui,
            active_tasks: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Number of tasks that have not finished (including callback delivery).
    pub fn active_tasks(&self) -> u64 {
        self.active_tasks.load(Ordering::Acquire)
    }

    /// Spawn an async task and deliver its result on the UI thread.
    ///
    /// The task stays counted as active until the callback has run.
    pub fn spawn_with_callback<F, T, C>(&self, future: F, callback: C)
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        let active_tasks = self.active_tasks.clone();
        active_tasks.fetch_add(1, Ordering::AcqRel);
        let ui = self.ui.clone();

        self.handle.spawn(async move {
            let result = future.await;
            tracing::trace!(target: targets::ASYNC, "task finished, posting result to UI");
            ui.post(move || {
                callback(result);
                active_tasks.fetch_sub(1, Ordering::AcqRel);
            });
        });
    }

    /// Block on a future, running it to completion.
    ///
    /// Never call this on the UI thread or from within an async context.
    pub fn block_on<F, T>(&self, future: F) -> T
    where
        F: Future<Output = T>,
    {
        self.handle.block_on(future)
    }
}

impl Drop for AsyncRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            // Safe from any context, including from within a runtime thread.
            runtime.shutdown_background();
        }
    }
}

impl fmt::Debug for AsyncRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncRuntime")
            .field("active_tasks", &self.active_tasks())
            .finish()
    }
}

static_assertions::assert_impl_all!(AsyncRuntime: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Duration;

    fn runtime(ui: &UiContext) -> AsyncRuntime {
        AsyncRuntime::new(AsyncRuntimeConfig::default().with_worker_threads(2), ui.clone()).unwrap()
    }

    #[test]
    fn test_block_on() {
        let ui = UiContext::new();
        let runtime = runtime(&ui);
        let result = runtime.block_on(async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            "hello"
        });
        assert_eq!(result, "hello");
    }

    #[test]
    fn test_callback_runs_on_ui_thread() {
        let ui = UiContext::new();
        let runtime = runtime(&ui);
        let delivered = Arc::new(Mutex::new(None));

        let delivered_clone = delivered.clone();
        let ui_clone = ui.clone();
        runtime.spawn_with_callback(
            async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                7
            },
            move |value| {
                *delivered_clone.lock() = Some((value, ui_clone.is_ui_thread()));
            },
        );

        assert!(ui.run_until(|| delivered.lock().is_some(), Duration::from_secs(2)));
        assert_eq!(*delivered.lock(), Some((7, true)));
        assert_eq!(runtime.active_tasks(), 0);
    }

    #[test]
    fn test_callback_waits_for_ui_processing() {
        let ui = UiContext::new();
        let runtime = runtime(&ui);
        let delivered = Arc::new(Mutex::new(false));

        let delivered_clone = delivered.clone();
        runtime.spawn_with_callback(async {}, move |()| *delivered_clone.lock() = true);

        std::thread::sleep(Duration::from_millis(20));
        assert!(!*delivered.lock());
        assert_eq!(runtime.active_tasks(), 1);

        assert!(ui.run_until(|| *delivered.lock(), Duration::from_secs(2)));
    }
}
