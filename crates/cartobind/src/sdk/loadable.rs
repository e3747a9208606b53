//! The native load protocol.
//!
//! Portals and maps load lazily. Loading is callback-based, like the rest of
//! the native model: callers hand over a completion that receives `None` on
//! success or the failure. Concurrent callers share a single in-flight load,
//! a loaded object completes immediately, and a failed load starts over on
//! the next call. A native load that drops its completion without calling it
//! fails with [`SdkError::Cancelled`].

use std::fmt;
use std::sync::{Arc, Weak};

use cartobind_core::{Completion, ObservableProperty};
use parking_lot::Mutex;

use crate::error::SdkError;

/// Load state of a [`Loadable`] object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
    FailedToLoad,
}

/// Completion callback of a load request.
pub type LoadCompletion = Completion<Option<SdkError>>;

/// An object that must be loaded before it is fully usable.
pub trait Loadable: Send + Sync {
    /// Current load state.
    fn load_status(&self) -> LoadStatus;

    /// The error of the last failed load, if any.
    fn load_error(&self) -> Option<SdkError>;

    /// Load (or join the in-flight load) and call `completion` when done.
    fn load_with_completion(&self, completion: LoadCompletion);
}

struct LoadState {
    status: LoadStatus,
    error: Option<SdkError>,
    waiters: Vec<LoadCompletion>,
}

/// Shared bookkeeping behind every [`Loadable`] implementation.
pub struct LoadTracker {
    state: Mutex<LoadState>,
    status: ObservableProperty<LoadStatus>,
}

impl LoadTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(LoadState {
                status: LoadStatus::NotLoaded,
                error: None,
                waiters: Vec::new(),
            }),
            status: ObservableProperty::new("loadStatus", LoadStatus::NotLoaded),
        })
    }

    pub fn status(&self) -> LoadStatus {
        self.state.lock().status
    }

    pub fn error(&self) -> Option<SdkError> {
        self.state.lock().error.clone()
    }

    /// The observable load status.
    pub fn status_property(&self) -> &ObservableProperty<LoadStatus> {
        &self.status
    }

    /// Register `completion` and, if no load is running, call `start` with
    /// the callback that finishes the load.
    pub fn load<F>(self: &Arc<Self>, completion: LoadCompletion, start: F)
    where
        F: FnOnce(Completion<Result<(), SdkError>>),
    {
        {
            let mut state = self.state.lock();
            match state.status {
                LoadStatus::Loaded => {
                    drop(state);
                    completion(None);
                    return;
                }
                LoadStatus::Loading => {
                    state.waiters.push(completion);
                    return;
                }
                LoadStatus::NotLoaded | LoadStatus::FailedToLoad => {
                    state.status = LoadStatus::Loading;
                    state.error = None;
                    state.waiters.push(completion);
                }
            }
        }
        self.status.set(LoadStatus::Loading);

        let finisher = LoadFinisher {
            tracker: Some(Arc::downgrade(self)),
        };
        start(Box::new(move |result| finisher.complete(result)));
    }

    fn finish(&self, result: Result<(), SdkError>) {
        let (status, error, waiters) = {
            let mut state = self.state.lock();
            let error = result.err();
            state.status = match error {
                None => LoadStatus::Loaded,
                Some(_) => LoadStatus::FailedToLoad,
            };
            state.error = error.clone();
            (state.status, error, std::mem::take(&mut state.waiters))
        };
        tracing::debug!(target: "cartobind::sdk", ?status, waiters = waiters.len(), "load finished");
        self.status.set(status);
        for waiter in waiters {
            waiter(error.clone());
        }
    }
}

/// Finishes the load exactly once: with the reported result, or with
/// `Cancelled` when dropped unused.
struct LoadFinisher {
    tracker: Option<Weak<LoadTracker>>,
}

impl LoadFinisher {
    fn complete(mut self, result: Result<(), SdkError>) {
        if let Some(tracker) = self.tracker.take().and_then(|weak| weak.upgrade()) {
            tracker.finish(result);
        }
    }
}

impl Drop for LoadFinisher {
    fn drop(&mut self) {
        if let Some(tracker) = self.tracker.take().and_then(|weak| weak.upgrade()) {
            tracing::warn!(target: "cartobind::sdk", "load completion dropped without a result");
            tracker.finish(Err(SdkError::Cancelled));
        }
    }
}

impl fmt::Debug for LoadTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadTracker")
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder() -> (Arc<Mutex<Vec<Option<SdkError>>>>, impl Fn() -> LoadCompletion) {
        let results = Arc::new(Mutex::new(Vec::new()));
        let results_clone = results.clone();
        (results, move || {
            let results = results_clone.clone();
            Box::new(move |result: Option<SdkError>| results.lock().push(result)) as LoadCompletion
        })
    }

    #[test]
    fn test_concurrent_loads_share_one_start() {
        let tracker = LoadTracker::new();
        let starts = Arc::new(AtomicUsize::new(0));
        let finisher = Arc::new(Mutex::new(None));
        let (results, completion) = recorder();

        for _ in 0..3 {
            let starts = starts.clone();
            let finisher = finisher.clone();
            tracker.load(completion(), move |finish| {
                starts.fetch_add(1, Ordering::SeqCst);
                *finisher.lock() = Some(finish);
            });
        }
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.status(), LoadStatus::Loading);

        let finish = finisher.lock().take().unwrap();
        finish(Ok(()));
        assert_eq!(tracker.status(), LoadStatus::Loaded);
        assert_eq!(*results.lock(), vec![None, None, None]);

        // Already loaded: completes inline without starting again.
        tracker.load(completion(), |_| panic!("reloaded"));
        assert_eq!(results.lock().len(), 4);
    }

    #[test]
    fn test_failed_load_can_be_retried() {
        let tracker = LoadTracker::new();
        let (results, completion) = recorder();

        tracker.load(completion(), |finish| finish(Err(SdkError::network("offline"))));
        assert_eq!(tracker.status(), LoadStatus::FailedToLoad);
        assert_eq!(tracker.error(), Some(SdkError::network("offline")));

        tracker.load(completion(), |finish| finish(Ok(())));
        assert_eq!(tracker.status(), LoadStatus::Loaded);
        assert_eq!(tracker.error(), None);
        assert_eq!(*results.lock(), vec![Some(SdkError::network("offline")), None]);
    }

    #[test]
    fn test_dropped_completion_fails_the_load() {
        let tracker = LoadTracker::new();
        let (results, completion) = recorder();
        let finisher = Arc::new(Mutex::new(None));

        let stash = finisher.clone();
        tracker.load(completion(), move |finish| *stash.lock() = Some(finish));
        tracker.load(completion(), |_| panic!("started twice"));
        assert_eq!(tracker.status(), LoadStatus::Loading);

        drop(finisher.lock().take());
        assert_eq!(tracker.status(), LoadStatus::FailedToLoad);
        assert_eq!(tracker.error(), Some(SdkError::Cancelled));
        assert_eq!(*results.lock(), vec![Some(SdkError::Cancelled), Some(SdkError::Cancelled)]);

        tracker.load(completion(), |finish| finish(Ok(())));
        assert_eq!(tracker.status(), LoadStatus::Loaded);
    }

    #[test]
    fn test_completion_dropped_inside_start_fails_the_load() {
        let tracker = LoadTracker::new();
        let (results, completion) = recorder();

        tracker.load(completion(), drop);
        assert_eq!(tracker.status(), LoadStatus::FailedToLoad);
        assert_eq!(*results.lock(), vec![Some(SdkError::Cancelled)]);
    }
}
