//! Subscription handles and their owners.
//!
//! Every observation registered anywhere in the bridge is represented by a
//! [`Subscription`]. Cancelling it (explicitly or by dropping it) tears the
//! observation down exactly once.
//!
//! - [`Subscription`] - a single cancellable observation handle
//! - [`ChildSubscriptions`] - the child list owned by a composite subscription

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

type CancelFn = Box<dyn FnOnce() + Send + 'static>;

/// A cancellable observation handle.
///
/// Cancelling is idempotent: the teardown closure runs at most once, and a
/// subscription whose source has already gone away cancels silently.
#[must_use = "dropping a Subscription cancels it immediately"]
pub struct Subscription {
    cancel: Option<CancelFn>,
}

impl Subscription {
    /// Create a subscription that runs `cancel` when torn down.
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to tear down.
    pub fn empty() -> Self {
        Self { cancel: None }
    }

    /// Build a subscription that also owns `children`; cancelling the parent
    /// cancels the children afterwards.
    pub fn with_children(parent: Subscription, children: ChildSubscriptions) -> Self {
        Self::new(move || {
            drop(parent);
            children.cancel();
        })
    }

    /// Tear the observation down. Further calls do nothing.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Whether this subscription has not been cancelled yet.
    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// The child-subscription list of a composite observation.
///
/// Each emission of the parent replaces the whole list, cancelling the
/// previous children first, so nested observers never accumulate. Once the
/// list is cancelled, replacements are cancelled on arrival.
#[derive(Clone)]
pub struct ChildSubscriptions {
    inner: Arc<Mutex<Option<Vec<Subscription>>>>,
}

impl ChildSubscriptions {
    /// Create an empty, live child list.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(Vec::new()))),
        }
    }

    /// Replace the current children with `children`.
    ///
    /// Returns `false` (and cancels `children`) if the list was already cancelled.
    pub fn replace(&self, children: Vec<Subscription>) -> bool {
        let previous = {
            let mut guard = self.inner.lock();
            match guard.as_mut() {
                Some(current) => Some(std::mem::replace(current, children)),
                None => {
                    drop(guard);
                    drop(children);
                    return false;
                }
            }
        };
        // Old children are dropped outside the lock.
        drop(previous);
        true
    }

    /// Number of live children.
    pub fn len(&self) -> usize {
        self.inner.lock().as_ref().map_or(0, Vec::len)
    }

    /// Whether there are no live children.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cancel every child and refuse new ones.
    pub fn cancel(&self) {
        let children = self.inner.lock().take();
        drop(children);
    }

    /// Whether [`cancel`](Self::cancel) has run.
    pub fn is_cancelled(&self) -> bool {
        self.inner.lock().is_none()
    }
}

impl Default for ChildSubscriptions {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(Subscription: Send);
