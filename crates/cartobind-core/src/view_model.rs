//! The generic view-model facade.
//!
//! [`BoundViewModel`] wires the pipeline that every concrete view model
//! shares:
//!
//! ```text
//! ObservableSource --(selected keys)--> BindingRegistry --> Coalescer<()> --> refresh
//! ```
//!
//! The view layer listens to the single `refresh` signal and re-reads
//! whatever it needs synchronously from the source. Which property changed is
//! deliberately not reported.
//!
//! Subscriptions replay the current value, so a freshly built facade emits
//! one initial refresh one window after construction.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::coalescer::Coalescer;
use crate::logging::targets;
use crate::observable::{ChangeHandler, ObservableSource};
use crate::registry::BindingRegistry;
use crate::selection::PropertySet;
use crate::signal::Signal;
use crate::subscription::Subscription;
use crate::ui_context::UiContext;

/// A facade bound to a selection of properties on a shared source.
pub struct BoundViewModel<S: ObservableSource> {
    source: Arc<S>,
    selection: PropertySet<S::Key>,
    registry: Mutex<BindingRegistry<S::Key>>,
    coalescer: Coalescer<()>,
    refresh: Arc<Signal<()>>,
    pipe: Mutex<Option<Subscription>>,
    disposed: AtomicBool,
}

impl<S: ObservableSource> BoundViewModel<S> {
    /// Bind `selection` on `source`, coalescing changes over `window` on `ui`.
    pub fn new(source: Arc<S>, selection: PropertySet<S::Key>, ui: UiContext, window: Duration) -> Self {
        let coalescer = Coalescer::new(ui, window);
        let refresh = Arc::new(Signal::new());

        let weak_refresh = Arc::downgrade(&refresh);
        let pipe = coalescer.subscribe(move |_| {
            if let Some(refresh) = weak_refresh.upgrade() {
                refresh.emit(());
            }
        });

        let input = coalescer.input();
        let sink: ChangeHandler = Arc::new(move || input.send(()));

        let mut registry = BindingRegistry::new();
        let bound = registry.build(source.as_ref(), &selection, &sink);
        tracing::debug!(target: targets::VIEW_MODEL, ?selection, bound, "view model bound");

        Self {
            source,
            selection,
            registry: Mutex::new(registry),
            coalescer,
            refresh,
            pipe: Mutex::new(Some(pipe)),
            disposed: AtomicBool::new(false),
        }
    }

    /// The wrapped source.
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// The selection this facade was built with.
    pub fn selection(&self) -> &PropertySet<S::Key> {
        &self.selection
    }

    /// Number of live property subscriptions.
    pub fn bound_count(&self) -> usize {
        self.registry.lock().bound_count()
    }

    /// Listen for "refresh now". After disposal this returns an inert
    /// subscription and the slot is never called.
    pub fn on_refresh<F>(&self, slot: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        if self.is_disposed() {
            return Subscription::empty();
        }
        self.refresh.subscribe(move |_| slot())
    }

    /// Number of refreshes emitted so far.
    pub fn refresh_count(&self) -> u64 {
        self.refresh.emission_count()
    }

    /// Tear down every subscription, the coalescer and all refresh listeners.
    ///
    /// Returns `true` the first time only; later calls do nothing.
    pub fn dispose(&self) -> bool {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return false;
        }
        let released = self.registry.lock().dispose();
        self.coalescer.dispose();
        let pipe = self.pipe.lock().take();
        drop(pipe);
        self.refresh.disconnect_all();
        tracing::debug!(target: targets::VIEW_MODEL, released, "view model disposed");
        true
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl<S: ObservableSource> Drop for BoundViewModel<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<S: ObservableSource> fmt::Debug for BoundViewModel<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundViewModel")
            .field("selection", &self.selection)
            .field("coalescer", &self.coalescer)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
