//! Selective binding registry.
//!
//! Maps each selected [`PropertyKey`] to at most one live [`Subscription`]
//! on an [`ObservableSource`]. Keys outside the selection are never
//! observed at all.

use std::collections::BTreeMap;
use std::fmt;

use crate::logging::targets;
use crate::observable::{ChangeHandler, ObservableSource};
use crate::selection::{PropertyKey, PropertySet};
use crate::subscription::Subscription;

/// Per-key subscription table of one view model.
pub struct BindingRegistry<K: PropertyKey> {
    bindings: BTreeMap<K, Subscription>,
    disposed: bool,
}

impl<K: PropertyKey> BindingRegistry<K> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            bindings: BTreeMap::new(),
            disposed: false,
        }
    }

    /// Subscribe to every key of `selection` that is not bound yet and route
    /// its emissions into `sink`.
    ///
    /// Returns the number of new subscriptions. Calling this again with an
    /// overlapping selection never double-subscribes; after
    /// [`dispose`](Self::dispose) it does nothing.
    #[tracing::instrument(
        name = "registry_build",
        skip_all,
        target = "cartobind_core::registry",
        level = "trace"
    )]
    pub fn build<S>(&mut self, source: &S, selection: &PropertySet<K>, sink: &ChangeHandler) -> usize
    where
        S: ObservableSource<Key = K> + ?Sized,
    {
        if self.disposed {
            return 0;
        }
        let mut added = 0;
        for key in selection.iter() {
            if self.bindings.contains_key(&key) {
                continue;
            }
            let subscription = source.observe(key, sink.clone());
            self.bindings.insert(key, subscription);
            added += 1;
            tracing::trace!(target: targets::REGISTRY, property = key.name(), "property bound");
        }
        added
    }

    /// Number of live subscriptions.
    pub fn bound_count(&self) -> usize {
        self.bindings.len()
    }

    /// The bound keys, in order.
    pub fn bound_keys(&self) -> PropertySet<K> {
        self.bindings.keys().copied().collect()
    }

    /// Cancel every subscription and refuse further builds.
    ///
    /// Returns the number of subscriptions released by this call.
    pub fn dispose(&mut self) -> usize {
        self.disposed = true;
        let released = std::mem::take(&mut self.bindings);
        let count = released.len();
        drop(released);
        if count > 0 {
            tracing::trace!(target: targets::REGISTRY, count, "registry disposed");
        }
        count
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl<K: PropertyKey> Default for BindingRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PropertyKey> fmt::Debug for BindingRegistry<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingRegistry")
            .field("bound", &self.bound_keys())
            .field("disposed", &self.disposed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observable::ObservableProperty;
    use crate::selection::test_keys::Key;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Source {
        scale: ObservableProperty<f64>,
        rotation: ObservableProperty<f64>,
        attribution: ObservableProperty<String>,
    }

    impl Source {
        fn new() -> Self {
            Self {
                scale: ObservableProperty::new("mapScale", 1.0),
                rotation: ObservableProperty::new("rotation", 0.0),
                attribution: ObservableProperty::new("attributionText", String::new()),
            }
        }
    }

    impl ObservableSource for Source {
        type Key = Key;

        fn observe(&self, key: Key, on_change: ChangeHandler) -> Subscription {
            match key {
                Key::Scale => self.scale.observe(on_change),
                Key::Rotation => self.rotation.observe(on_change),
                Key::Attribution => self.attribution.observe(on_change),
            }
        }
    }

    fn sink() -> (Arc<AtomicUsize>, ChangeHandler) {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        (count, Arc::new(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[test]
    fn test_build_only_selected_keys() {
        let source = Source::new();
        let (count, handler) = sink();
        let mut registry = BindingRegistry::new();

        let added = registry.build(&source, &PropertySet::from([Key::Rotation]), &handler);
        assert_eq!(added, 1);
        assert_eq!(registry.bound_keys(), PropertySet::from([Key::Rotation]));
        assert_eq!(source.scale.subscriber_count(), 0);
        assert_eq!(source.attribution.subscriber_count(), 0);

        // Initial replay.
        assert_eq!(count.load(Ordering::SeqCst), 1);
        source.scale.set(2.0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        source.rotation.set(45.0);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_build_is_idempotent_per_key() {
        let source = Source::new();
        let (_count, handler) = sink();
        let mut registry = BindingRegistry::new();

        assert_eq!(registry.build(&source, &PropertySet::from([Key::Rotation]), &handler), 1);
        assert_eq!(registry.build(&source, &PropertySet::all(), &handler), 2);
        assert_eq!(registry.build(&source, &PropertySet::all(), &handler), 0);

        assert_eq!(registry.bound_count(), 3);
        assert_eq!(source.rotation.subscriber_count(), 1);
        assert_eq!(source.scale.subscriber_count(), 1);
    }

    #[test]
    fn test_dispose_releases_and_blocks_rebuild() {
        let source = Source::new();
        let (_count, handler) = sink();
        let mut registry = BindingRegistry::new();

        registry.build(&source, &PropertySet::all(), &handler);
        assert_eq!(registry.dispose(), 3);
        assert_eq!(registry.dispose(), 0);
        assert_eq!(source.rotation.subscriber_count(), 0);

        assert_eq!(registry.build(&source, &PropertySet::all(), &handler), 0);
        assert_eq!(source.rotation.subscriber_count(), 0);
    }
}
