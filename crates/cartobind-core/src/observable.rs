//! Observable properties and the source-adapter trait.
//!
//! An [`ObservableProperty<T>`] is the stand-in for a key-value-observable
//! property on a native object: it holds the current value and pushes every
//! change through an internal [`Signal`]. Subscribing yields the current value
//! immediately, then every subsequent change; the stream never completes and
//! has no error channel.
//!
//! [`ObservableSource`] is the type-erased face a native object presents to
//! the binding registry: one change stream per [`PropertyKey`].
//!
//! # Example
//!
//! ```
//! use cartobind_core::ObservableProperty;
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//!
//! let scale = ObservableProperty::new("mapScale", 1000.0_f64);
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let seen_clone = seen.clone();
//! let sub = scale.subscribe(move |&v| seen_clone.lock().push(v));
//! scale.set(500.0);
//! drop(sub);
//! scale.set(250.0);
//!
//! assert_eq!(*seen.lock(), vec![1000.0, 500.0]);
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::logging::targets;
use crate::selection::PropertyKey;
use crate::signal::Signal;
use crate::subscription::{ChildSubscriptions, Subscription};

/// Type-erased "something changed" callback routed by the registry.
pub type ChangeHandler = Arc<dyn Fn() + Send + Sync>;

/// A property with change notification.
///
/// `ObservableProperty<T>` uses interior mutability and is `Send + Sync`.
/// Notifications are emitted after the value lock is released, so slots may
/// read the property freely.
pub struct ObservableProperty<T> {
    name: &'static str,
    value: RwLock<T>,
    changed: Arc<Signal<T>>,
}

impl<T> ObservableProperty<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new property with an initial value.
    pub fn new(name: &'static str, value: T) -> Self {
        Self {
            name,
            value: RwLock::new(value),
            changed: Arc::new(Signal::new()),
        }
    }

    /// The property name, as the native object knows it.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Get the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Access the value through a closure without cloning.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.value.read())
    }

    /// Store a value and notify unconditionally.
    ///
    /// Use this for reference-like values whose equality is not meaningful.
    pub fn assign(&self, value: T) {
        *self.value.write() = value.clone();
        tracing::trace!(target: targets::PROPERTY, property = self.name, "property assigned");
        self.changed.emit(value);
    }

    /// Store a value without notifying anyone.
    pub fn set_silent(&self, value: T) {
        *self.value.write() = value;
    }

    /// Notify subscribers of the current value without storing anything.
    pub fn notify(&self) {
        let value = self.get();
        self.changed.emit(value);
    }

    /// Subscribe to the value stream: `f` is called with the current value
    /// right away, then with every change until the subscription is cancelled.
    pub fn subscribe<F>(&self, f: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let current = {
            // Holding the read lock while connecting orders this subscription
            // against concurrent writers.
            let guard = self.value.read();
            let slot = f.clone();
            let subscription = self.changed.subscribe(move |value| slot(value));
            (subscription, guard.clone())
        };
        let (subscription, value) = current;
        f(&value);
        subscription
    }

    /// Subscribe to changes only; the current value is not replayed.
    pub fn connect_changes<F>(&self, f: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.changed.subscribe(f)
    }

    /// Observe as a type-erased "changed" stream, including the initial value.
    pub fn observe(&self, on_change: ChangeHandler) -> Subscription {
        self.subscribe(move |_| on_change())
    }

    /// Observe a composite property.
    ///
    /// On every emission of this property (including the initial one) the
    /// child list is rebuilt by `observe_children` and `on_change` fires. The
    /// previous children are cancelled first, so re-emissions never stack up
    /// nested observers. Cancelling the returned subscription cancels the
    /// children as well.
    pub fn observe_nested<C>(&self, on_change: ChangeHandler, observe_children: C) -> Subscription
    where
        C: Fn(&T, &ChangeHandler) -> Vec<Subscription> + Send + Sync + 'static,
    {
        let children = ChildSubscriptions::new();
        let children_for_parent = children.clone();
        let parent = self.subscribe(move |value| {
            let nested = observe_children(value, &on_change);
            children_for_parent.replace(nested);
            on_change();
        });
        Subscription::with_children(parent, children)
    }

    /// Number of live subscriptions on this property.
    pub fn subscriber_count(&self) -> usize {
        self.changed.connection_count()
    }
}

impl<T> ObservableProperty<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Set the value, returning `true` (and notifying) if it changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.value.write();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        tracing::trace!(target: targets::PROPERTY, property = self.name, "property changed");
        self.changed.emit(value);
        true
    }

}

impl<T: Clone + Default + Send + Sync + 'static> Default for ObservableProperty<T> {
    fn default() -> Self {
        Self::new("", T::default())
    }
}

impl<T: Clone + fmt::Debug + Send + Sync + 'static> fmt::Debug for ObservableProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableProperty")
            .field("name", &self.name)
            .field("value", &self.get())
            .finish()
    }
}

/// A native object that exposes one change stream per property key.
///
/// Implementations must produce the current state immediately on
/// subscription (one `on_change` call) and then one call per change.
pub trait ObservableSource: Send + Sync + 'static {
    /// The closed set of observable properties.
    type Key: PropertyKey;

    /// Start observing `key`.
    fn observe(&self, key: Self::Key, on_change: ChangeHandler) -> Subscription;
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Options {
        zoom: ObservableProperty<bool>,
        pan: ObservableProperty<bool>,
    }

    impl Options {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                zoom: ObservableProperty::new("isZoomEnabled", true),
                pan: ObservableProperty::new("isPanEnabled", true),
            })
        }
    }

    fn counter() -> (Arc<AtomicUsize>, ChangeHandler) {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        (count, Arc::new(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[test]
    fn test_silent_set_then_notify() {
        let prop = ObservableProperty::new("status", 1_u32);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let _sub = prop.connect_changes(move |&v| seen_clone.lock().push(v));

        prop.set_silent(2);
        assert!(seen.lock().is_empty());
        prop.notify();
        assert_eq!(*seen.lock(), vec![2]);
        assert_eq!(prop.get(), 2);
    }

    #[test]
    fn test_subscribe_replays_current_value() {
        let prop = ObservableProperty::new("rotation", 10.0_f64);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = seen.clone();
        let _sub = prop.subscribe(move |&v| seen_clone.lock().push(v));
        prop.set(20.0);
        prop.set(20.0);
        prop.set(30.0);

        assert_eq!(*seen.lock(), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_connect_changes_skips_initial() {
        let prop = ObservableProperty::new("isNavigating", false);
        let (count, handler) = counter();
        let _sub = prop.connect_changes(move |_| handler());
        assert_eq!(count.load(Ordering::SeqCst), 0);
        prop.set(true);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_assign_always_notifies() {
        let prop = ObservableProperty::new("attributionText", String::from("a"));
        let (count, handler) = counter();
        let _sub = prop.connect_changes(move |_| handler());
        prop.assign(String::from("a"));
        prop.assign(String::from("a"));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cancel_removes_connection() {
        let prop = ObservableProperty::new("mapScale", 1.0_f64);
        let sub = prop.subscribe(|_| {});
        assert_eq!(prop.subscriber_count(), 1);
        drop(sub);
        assert_eq!(prop.subscriber_count(), 0);
    }

    #[test]
    fn test_nested_children_are_replaced_not_accumulated() {
        let parent = ObservableProperty::new("interactionOptions", Options::new());
        let (count, handler) = counter();

        let sub = parent.observe_nested(handler, |options: &Arc<Options>, on_change| {
            let zoom_change = on_change.clone();
            let pan_change = on_change.clone();
            vec![
                options.zoom.connect_changes(move |_| zoom_change()),
                options.pan.connect_changes(move |_| pan_change()),
            ]
        });
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let first = parent.get();
        first.zoom.set(false);
        assert_eq!(count.load(Ordering::SeqCst), 2);

        // Re-emitting the same options object must not double the observers.
        parent.assign(first.clone());
        parent.assign(first.clone());
        assert_eq!(first.zoom.subscriber_count(), 1);
        assert_eq!(first.pan.subscriber_count(), 1);

        // Swapping the options object moves the observers to the new one.
        let second = Options::new();
        parent.assign(second.clone());
        assert_eq!(first.zoom.subscriber_count(), 0);
        assert_eq!(second.zoom.subscriber_count(), 1);

        drop(sub);
        assert_eq!(second.zoom.subscriber_count(), 0);
        assert_eq!(parent.subscriber_count(), 0);
    }
}
