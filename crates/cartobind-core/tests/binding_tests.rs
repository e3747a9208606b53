//! Tests for the binding pipeline: source -> registry -> coalescer -> refresh,
//! and callback operations awaited on the async runtime.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use cartobind_core::{
    AsyncRuntime, AsyncRuntimeConfig, BoundViewModel, ChangeHandler, ManualClock, ObservableProperty, ObservableSource,
    OperationAbandoned, PropertyKey, PropertySet, Subscription, UiContext, operation,
};
use parking_lot::Mutex;

const WINDOW: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum CameraProperty {
    Zoom,
    Heading,
    Label,
}

impl PropertyKey for CameraProperty {
    const ALL: &'static [Self] = &[Self::Zoom, Self::Heading, Self::Label];

    fn name(self) -> &'static str {
        match self {
            Self::Zoom => "zoom",
            Self::Heading => "heading",
            Self::Label => "label",
        }
    }
}

struct Camera {
    zoom: ObservableProperty<u32>,
    heading: ObservableProperty<f64>,
    label: ObservableProperty<String>,
    observed: AtomicUsize,
}

impl Camera {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            zoom: ObservableProperty::new("zoom", 1),
            heading: ObservableProperty::new("heading", 0.0),
            label: ObservableProperty::new("label", String::new()),
            observed: AtomicUsize::new(0),
        })
    }
}

impl ObservableSource for Camera {
    type Key = CameraProperty;

    fn observe(&self, key: CameraProperty, on_change: ChangeHandler) -> Subscription {
        self.observed.fetch_add(1, Ordering::SeqCst);
        match key {
            CameraProperty::Zoom => self.zoom.observe(on_change),
            CameraProperty::Heading => self.heading.observe(on_change),
            CameraProperty::Label => self.label.observe(on_change),
        }
    }
}

fn clocked() -> (ManualClock, UiContext) {
    let clock = ManualClock::new();
    let ui = UiContext::with_clock(clock.clone());
    (clock, ui)
}

fn flush(clock: &ManualClock, ui: &UiContext) {
    clock.advance(WINDOW);
    ui.process_pending();
}

#[test]
fn test_one_subscription_per_selected_key() {
    let (_clock, ui) = clocked();
    let camera = Camera::new();
    let selection = PropertySet::from([CameraProperty::Zoom, CameraProperty::Heading, CameraProperty::Zoom]);
    let vm = BoundViewModel::new(camera.clone(), selection, ui, WINDOW);

    assert_eq!(vm.bound_count(), 2);
    assert_eq!(camera.observed.load(Ordering::SeqCst), 2);
    assert_eq!(camera.zoom.subscriber_count(), 1);
    assert_eq!(camera.label.subscriber_count(), 0);
}

#[test]
fn test_refresh_sees_latest_values() {
    let (clock, ui) = clocked();
    let camera = Camera::new();
    let vm = BoundViewModel::new(camera.clone(), PropertySet::all(), ui.clone(), WINDOW);
    flush(&clock, &ui);
    assert_eq!(vm.refresh_count(), 1);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let source = camera.clone();
    let _subscription = vm.on_refresh(move || sink.lock().push((source.zoom.get(), source.label.get())));

    camera.zoom.set(5);
    camera.label.set("north".into());
    camera.zoom.set(7);
    flush(&clock, &ui);

    assert_eq!(*seen.lock(), vec![(7, "north".to_string())]);
}

#[test]
fn test_empty_selection_never_refreshes() {
    let (clock, ui) = clocked();
    let camera = Camera::new();
    let vm = BoundViewModel::new(camera.clone(), PropertySet::empty(), ui.clone(), WINDOW);

    camera.heading.set(90.0);
    flush(&clock, &ui);
    assert_eq!(vm.bound_count(), 0);
    assert_eq!(vm.refresh_count(), 0);
}

#[test]
fn test_dispose_cancels_pending_refresh() {
    let (clock, ui) = clocked();
    let camera = Camera::new();
    let vm = BoundViewModel::new(camera.clone(), PropertySet::all(), ui.clone(), WINDOW);
    let refreshes = Arc::new(AtomicUsize::new(0));
    let sink = refreshes.clone();
    let _subscription = vm.on_refresh(move || {
        sink.fetch_add(1, Ordering::SeqCst);
    });

    assert!(vm.dispose());
    assert!(!vm.dispose());
    camera.zoom.set(3);
    flush(&clock, &ui);

    assert_eq!(refreshes.load(Ordering::SeqCst), 0);
    assert_eq!(ui.scheduled_count(), 0);
    assert_eq!(camera.zoom.subscriber_count(), 0);
}

fn runtime(ui: &UiContext) -> AsyncRuntime {
    AsyncRuntime::new(AsyncRuntimeConfig::default().with_worker_threads(1), ui.clone())
        .expect("Failed to start runtime")
}

#[test]
fn test_operation_result_is_delivered_on_the_ui_thread() {
    let ui = UiContext::new();
    let runtime = runtime(&ui);
    let result = Arc::new(Mutex::new(None));
    let sink = result.clone();
    let callback_ui = ui.clone();

    let op = operation::<u32, OperationAbandoned, _>(|resolver| {
        std::thread::spawn(move || resolver.succeed(42));
    });
    runtime.spawn_with_callback(op, move |value| {
        *sink.lock() = Some((value, callback_ui.is_ui_thread()));
    });

    assert!(ui.run_until(|| result.lock().is_some(), Duration::from_secs(5)));
    assert_eq!(*result.lock(), Some((Ok(42), true)));
    assert_eq!(runtime.active_tasks(), 0);
}

#[test]
fn test_dropped_resolver_abandons_the_operation() {
    let ui = UiContext::new();
    let runtime = runtime(&ui);

    let op = operation::<u32, OperationAbandoned, _>(|resolver| drop(resolver));
    assert_eq!(runtime.block_on(op), Err(OperationAbandoned));
}
