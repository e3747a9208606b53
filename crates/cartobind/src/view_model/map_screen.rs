//! The map screen: title, identify-to-popup, compass.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use cartobind_core::{Coalescer, ObservableProperty, Subscription};
use parking_lot::Mutex;

use super::compass::CompassViewModel;
use super::merged;
use crate::adapter::{LoadableExt, MapViewOperations};
use crate::context::AppContext;
use crate::error::AppError;
use crate::sdk::geometry::{EdgeInsets, ScreenPoint};
use crate::sdk::map::Map;
use crate::sdk::map_view::MapView;
use crate::sdk::popup::{IdentifyLayerResult, Popup};

/// Title shown until (or unless) the map item provides one.
pub const DEFAULT_TITLE: &str = "Map";

/// Space reserved at the bottom of the map for the scalebar, in points.
pub const SCALEBAR_HEIGHT: f64 = 22.0;

/// Identify search radius, in points.
pub const IDENTIFY_TOLERANCE: f64 = 8.0;

struct ScreenState {
    title: ObservableProperty<String>,
    popup: ObservableProperty<Option<Popup>>,
    error_message: ObservableProperty<Option<String>>,
    disposed: AtomicBool,
}

impl ScreenState {
    fn live(weak: &Weak<Self>) -> Option<Arc<Self>> {
        weak.upgrade().filter(|state| !state.disposed.load(Ordering::SeqCst))
    }

    fn apply_identify(&self, result: Result<Vec<IdentifyLayerResult>, AppError>) {
        match result {
            Ok(layers) => {
                let popup = layers.into_iter().next().and_then(|layer| layer.popups.into_iter().next());
                self.popup.set(popup);
                self.error_message.set(None);
            }
            Err(error) => {
                tracing::debug!(target: "cartobind::view_model", %error, "identify failed");
                self.popup.set(None);
                self.error_message.set(Some(error.to_string()));
            }
        }
    }
}

/// Everything the map screen shows.
pub struct MapScreenViewModel {
    map_view: Arc<MapView>,
    state: Arc<ScreenState>,
    identify: Coalescer<ScreenPoint>,
    pipe: Mutex<Option<Subscription>>,
    compass: CompassViewModel,
}

impl MapScreenViewModel {
    /// Show `map` on a new map view.
    ///
    /// Loading the map starts right away; the title follows once it is done.
    pub fn new(context: &AppContext, map: Arc<Map>) -> Self {
        let state = Arc::new(ScreenState {
            title: ObservableProperty::new("title", DEFAULT_TITLE.to_string()),
            popup: ObservableProperty::new("popup", None),
            error_message: ObservableProperty::new("errorMessage", None),
            disposed: AtomicBool::new(false),
        });

        let weak = Arc::downgrade(&state);
        let titled = map.clone();
        context.runtime().spawn_with_callback(map.load(), move |result| {
            let Some(state) = ScreenState::live(&weak) else { return };
            let title = match result {
                Ok(()) => titled.item().map(|item| item.title.clone()),
                Err(error) => {
                    tracing::debug!(target: "cartobind::view_model", %error, "map failed to load");
                    None
                }
            };
            state.title.set(title.unwrap_or_else(|| DEFAULT_TITLE.to_string()));
        });

        let map_view = context.new_map_view();
        map_view.set_map(Some(map));
        map_view.set_content_inset(EdgeInsets::new(0.0, 0.0, SCALEBAR_HEIGHT, 0.0));

        let identify = Coalescer::new(context.ui().clone(), context.config().identify_window());
        let pipe = {
            let weak_view = Arc::downgrade(&map_view);
            let weak_state = Arc::downgrade(&state);
            let context = context.clone();
            identify.subscribe(move |&point| {
                let Some(map_view) = weak_view.upgrade() else { return };
                let weak_state = weak_state.clone();
                let identify = map_view.identify_layers(point, IDENTIFY_TOLERANCE, true);
                context.runtime().spawn_with_callback(identify, move |result| {
                    if let Some(state) = ScreenState::live(&weak_state) {
                        state.apply_identify(result);
                    }
                });
            })
        };

        let compass = CompassViewModel::new(context, map_view.clone());

        Self {
            map_view,
            state,
            identify,
            pipe: Mutex::new(Some(pipe)),
            compass,
        }
    }

    pub fn map_view(&self) -> &Arc<MapView> {
        &self.map_view
    }

    pub fn compass(&self) -> &CompassViewModel {
        &self.compass
    }

    pub fn title(&self) -> String {
        self.state.title.get()
    }

    /// The popup of the last identified feature.
    pub fn popup(&self) -> Option<Popup> {
        self.state.popup.get()
    }

    pub fn error_message(&self) -> Option<String> {
        self.state.error_message.get()
    }

    /// Identify features at a tapped point. Taps are coalesced.
    pub fn identify_features(&self, point: ScreenPoint) {
        self.identify.send(point);
    }

    pub fn clear_popup(&self) {
        self.state.popup.set(None);
    }

    /// Listen for changes to the title, popup or error message.
    pub fn on_changed<F>(&self, slot: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        if self.is_disposed() {
            return Subscription::empty();
        }
        let slot = Arc::new(slot);
        let (title, popup, error) = (slot.clone(), slot.clone(), slot);
        merged(vec![
            self.state.title.connect_changes(move |_| title()),
            self.state.popup.connect_changes(move |_| popup()),
            self.state.error_message.connect_changes(move |_| error()),
        ])
    }

    /// Stop identifying, drop pending results and dispose the compass.
    pub fn dispose(&self) -> bool {
        if self.state.disposed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.identify.dispose();
        drop(self.pipe.lock().take());
        self.compass.dispose();
        true
    }

    pub fn is_disposed(&self) -> bool {
        self.state.disposed.load(Ordering::SeqCst)
    }
}

impl Drop for MapScreenViewModel {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for MapScreenViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapScreenViewModel")
            .field("title", &self.title())
            .field("has_popup", &self.state.popup.with(Option::is_some))
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
