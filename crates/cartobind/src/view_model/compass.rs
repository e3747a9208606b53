//! The compass.

use std::fmt;
use std::sync::Arc;

use cartobind_core::{BoundViewModel, Coalescer, PropertySet, Subscription};
use parking_lot::Mutex;

use crate::adapter::{MapViewOperations, MapViewProperty};
use crate::context::AppContext;
use crate::sdk::map_view::MapView;

/// Shows the map rotation and rotates the map back to north.
///
/// Shares its map view with the owning screen; only `rotation` is bound.
pub struct CompassViewModel {
    facade: BoundViewModel<MapView>,
    rotate: Coalescer<f64>,
    apply: Mutex<Option<Subscription>>,
}

impl CompassViewModel {
    pub fn new(context: &AppContext, map_view: Arc<MapView>) -> Self {
        let ui = context.ui().clone();
        let facade = BoundViewModel::new(
            map_view.clone(),
            PropertySet::from([MapViewProperty::Rotation]),
            ui.clone(),
            context.config().throttle_window(),
        );

        let rotate = Coalescer::new(ui, context.config().rotate_window());
        let weak_view = Arc::downgrade(&map_view);
        let context = context.clone();
        let apply = rotate.subscribe(move |&angle| {
            let Some(map_view) = weak_view.upgrade() else { return };
            let rotation = map_view.set_viewpoint_rotation(angle);
            context.runtime().spawn_with_callback(rotation, move |result| match result {
                Ok(finished) => tracing::trace!(target: "cartobind::view_model", angle, finished, "compass rotation applied"),
                Err(error) => tracing::warn!(target: "cartobind::view_model", %error, "compass rotation failed"),
            });
        });

        Self {
            facade,
            rotate,
            apply: Mutex::new(Some(apply)),
        }
    }

    /// Map rotation in degrees, counter-clockwise from north.
    pub fn rotation(&self) -> f64 {
        self.facade.source().rotation()
    }

    /// The angle to draw the needle at.
    pub fn heading(&self) -> f64 {
        -self.rotation()
    }

    /// The compass is hidden while the map points north.
    pub fn is_hidden(&self) -> bool {
        self.rotation() == 0.0
    }

    /// Ask for the map to face north. Requests are coalesced.
    pub fn rotate_to_north(&self) {
        self.rotate.send(0.0);
    }

    pub fn on_refresh<F>(&self, slot: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.facade.on_refresh(slot)
    }

    pub fn refresh_count(&self) -> u64 {
        self.facade.refresh_count()
    }

    pub fn dispose(&self) -> bool {
        if !self.facade.dispose() {
            return false;
        }
        self.rotate.dispose();
        drop(self.apply.lock().take());
        true
    }

    pub fn is_disposed(&self) -> bool {
        self.facade.is_disposed()
    }
}

impl Drop for CompassViewModel {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for CompassViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompassViewModel")
            .field("rotation", &self.rotation())
            .field("rotate", &self.rotate)
            .finish()
    }
}
