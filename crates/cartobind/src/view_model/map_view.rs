//! The map-view facade.

use std::sync::Arc;
use std::time::Duration;

use cartobind_core::{BoundViewModel, PropertySet, Subscription, UiContext};

use crate::adapter::MapViewProperty;
use crate::context::AppContext;
use crate::sdk::geometry::{EdgeInsets, Polygon, SpatialReference, TimeExtent};
use crate::sdk::map::Map;
use crate::sdk::map_view::{
    DrawStatus, GraphicsOverlay, InteractionOptions, LocationDisplay, MapView, SelectionProperties, SketchEditor,
};

/// A view model over a shared [`MapView`], refreshing when any selected
/// property changes.
///
/// Reads go straight to the live map view. Writes apply immediately; the
/// resulting change notifications come back through the refresh pipeline.
pub struct MapViewModel {
    facade: BoundViewModel<MapView>,
}

impl MapViewModel {
    pub fn new(map_view: Arc<MapView>, selection: PropertySet<MapViewProperty>, ui: UiContext, window: Duration) -> Self {
        Self {
            facade: BoundViewModel::new(map_view, selection, ui, window),
        }
    }

    /// Bind with the context's UI and throttle window.
    pub fn with_context(context: &AppContext, map_view: Arc<MapView>, selection: PropertySet<MapViewProperty>) -> Self {
        Self::new(map_view, selection, context.ui().clone(), context.config().throttle_window())
    }

    pub fn map_view(&self) -> &Arc<MapView> {
        self.facade.source()
    }

    pub fn selection(&self) -> &PropertySet<MapViewProperty> {
        self.facade.selection()
    }

    /// Number of live property subscriptions.
    pub fn bound_count(&self) -> usize {
        self.facade.bound_count()
    }

    /// Listen for "refresh now".
    pub fn on_refresh<F>(&self, slot: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.facade.on_refresh(slot)
    }

    pub fn refresh_count(&self) -> u64 {
        self.facade.refresh_count()
    }

    /// Release every subscription. Safe to call repeatedly.
    pub fn dispose(&self) -> bool {
        self.facade.dispose()
    }

    pub fn is_disposed(&self) -> bool {
        self.facade.is_disposed()
    }

    pub fn adjusted_content_inset(&self) -> EdgeInsets {
        self.map_view().adjusted_content_inset()
    }

    pub fn attribution_text(&self) -> String {
        self.map_view().attribution_text()
    }

    pub fn is_attribution_text_visible(&self) -> bool {
        self.map_view().is_attribution_text_visible()
    }

    pub fn set_attribution_text_visible(&self, visible: bool) {
        self.map_view().set_attribution_text_visible(visible);
    }

    pub fn content_inset(&self) -> EdgeInsets {
        self.map_view().content_inset()
    }

    pub fn set_content_inset(&self, inset: EdgeInsets) {
        self.map_view().set_content_inset(inset);
    }

    pub fn draw_status(&self) -> DrawStatus {
        self.map_view().draw_status()
    }

    pub fn graphics_overlays(&self) -> Vec<GraphicsOverlay> {
        self.map_view().graphics_overlays()
    }

    pub fn insets_content_inset_from_safe_area(&self) -> bool {
        self.map_view().insets_content_inset_from_safe_area()
    }

    pub fn set_insets_content_inset_from_safe_area(&self, insets: bool) {
        self.map_view().set_insets_content_inset_from_safe_area(insets);
    }

    pub fn interaction_options(&self) -> Arc<InteractionOptions> {
        self.map_view().interaction_options()
    }

    pub fn set_interaction_options(&self, options: Arc<InteractionOptions>) {
        self.map_view().set_interaction_options(options);
    }

    pub fn location_display(&self) -> Arc<LocationDisplay> {
        self.map_view().location_display()
    }

    pub fn set_location_display(&self, display: Arc<LocationDisplay>) {
        self.map_view().set_location_display(display);
    }

    pub fn map(&self) -> Option<Arc<Map>> {
        self.map_view().map()
    }

    pub fn set_map(&self, map: Option<Arc<Map>>) {
        self.map_view().set_map(map);
    }

    pub fn map_scale(&self) -> f64 {
        self.map_view().map_scale()
    }

    pub fn is_navigating(&self) -> bool {
        self.map_view().is_navigating()
    }

    pub fn rotation(&self) -> f64 {
        self.map_view().rotation()
    }

    pub fn selection_properties(&self) -> SelectionProperties {
        self.map_view().selection_properties()
    }

    pub fn set_selection_properties(&self, properties: SelectionProperties) {
        self.map_view().set_selection_properties(properties);
    }

    pub fn sketch_editor(&self) -> Option<SketchEditor> {
        self.map_view().sketch_editor()
    }

    pub fn set_sketch_editor(&self, editor: Option<SketchEditor>) {
        self.map_view().set_sketch_editor(editor);
    }

    pub fn spatial_reference(&self) -> Option<SpatialReference> {
        self.map_view().spatial_reference()
    }

    pub fn time_extent(&self) -> Option<TimeExtent> {
        self.map_view().time_extent()
    }

    pub fn set_time_extent(&self, extent: Option<TimeExtent>) {
        self.map_view().set_time_extent(extent);
    }

    pub fn units_per_point(&self) -> f64 {
        self.map_view().units_per_point()
    }

    pub fn visible_area(&self) -> Option<Polygon> {
        self.map_view().visible_area()
    }
}

impl std::fmt::Debug for MapViewModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapViewModel").field("facade", &self.facade).finish()
    }
}
