//! The native map view.
//!
//! [`MapView`] is a headless stand-in for the SDK's map view: every property
//! is an [`ObservableProperty`] (the key-value observation surface), derived
//! properties (`adjustedContentInset`, `unitsPerPoint`, `visibleArea`) are
//! recomputed whenever their inputs change, and asynchronous operations
//! report through completion callbacks. Identify and image export are handed
//! to a [`GeoViewBackend`].

use std::fmt;
use std::sync::Arc;

use cartobind_core::{ChangeHandler, Completion, ObservableProperty, Subscription};
use parking_lot::Mutex;

use super::backend::{ExportRequest, ExportedImage, GeoViewBackend, IdentifyRequest, NullBackend};
use super::geometry::{
    EdgeInsets, Point, Polygon, ScreenPoint, SpatialReference, TimeExtent, Viewpoint, normalize_degrees,
};
use super::map::Map;
use super::popup::IdentifyLayerResult;
use crate::error::SdkError;

/// Map units (meters) covered by one screen point at scale 1:1, at 96 DPI.
pub const METERS_PER_POINT: f64 = 0.0254 / 96.0;

/// Rendering progress of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawStatus {
    InProgress,
    #[default]
    Completed,
}

/// Which gestures the view responds to.
///
/// Held by the view behind an `Arc`; each flag is observable on its own.
pub struct InteractionOptions {
    pub is_enabled: ObservableProperty<bool>,
    pub is_pan_enabled: ObservableProperty<bool>,
    pub is_zoom_enabled: ObservableProperty<bool>,
    pub is_rotate_enabled: ObservableProperty<bool>,
    pub is_magnifier_enabled: ObservableProperty<bool>,
    pub zoom_factor: ObservableProperty<f64>,
}

impl InteractionOptions {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            is_enabled: ObservableProperty::new("isEnabled", true),
            is_pan_enabled: ObservableProperty::new("isPanEnabled", true),
            is_zoom_enabled: ObservableProperty::new("isZoomEnabled", true),
            is_rotate_enabled: ObservableProperty::new("isRotateEnabled", true),
            is_magnifier_enabled: ObservableProperty::new("isMagnifierEnabled", true),
            zoom_factor: ObservableProperty::new("zoomFactor", 2.0),
        })
    }

    /// Observe changes to every option. The current values are not replayed.
    pub fn observe_changes(&self, on_change: &ChangeHandler) -> Vec<Subscription> {
        fn forward(on_change: &ChangeHandler) -> impl Fn(&bool) + Send + Sync + 'static {
            let on_change = on_change.clone();
            move |_| on_change()
        }
        let zoom_factor_change = on_change.clone();
        vec![
            self.is_enabled.connect_changes(forward(on_change)),
            self.is_pan_enabled.connect_changes(forward(on_change)),
            self.is_zoom_enabled.connect_changes(forward(on_change)),
            self.is_rotate_enabled.connect_changes(forward(on_change)),
            self.is_magnifier_enabled.connect_changes(forward(on_change)),
            self.zoom_factor.connect_changes(move |_| zoom_factor_change()),
        ]
    }
}

impl fmt::Debug for InteractionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionOptions")
            .field("is_enabled", &self.is_enabled.get())
            .field("is_pan_enabled", &self.is_pan_enabled.get())
            .field("is_zoom_enabled", &self.is_zoom_enabled.get())
            .field("is_rotate_enabled", &self.is_rotate_enabled.get())
            .field("zoom_factor", &self.zoom_factor.get())
            .finish()
    }
}

/// How the view follows the device location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoPanMode {
    #[default]
    Off,
    Recenter,
    Navigation,
    CompassNavigation,
}

/// The device location overlay.
pub struct LocationDisplay {
    pub started: ObservableProperty<bool>,
    pub auto_pan_mode: ObservableProperty<AutoPanMode>,
    pub location: ObservableProperty<Option<Point>>,
}

impl LocationDisplay {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            started: ObservableProperty::new("started", false),
            auto_pan_mode: ObservableProperty::new("autoPanMode", AutoPanMode::Off),
            location: ObservableProperty::new("location", None),
        })
    }
}

impl fmt::Debug for LocationDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationDisplay")
            .field("started", &self.started.get())
            .field("auto_pan_mode", &self.auto_pan_mode.get())
            .finish()
    }
}

/// A layer of client-side graphics drawn above the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphicsOverlay {
    pub id: String,
    pub graphic_count: usize,
}

impl GraphicsOverlay {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            graphic_count: 0,
        }
    }
}

/// How selected features are highlighted (RGBA).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionProperties {
    pub color: [u8; 4],
}

impl Default for SelectionProperties {
    fn default() -> Self {
        Self {
            color: [0, 255, 255, 255],
        }
    }
}

/// Geometry creation modes of the sketch editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SketchCreationMode {
    Point,
    Polyline,
    Polygon,
}

/// An interactive geometry editor attached to the view.
#[derive(Debug, Clone, PartialEq)]
pub struct SketchEditor {
    pub is_enabled: bool,
    pub creation_mode: SketchCreationMode,
}

/// A headless map view.
pub struct MapView {
    adjusted_content_inset: ObservableProperty<EdgeInsets>,
    attribution_text: ObservableProperty<String>,
    is_attribution_text_visible: ObservableProperty<bool>,
    content_inset: ObservableProperty<EdgeInsets>,
    draw_status: ObservableProperty<DrawStatus>,
    graphics_overlays: ObservableProperty<Vec<GraphicsOverlay>>,
    insets_content_inset_from_safe_area: ObservableProperty<bool>,
    interaction_options: ObservableProperty<Arc<InteractionOptions>>,
    location_display: ObservableProperty<Arc<LocationDisplay>>,
    map: ObservableProperty<Option<Arc<Map>>>,
    map_scale: ObservableProperty<f64>,
    is_navigating: ObservableProperty<bool>,
    rotation: ObservableProperty<f64>,
    selection_properties: ObservableProperty<SelectionProperties>,
    sketch_editor: ObservableProperty<Option<SketchEditor>>,
    spatial_reference: ObservableProperty<Option<SpatialReference>>,
    time_extent: ObservableProperty<Option<TimeExtent>>,
    units_per_point: ObservableProperty<f64>,
    visible_area: ObservableProperty<Option<Polygon>>,

    geometry: Mutex<ViewGeometry>,
    backend: Arc<dyn GeoViewBackend>,
}

#[derive(Debug, Clone, Copy, Default)]
struct ViewGeometry {
    width: f64,
    height: f64,
    safe_area: EdgeInsets,
    center: Point,
}

impl MapView {
    /// A view without a rendering engine; identify and export fail.
    pub fn new() -> Arc<Self> {
        Self::with_backend(Arc::new(NullBackend))
    }

    pub fn with_backend(backend: Arc<dyn GeoViewBackend>) -> Arc<Self> {
        Arc::new(Self {
            adjusted_content_inset: ObservableProperty::new("adjustedContentInset", EdgeInsets::ZERO),
            attribution_text: ObservableProperty::new("attributionText", String::new()),
            is_attribution_text_visible: ObservableProperty::new("isAttributionTextVisible", true),
            content_inset: ObservableProperty::new("contentInset", EdgeInsets::ZERO),
            draw_status: ObservableProperty::new("drawStatus", DrawStatus::Completed),
            graphics_overlays: ObservableProperty::new("graphicsOverlays", Vec::new()),
            insets_content_inset_from_safe_area: ObservableProperty::new("insetsContentInsetFromSafeArea", true),
            interaction_options: ObservableProperty::new("interactionOptions", InteractionOptions::new()),
            location_display: ObservableProperty::new("locationDisplay", LocationDisplay::new()),
            map: ObservableProperty::new("map", None),
            map_scale: ObservableProperty::new("mapScale", 0.0),
            is_navigating: ObservableProperty::new("isNavigating", false),
            rotation: ObservableProperty::new("rotation", 0.0),
            selection_properties: ObservableProperty::new("selectionProperties", SelectionProperties::default()),
            sketch_editor: ObservableProperty::new("sketchEditor", None),
            spatial_reference: ObservableProperty::new("spatialReference", None),
            time_extent: ObservableProperty::new("timeExtent", None),
            units_per_point: ObservableProperty::new("unitsPerPoint", 0.0),
            visible_area: ObservableProperty::new("visibleArea", None),
            geometry: Mutex::new(ViewGeometry::default()),
            backend,
        })
    }

    // Observation surface.

    pub fn adjusted_content_inset_property(&self) -> &ObservableProperty<EdgeInsets> {
        &self.adjusted_content_inset
    }

    pub fn attribution_text_property(&self) -> &ObservableProperty<String> {
        &self.attribution_text
    }

    pub fn is_attribution_text_visible_property(&self) -> &ObservableProperty<bool> {
        &self.is_attribution_text_visible
    }

    pub fn content_inset_property(&self) -> &ObservableProperty<EdgeInsets> {
        &self.content_inset
    }

    pub fn draw_status_property(&self) -> &ObservableProperty<DrawStatus> {
        &self.draw_status
    }

    pub fn graphics_overlays_property(&self) -> &ObservableProperty<Vec<GraphicsOverlay>> {
        &self.graphics_overlays
    }

    pub fn insets_content_inset_from_safe_area_property(&self) -> &ObservableProperty<bool> {
        &self.insets_content_inset_from_safe_area
    }

    pub fn interaction_options_property(&self) -> &ObservableProperty<Arc<InteractionOptions>> {
        &self.interaction_options
    }

    pub fn location_display_property(&self) -> &ObservableProperty<Arc<LocationDisplay>> {
        &self.location_display
    }

    pub fn map_property(&self) -> &ObservableProperty<Option<Arc<Map>>> {
        &self.map
    }

    pub fn map_scale_property(&self) -> &ObservableProperty<f64> {
        &self.map_scale
    }

    pub fn is_navigating_property(&self) -> &ObservableProperty<bool> {
        &self.is_navigating
    }

    pub fn rotation_property(&self) -> &ObservableProperty<f64> {
        &self.rotation
    }

    pub fn selection_properties_property(&self) -> &ObservableProperty<SelectionProperties> {
        &self.selection_properties
    }

    pub fn sketch_editor_property(&self) -> &ObservableProperty<Option<SketchEditor>> {
        &self.sketch_editor
    }

    pub fn spatial_reference_property(&self) -> &ObservableProperty<Option<SpatialReference>> {
        &self.spatial_reference
    }

    pub fn time_extent_property(&self) -> &ObservableProperty<Option<TimeExtent>> {
        &self.time_extent
    }

    pub fn units_per_point_property(&self) -> &ObservableProperty<f64> {
        &self.units_per_point
    }

    pub fn visible_area_property(&self) -> &ObservableProperty<Option<Polygon>> {
        &self.visible_area
    }

    // Mutable properties.

    pub fn set_attribution_text_visible(&self, visible: bool) {
        self.is_attribution_text_visible.set(visible);
    }

    pub fn set_content_inset(&self, inset: EdgeInsets) {
        if self.content_inset.set(inset) {
            self.update_adjusted_inset();
        }
    }

    pub fn set_insets_content_inset_from_safe_area(&self, insets: bool) {
        if self.insets_content_inset_from_safe_area.set(insets) {
            self.update_adjusted_inset();
        }
    }

    pub fn set_interaction_options(&self, options: Arc<InteractionOptions>) {
        self.interaction_options.assign(options);
    }

    pub fn set_location_display(&self, display: Arc<LocationDisplay>) {
        self.location_display.assign(display);
    }

    pub fn set_selection_properties(&self, properties: SelectionProperties) {
        self.selection_properties.set(properties);
    }

    pub fn set_sketch_editor(&self, editor: Option<SketchEditor>) {
        self.sketch_editor.set(editor);
    }

    pub fn set_time_extent(&self, extent: Option<TimeExtent>) {
        self.time_extent.set(extent);
    }

    pub fn add_graphics_overlay(&self, overlay: GraphicsOverlay) {
        let mut overlays = self.graphics_overlays.get();
        overlays.push(overlay);
        self.graphics_overlays.assign(overlays);
    }

    pub fn remove_graphics_overlays(&self) {
        self.graphics_overlays.set(Vec::new());
    }

    /// Show `map`, jumping to its initial viewpoint.
    pub fn set_map(&self, map: Option<Arc<Map>>) {
        let spatial_reference = map.as_ref().map(|m| m.spatial_reference());
        let viewpoint = map.as_ref().map(|m| m.initial_viewpoint());
        self.map.assign(map);
        self.spatial_reference.set(spatial_reference);
        match viewpoint {
            Some(viewpoint) => self.apply_viewpoint(viewpoint),
            None => {
                self.map_scale.set(0.0);
                self.rotation.set(0.0);
                self.update_derived();
            }
        }
    }

    // Renderer-driven state.

    /// Resize the view, in points.
    pub fn resize(&self, width: f64, height: f64) {
        {
            let mut geometry = self.geometry.lock();
            geometry.width = width.max(0.0);
            geometry.height = height.max(0.0);
        }
        self.update_derived();
    }

    /// The device safe area changed.
    pub fn set_safe_area(&self, safe_area: EdgeInsets) {
        self.geometry.lock().safe_area = safe_area;
        self.update_adjusted_inset();
    }

    pub fn set_attribution_text(&self, text: impl Into<String>) {
        self.attribution_text.set(text.into());
    }

    pub fn set_draw_status(&self, status: DrawStatus) {
        self.draw_status.set(status);
    }

    // Reads.

    pub fn adjusted_content_inset(&self) -> EdgeInsets {
        self.adjusted_content_inset.get()
    }

    pub fn attribution_text(&self) -> String {
        self.attribution_text.get()
    }

    pub fn is_attribution_text_visible(&self) -> bool {
        self.is_attribution_text_visible.get()
    }

    pub fn content_inset(&self) -> EdgeInsets {
        self.content_inset.get()
    }

    pub fn draw_status(&self) -> DrawStatus {
        self.draw_status.get()
    }

    pub fn graphics_overlays(&self) -> Vec<GraphicsOverlay> {
        self.graphics_overlays.get()
    }

    pub fn insets_content_inset_from_safe_area(&self) -> bool {
        self.insets_content_inset_from_safe_area.get()
    }

    pub fn interaction_options(&self) -> Arc<InteractionOptions> {
        self.interaction_options.get()
    }

    pub fn location_display(&self) -> Arc<LocationDisplay> {
        self.location_display.get()
    }

    pub fn map(&self) -> Option<Arc<Map>> {
        self.map.get()
    }

    pub fn map_scale(&self) -> f64 {
        self.map_scale.get()
    }

    pub fn is_navigating(&self) -> bool {
        self.is_navigating.get()
    }

    pub fn rotation(&self) -> f64 {
        self.rotation.get()
    }

    pub fn selection_properties(&self) -> SelectionProperties {
        self.selection_properties.get()
    }

    pub fn sketch_editor(&self) -> Option<SketchEditor> {
        self.sketch_editor.get()
    }

    pub fn spatial_reference(&self) -> Option<SpatialReference> {
        self.spatial_reference.get()
    }

    pub fn time_extent(&self) -> Option<TimeExtent> {
        self.time_extent.get()
    }

    pub fn units_per_point(&self) -> f64 {
        self.units_per_point.get()
    }

    pub fn visible_area(&self) -> Option<Polygon> {
        self.visible_area.get()
    }

    /// The current viewpoint, if a map is shown.
    pub fn current_viewpoint(&self) -> Option<Viewpoint> {
        self.map.with(Option::is_some).then(|| Viewpoint {
            center: self.geometry.lock().center,
            scale: self.map_scale.get(),
            rotation: self.rotation.get(),
        })
    }

    /// Convert a screen location to map coordinates.
    pub fn screen_to_location(&self, point: ScreenPoint) -> Point {
        let geometry = *self.geometry.lock();
        let units = self.units_per_point.get();
        let offset = Point::new(
            geometry.center.x + (point.x - geometry.width / 2.0) * units,
            geometry.center.y + (geometry.height / 2.0 - point.y) * units,
        );
        offset.rotated_around(geometry.center, -self.rotation.get())
    }

    // Asynchronous operations. Each completes with `false` when no map is
    // shown, like an interrupted animation.

    pub fn set_viewpoint_with_completion(&self, viewpoint: Viewpoint, completion: Completion<bool>) {
        self.navigate(completion, |_| viewpoint);
    }

    pub fn set_viewpoint_center_with_completion(&self, center: Point, completion: Completion<bool>) {
        self.navigate(completion, |current| Viewpoint { center, ..current });
    }

    pub fn set_viewpoint_scale_with_completion(&self, scale: f64, completion: Completion<bool>) {
        self.navigate(completion, |current| Viewpoint { scale, ..current });
    }

    pub fn set_viewpoint_rotation_with_completion(&self, rotation: f64, completion: Completion<bool>) {
        self.navigate(completion, |current| Viewpoint { rotation, ..current });
    }

    pub fn identify_layers_with_completion(
        &self,
        screen_point: ScreenPoint,
        tolerance: f64,
        popups_only: bool,
        max_results: Option<usize>,
        completion: Completion<Result<Vec<IdentifyLayerResult>, SdkError>>,
    ) {
        if self.map.with(Option::is_none) {
            completion(Err(SdkError::NotLoaded));
            return;
        }
        let request = IdentifyRequest {
            screen_point,
            map_point: self.screen_to_location(screen_point),
            tolerance,
            popups_only,
            max_results,
        };
        tracing::trace!(target: "cartobind::sdk", ?screen_point, tolerance, "identify requested");
        self.backend.identify_layers(request, completion);
    }

    pub fn export_image_with_completion(&self, completion: Completion<Result<ExportedImage, SdkError>>) {
        let (width, height) = {
            let geometry = self.geometry.lock();
            (geometry.width.round() as u32, geometry.height.round() as u32)
        };
        let request = ExportRequest {
            width,
            height,
            viewpoint: self.current_viewpoint(),
        };
        self.backend.export_image(request, completion);
    }

    fn navigate<F>(&self, completion: Completion<bool>, target: F)
    where
        F: FnOnce(Viewpoint) -> Viewpoint,
    {
        let Some(current) = self.current_viewpoint() else {
            completion(false);
            return;
        };
        self.is_navigating.set(true);
        self.apply_viewpoint(target(current));
        self.is_navigating.set(false);
        completion(true);
    }

    fn apply_viewpoint(&self, viewpoint: Viewpoint) {
        self.draw_status.set(DrawStatus::InProgress);
        self.geometry.lock().center = viewpoint.center;
        self.map_scale.set(viewpoint.scale.max(0.0));
        self.rotation.set(normalize_degrees(viewpoint.rotation));
        self.update_derived();
        self.draw_status.set(DrawStatus::Completed);
    }

    fn update_adjusted_inset(&self) {
        let safe_area = self.geometry.lock().safe_area;
        let adjusted = if self.insets_content_inset_from_safe_area.get() {
            self.content_inset.get() + safe_area
        } else {
            self.content_inset.get()
        };
        self.adjusted_content_inset.set(adjusted);
    }

    fn update_derived(&self) {
        let units = self.map_scale.get() * METERS_PER_POINT;
        self.units_per_point.set(units);

        let geometry = *self.geometry.lock();
        let has_map = self.map.with(Option::is_some);
        let area = (has_map && geometry.width > 0.0 && geometry.height > 0.0).then(|| {
            let half_width = geometry.width * units / 2.0;
            let half_height = geometry.height * units / 2.0;
            let center = geometry.center;
            let rotation = -self.rotation.get();
            Polygon::new(
                [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
                    .into_iter()
                    .map(|(sx, sy)| {
                        Point::new(center.x + sx * half_width, center.y + sy * half_height)
                            .rotated_around(center, rotation)
                    })
                    .collect(),
            )
        });
        self.visible_area.set(area);
    }
}

impl fmt::Debug for MapView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapView")
            .field("map_scale", &self.map_scale.get())
            .field("rotation", &self.rotation.get())
            .field("has_map", &self.map.with(Option::is_some))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::map::{BasemapStyle, WORLD_SCALE};

    fn shown() -> Arc<MapView> {
        let view = MapView::new();
        view.resize(400.0, 800.0);
        view.set_map(Some(Map::with_basemap(BasemapStyle::Topographic)));
        view
    }

    fn finished(f: impl FnOnce(Completion<bool>)) -> bool {
        let done = Arc::new(Mutex::new(None));
        let done_clone = done.clone();
        f(Box::new(move |finished| *done_clone.lock() = Some(finished)));
        let result = done.lock().take();
        result.unwrap_or(false)
    }

    #[test]
    fn test_set_map_applies_initial_viewpoint() {
        let view = shown();
        assert_eq!(view.map_scale(), WORLD_SCALE);
        assert_eq!(view.spatial_reference(), Some(SpatialReference::WEB_MERCATOR));
        assert!((view.units_per_point() - WORLD_SCALE * METERS_PER_POINT).abs() < 1e-9);
        assert_eq!(view.visible_area().map(|area| area.points.len()), Some(4));

        view.set_map(None);
        assert!(view.visible_area().is_none());
        assert!(view.current_viewpoint().is_none());
    }

    #[test]
    fn test_navigation_without_map_is_interrupted() {
        let view = MapView::new();
        assert!(!finished(|c| view.set_viewpoint_rotation_with_completion(45.0, c)));
        assert_eq!(view.rotation(), 0.0);
    }

    #[test]
    fn test_rotation_is_normalized_and_navigates() {
        let view = shown();
        let transitions = Arc::new(Mutex::new(Vec::new()));
        let transitions_clone = transitions.clone();
        let _sub = view
            .is_navigating_property()
            .connect_changes(move |&navigating| transitions_clone.lock().push(navigating));

        assert!(finished(|c| view.set_viewpoint_rotation_with_completion(-90.0, c)));
        assert_eq!(view.rotation(), 270.0);
        assert_eq!(*transitions.lock(), vec![true, false]);
        assert!(!view.is_navigating());
    }

    #[test]
    fn test_scale_drives_derived_properties() {
        let view = shown();
        assert!(finished(|c| view.set_viewpoint_scale_with_completion(10_000.0, c)));
        let extent = view.visible_area().and_then(|area| area.extent()).unwrap();
        let expected_width = 400.0 * 10_000.0 * METERS_PER_POINT;
        assert!((extent.width() - expected_width).abs() < 1e-6);
    }

    #[test]
    fn test_adjusted_inset_includes_safe_area() {
        let view = MapView::new();
        view.set_safe_area(EdgeInsets::new(44.0, 0.0, 34.0, 0.0));
        view.set_content_inset(EdgeInsets::new(0.0, 0.0, 22.0, 0.0));
        assert_eq!(view.adjusted_content_inset(), EdgeInsets::new(44.0, 0.0, 56.0, 0.0));

        view.set_insets_content_inset_from_safe_area(false);
        assert_eq!(view.adjusted_content_inset(), EdgeInsets::new(0.0, 0.0, 22.0, 0.0));
    }

    #[test]
    fn test_screen_center_maps_to_view_center() {
        let view = shown();
        assert!(finished(|c| view.set_viewpoint_center_with_completion(Point::new(100.0, 200.0), c)));
        let location = view.screen_to_location(ScreenPoint::new(200.0, 400.0));
        assert!((location.x - 100.0).abs() < 1e-6);
        assert!((location.y - 200.0).abs() < 1e-6);
    }

    #[test]
    fn test_identify_without_map_fails() {
        let view = MapView::new();
        let result = Arc::new(Mutex::new(None));
        let result_clone = result.clone();
        view.identify_layers_with_completion(
            ScreenPoint::default(),
            8.0,
            true,
            None,
            Box::new(move |r| *result_clone.lock() = Some(r)),
        );
        assert_eq!(result.lock().take(), Some(Err(SdkError::NotLoaded)));
    }
}
