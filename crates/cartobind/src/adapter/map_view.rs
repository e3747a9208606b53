//! [`MapView`] as an observable source, and its operations as futures.

use cartobind_core::{ChangeHandler, ObservableSource, Operation, PropertyKey, Subscription, operation};

use crate::error::AppError;
use crate::sdk::backend::ExportedImage;
use crate::sdk::geometry::{Point, ScreenPoint, Viewpoint};
use crate::sdk::map_view::{InteractionOptions, MapView};
use crate::sdk::popup::IdentifyLayerResult;

/// Observable properties of a [`MapView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapViewProperty {
    AdjustedContentInset,
    AttributionText,
    IsAttributionTextVisible,
    ContentInset,
    DrawStatus,
    GraphicsOverlays,
    InsetsContentInsetFromSafeArea,
    InteractionOptions,
    LocationDisplay,
    Map,
    MapScale,
    IsNavigating,
    Rotation,
    SelectionProperties,
    SketchEditor,
    SpatialReference,
    TimeExtent,
    UnitsPerPoint,
    VisibleArea,
}

impl PropertyKey for MapViewProperty {
    const ALL: &'static [Self] = &[
        Self::AdjustedContentInset,
        Self::AttributionText,
        Self::IsAttributionTextVisible,
        Self::ContentInset,
        Self::DrawStatus,
        Self::GraphicsOverlays,
        Self::InsetsContentInsetFromSafeArea,
        Self::InteractionOptions,
        Self::LocationDisplay,
        Self::Map,
        Self::MapScale,
        Self::IsNavigating,
        Self::Rotation,
        Self::SelectionProperties,
        Self::SketchEditor,
        Self::SpatialReference,
        Self::TimeExtent,
        Self::UnitsPerPoint,
        Self::VisibleArea,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::AdjustedContentInset => "adjustedContentInset",
            Self::AttributionText => "attributionText",
            Self::IsAttributionTextVisible => "isAttributionTextVisible",
            Self::ContentInset => "contentInset",
            Self::DrawStatus => "drawStatus",
            Self::GraphicsOverlays => "graphicsOverlays",
            Self::InsetsContentInsetFromSafeArea => "insetsContentInsetFromSafeArea",
            Self::InteractionOptions => "interactionOptions",
            Self::LocationDisplay => "locationDisplay",
            Self::Map => "map",
            Self::MapScale => "mapScale",
            Self::IsNavigating => "isNavigating",
            Self::Rotation => "rotation",
            Self::SelectionProperties => "selectionProperties",
            Self::SketchEditor => "sketchEditor",
            Self::SpatialReference => "spatialReference",
            Self::TimeExtent => "timeExtent",
            Self::UnitsPerPoint => "unitsPerPoint",
            Self::VisibleArea => "visibleArea",
        }
    }
}

impl ObservableSource for MapView {
    type Key = MapViewProperty;

    fn observe(&self, key: MapViewProperty, on_change: ChangeHandler) -> Subscription {
        use MapViewProperty as P;
        match key {
            P::AdjustedContentInset => self.adjusted_content_inset_property().observe(on_change),
            P::AttributionText => self.attribution_text_property().observe(on_change),
            P::IsAttributionTextVisible => self.is_attribution_text_visible_property().observe(on_change),
            P::ContentInset => self.content_inset_property().observe(on_change),
            P::DrawStatus => self.draw_status_property().observe(on_change),
            P::GraphicsOverlays => self.graphics_overlays_property().observe(on_change),
            P::InsetsContentInsetFromSafeArea => self.insets_content_inset_from_safe_area_property().observe(on_change),
            // Composite: the options object and each of its flags.
            P::InteractionOptions => self
                .interaction_options_property()
                .observe_nested(on_change, |options: &std::sync::Arc<InteractionOptions>, on_change| {
                    options.observe_changes(on_change)
                }),
            P::LocationDisplay => self.location_display_property().observe(on_change),
            P::Map => self.map_property().observe(on_change),
            P::MapScale => self.map_scale_property().observe(on_change),
            P::IsNavigating => self.is_navigating_property().observe(on_change),
            P::Rotation => self.rotation_property().observe(on_change),
            P::SelectionProperties => self.selection_properties_property().observe(on_change),
            P::SketchEditor => self.sketch_editor_property().observe(on_change),
            P::SpatialReference => self.spatial_reference_property().observe(on_change),
            P::TimeExtent => self.time_extent_property().observe(on_change),
            P::UnitsPerPoint => self.units_per_point_property().observe(on_change),
            P::VisibleArea => self.visible_area_property().observe(on_change),
        }
    }
}

/// Map-view operations as single-resolution futures.
///
/// Viewpoint operations resolve to whether the navigation finished.
pub trait MapViewOperations {
    fn set_viewpoint(&self, viewpoint: Viewpoint) -> Operation<bool, AppError>;

    fn set_viewpoint_center(&self, center: Point) -> Operation<bool, AppError>;

    fn set_viewpoint_scale(&self, scale: f64) -> Operation<bool, AppError>;

    fn set_viewpoint_rotation(&self, rotation: f64) -> Operation<bool, AppError>;

    fn identify_layers(
        &self,
        screen_point: ScreenPoint,
        tolerance: f64,
        popups_only: bool,
    ) -> Operation<Vec<IdentifyLayerResult>, AppError>;

    fn export_image(&self) -> Operation<ExportedImage, AppError>;
}

impl MapViewOperations for MapView {
    fn set_viewpoint(&self, viewpoint: Viewpoint) -> Operation<bool, AppError> {
        operation(|resolver| {
            self.set_viewpoint_with_completion(viewpoint, Box::new(move |finished| resolver.succeed(finished)))
        })
    }

    fn set_viewpoint_center(&self, center: Point) -> Operation<bool, AppError> {
        operation(|resolver| {
            self.set_viewpoint_center_with_completion(center, Box::new(move |finished| resolver.succeed(finished)))
        })
    }

    fn set_viewpoint_scale(&self, scale: f64) -> Operation<bool, AppError> {
        operation(|resolver| {
            self.set_viewpoint_scale_with_completion(scale, Box::new(move |finished| resolver.succeed(finished)))
        })
    }

    fn set_viewpoint_rotation(&self, rotation: f64) -> Operation<bool, AppError> {
        operation(|resolver| {
            self.set_viewpoint_rotation_with_completion(rotation, Box::new(move |finished| resolver.succeed(finished)))
        })
    }

    fn identify_layers(
        &self,
        screen_point: ScreenPoint,
        tolerance: f64,
        popups_only: bool,
    ) -> Operation<Vec<IdentifyLayerResult>, AppError> {
        operation(|resolver| {
            self.identify_layers_with_completion(
                screen_point,
                tolerance,
                popups_only,
                None,
                Box::new(move |result| resolver.resolve(result.map_err(AppError::Load))),
            )
        })
    }

    fn export_image(&self) -> Operation<ExportedImage, AppError> {
        operation(|resolver| {
            self.export_image_with_completion(Box::new(move |result| resolver.resolve(result.map_err(AppError::Load))))
        })
    }
}
