//! Maps: a basemap, or a web map stored as a portal item.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Deserialize;

use super::geometry::{Point, SpatialReference, Viewpoint};
use super::loadable::{LoadCompletion, LoadStatus, LoadTracker, Loadable};
use super::portal::{PortalConnection, PortalItem};
use crate::error::SdkError;

/// Scale at which the whole world fits a phone screen.
pub const WORLD_SCALE: f64 = 591_657_527.591_555;

/// Stock basemaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasemapStyle {
    Topographic,
    Imagery,
    Streets,
}

impl BasemapStyle {
    pub fn name(self) -> &'static str {
        match self {
            Self::Topographic => "Topographic",
            Self::Imagery => "Imagery",
            Self::Streets => "Streets",
        }
    }
}

enum MapSource {
    Basemap(BasemapStyle),
    Item {
        item: PortalItem,
        connection: Arc<dyn PortalConnection>,
    },
}

#[derive(Default)]
struct MapContent {
    operational_layers: Vec<String>,
    initial_viewpoint: Option<Viewpoint>,
}

/// A map.
pub struct Map {
    source: MapSource,
    tracker: Arc<LoadTracker>,
    content: Arc<RwLock<MapContent>>,
}

impl Map {
    pub fn with_basemap(style: BasemapStyle) -> Arc<Self> {
        Self::from_source(MapSource::Basemap(style))
    }

    /// A web map stored in a portal; its data is fetched on load.
    pub fn from_item(item: PortalItem, connection: Arc<dyn PortalConnection>) -> Arc<Self> {
        Self::from_source(MapSource::Item { item, connection })
    }

    fn from_source(source: MapSource) -> Arc<Self> {
        Arc::new(Self {
            source,
            tracker: LoadTracker::new(),
            content: Arc::new(RwLock::new(MapContent::default())),
        })
    }

    /// The portal item this map was opened from.
    pub fn item(&self) -> Option<&PortalItem> {
        match &self.source {
            MapSource::Item { item, .. } => Some(item),
            MapSource::Basemap(_) => None,
        }
    }

    pub fn basemap(&self) -> Option<BasemapStyle> {
        match self.source {
            MapSource::Basemap(style) => Some(style),
            MapSource::Item { .. } => None,
        }
    }

    pub fn spatial_reference(&self) -> SpatialReference {
        SpatialReference::WEB_MERCATOR
    }

    /// Titles of the operational layers; empty until loaded.
    pub fn operational_layers(&self) -> Vec<String> {
        self.content.read().operational_layers.clone()
    }

    /// Where a map view showing this map starts.
    pub fn initial_viewpoint(&self) -> Viewpoint {
        self.content.read().initial_viewpoint.unwrap_or(Viewpoint {
            center: Point::default(),
            scale: WORLD_SCALE,
            rotation: 0.0,
        })
    }
}

impl Loadable for Map {
    fn load_status(&self) -> LoadStatus {
        self.tracker.status()
    }

    fn load_error(&self) -> Option<SdkError> {
        self.tracker.error()
    }

    fn load_with_completion(&self, completion: LoadCompletion) {
        let content = self.content.clone();
        match &self.source {
            MapSource::Basemap(_) => self.tracker.load(completion, |finish| finish(Ok(()))),
            MapSource::Item { item, connection } => {
                let connection = connection.clone();
                let item_id = item.id.clone();
                self.tracker.load(completion, move |finish| {
                    connection.fetch_item_data(
                        &item_id,
                        Box::new(move |result| {
                            let parsed = result.and_then(|json| {
                                let data: WebMapData = serde_json::from_value(json)?;
                                Ok(data)
                            });
                            finish(parsed.map(|data| *content.write() = data.into_content()));
                        }),
                    );
                });
            }
        }
    }
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Map");
        match &self.source {
            MapSource::Basemap(style) => debug.field("basemap", style),
            MapSource::Item { item, .. } => debug.field("item", &item.id),
        };
        debug.field("load_status", &self.tracker.status()).finish()
    }
}

// Web map JSON, reduced to what the view models use.

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebMapData {
    #[serde(default)]
    operational_layers: Vec<LayerData>,
    #[serde(default)]
    initial_state: Option<InitialState>,
}

#[derive(Deserialize)]
struct LayerData {
    #[serde(default)]
    title: String,
}

#[derive(Deserialize)]
struct InitialState {
    viewpoint: ViewpointData,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewpointData {
    #[serde(default)]
    target_geometry: Option<Point>,
    #[serde(default)]
    scale: Option<f64>,
    #[serde(default)]
    rotation: Option<f64>,
}

impl WebMapData {
    fn into_content(self) -> MapContent {
        MapContent {
            operational_layers: self.operational_layers.into_iter().map(|layer| layer.title).collect(),
            initial_viewpoint: self.initial_state.map(|state| Viewpoint {
                center: state.viewpoint.target_geometry.unwrap_or_default(),
                scale: state.viewpoint.scale.unwrap_or(WORLD_SCALE),
                rotation: state.viewpoint.rotation.unwrap_or(0.0),
            }),
        }
    }
}
