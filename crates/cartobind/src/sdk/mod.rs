//! Headless stand-in for the native geospatial SDK.
//!
//! The real SDK owns rendering, portal protocols and the credential cache.
//! What the binding layer needs from it is reproduced here with the same
//! shape: key-value observable properties, completion-callback operations,
//! and loadable objects. The parts that belong to external services are
//! traits ([`GeoViewBackend`], [`PortalConnection`], [`CredentialStore`]) with
//! in-memory implementations.

pub mod backend;
pub mod credential;
pub mod geometry;
pub mod image;
pub mod loadable;
pub mod map;
pub mod map_view;
pub mod popup;
pub mod portal;

pub use backend::{ExportRequest, ExportedImage, GeoViewBackend, HeadlessBackend, IdentifyRequest, NullBackend};
pub use credential::{CredentialEvent, CredentialStore, InMemoryCredentialStore};
pub use geometry::{EdgeInsets, Envelope, Point, Polygon, ScreenPoint, SpatialReference, TimeExtent, Viewpoint};
pub use image::{ImageData, LoadableImage};
pub use loadable::{LoadStatus, LoadTracker, Loadable};
pub use map::{BasemapStyle, Map};
pub use map_view::{
    AutoPanMode, DrawStatus, GraphicsOverlay, InteractionOptions, LocationDisplay, MapView, SelectionProperties,
    SketchCreationMode, SketchEditor,
};
pub use popup::{IdentifyLayerResult, Popup, PopupField, PopupValue};
pub use portal::{
    InMemoryPortalConnection, Organization, Portal, PortalConnection, PortalDescription, PortalInfo, PortalItem,
    PortalItemType, PortalUser, UserInfo,
};
