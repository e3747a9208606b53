//! Thumbnails of portal items and users.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::loadable::{LoadCompletion, LoadStatus, LoadTracker, Loadable};
use super::portal::PortalConnection;
use crate::error::SdkError;

/// Encoded image bytes, shared without copying.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    bytes: Arc<[u8]>,
}

impl ImageData {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<Vec<u8>> for ImageData {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes: bytes.into() }
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData").field("bytes", &self.len()).finish()
    }
}

/// An image resource of the portal, fetched when loaded.
pub struct LoadableImage {
    resource: String,
    connection: Arc<dyn PortalConnection>,
    tracker: Arc<LoadTracker>,
    image: Arc<RwLock<Option<ImageData>>>,
}

impl LoadableImage {
    pub fn new(resource: impl Into<String>, connection: Arc<dyn PortalConnection>) -> Arc<Self> {
        Arc::new(Self {
            resource: resource.into(),
            connection,
            tracker: LoadTracker::new(),
            image: Arc::new(RwLock::new(None)),
        })
    }

    /// The resource name the portal knows the image by.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// The image; `None` until loaded.
    pub fn image(&self) -> Option<ImageData> {
        self.image.read().clone()
    }
}

impl Loadable for LoadableImage {
    fn load_status(&self) -> LoadStatus {
        self.tracker.status()
    }

    fn load_error(&self) -> Option<SdkError> {
        self.tracker.error()
    }

    fn load_with_completion(&self, completion: LoadCompletion) {
        let connection = self.connection.clone();
        let resource = self.resource.clone();
        let image = self.image.clone();
        self.tracker.load(completion, move |finish| {
            connection.fetch_thumbnail(
                &resource,
                Box::new(move |result| {
                    finish(result.map(|bytes| {
                        *image.write() = Some(ImageData::from(bytes));
                    }))
                }),
            );
        });
    }
}

impl fmt::Debug for LoadableImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadableImage")
            .field("resource", &self.resource)
            .field("load_status", &self.tracker.status())
            .finish()
    }
}
