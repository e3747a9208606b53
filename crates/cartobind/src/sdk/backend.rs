//! Pluggable geo-view backend.
//!
//! Identify and image export belong to the rendering engine. A [`MapView`]
//! forwards them to a [`GeoViewBackend`]; [`NullBackend`] refuses everything
//! and [`HeadlessBackend`] answers from canned results.
//!
//! [`MapView`]: super::map_view::MapView

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use cartobind_core::Completion;
use parking_lot::Mutex;

use super::geometry::{Point, ScreenPoint, Viewpoint};
use super::popup::IdentifyLayerResult;
use crate::error::SdkError;

/// Parameters of an identify-layers request.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifyRequest {
    pub screen_point: ScreenPoint,
    /// `screen_point` converted to map coordinates.
    pub map_point: Point,
    /// Search radius, in points.
    pub tolerance: f64,
    pub popups_only: bool,
    /// Maximum results per layer; `None` means no limit.
    pub max_results: Option<usize>,
}

/// Parameters of an export-image request.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub width: u32,
    pub height: u32,
    pub viewpoint: Option<Viewpoint>,
}

/// An exported RGBA image.
#[derive(Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl fmt::Debug for ExportedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// The rendering-engine side of a map view.
pub trait GeoViewBackend: Send + Sync + 'static {
    fn identify_layers(&self, request: IdentifyRequest, completion: Completion<Result<Vec<IdentifyLayerResult>, SdkError>>);

    fn export_image(&self, request: ExportRequest, completion: Completion<Result<ExportedImage, SdkError>>);
}

/// A backend with no rendering engine attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

impl GeoViewBackend for NullBackend {
    fn identify_layers(&self, _request: IdentifyRequest, completion: Completion<Result<Vec<IdentifyLayerResult>, SdkError>>) {
        completion(Err(SdkError::BackendUnavailable("identify")));
    }

    fn export_image(&self, _request: ExportRequest, completion: Completion<Result<ExportedImage, SdkError>>) {
        completion(Err(SdkError::BackendUnavailable("export image")));
    }
}

struct HeadlessState {
    results: Vec<IdentifyLayerResult>,
    failures: VecDeque<SdkError>,
    requests: Vec<IdentifyRequest>,
    latency: Option<Duration>,
}

/// A backend that answers identify requests with a fixed result set and
/// exports blank images.
pub struct HeadlessBackend {
    state: Mutex<HeadlessState>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HeadlessState {
                results: Vec::new(),
                failures: VecDeque::new(),
                requests: Vec::new(),
                latency: None,
            }),
        }
    }

    /// Builder-style result set.
    pub fn with_results(self, results: Vec<IdentifyLayerResult>) -> Self {
        self.set_results(results);
        self
    }

    /// Replace what identify requests return.
    pub fn set_results(&self, results: Vec<IdentifyLayerResult>) {
        self.state.lock().results = results;
    }

    /// Make the next request fail with `error`.
    pub fn fail_next(&self, error: SdkError) {
        self.state.lock().failures.push_back(error);
    }

    /// Answer on a background thread after `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.state.lock().latency = latency;
    }

    /// Identify requests received so far.
    pub fn identify_requests(&self) -> Vec<IdentifyRequest> {
        self.state.lock().requests.clone()
    }

    fn deliver<T: Send + 'static>(&self, result: Result<T, SdkError>, completion: Completion<Result<T, SdkError>>) {
        match self.state.lock().latency {
            Some(delay) => {
                std::thread::spawn(move || {
                    std::thread::sleep(delay);
                    completion(result);
                });
            }
            None => completion(result),
        }
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GeoViewBackend for HeadlessBackend {
    fn identify_layers(&self, request: IdentifyRequest, completion: Completion<Result<Vec<IdentifyLayerResult>, SdkError>>) {
        let result = {
            let mut state = self.state.lock();
            let max_results = request.max_results;
            let popups_only = request.popups_only;
            state.requests.push(request);
            match state.failures.pop_front() {
                Some(error) => Err(error),
                None => Ok(state
                    .results
                    .iter()
                    .filter(|layer| !popups_only || !layer.popups.is_empty())
                    .map(|layer| IdentifyLayerResult {
                        layer_name: layer.layer_name.clone(),
                        popups: layer
                            .popups
                            .iter()
                            .take(max_results.unwrap_or(usize::MAX))
                            .cloned()
                            .collect(),
                    })
                    .collect()),
            }
        };
        self.deliver(result, completion);
    }

    fn export_image(&self, request: ExportRequest, completion: Completion<Result<ExportedImage, SdkError>>) {
        let result = match self.state.lock().failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(ExportedImage {
                width: request.width,
                height: request.height,
                pixels: vec![0; request.width as usize * request.height as usize * 4],
            }),
        };
        self.deliver(result, completion);
    }
}

impl fmt::Debug for HeadlessBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("HeadlessBackend")
            .field("results", &state.results.len())
            .field("requests", &state.requests.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::popup::Popup;
    use std::sync::Arc;

    fn request(max_results: Option<usize>) -> IdentifyRequest {
        IdentifyRequest {
            screen_point: ScreenPoint::new(10.0, 10.0),
            map_point: Point::default(),
            tolerance: 8.0,
            popups_only: true,
            max_results,
        }
    }

    #[test]
    fn test_identify_filters_and_limits() {
        let backend = HeadlessBackend::new().with_results(vec![
            IdentifyLayerResult {
                layer_name: "Empty".into(),
                popups: vec![],
            },
            IdentifyLayerResult {
                layer_name: "Parks".into(),
                popups: vec![Popup::new("A"), Popup::new("B")],
            },
        ]);
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();
        backend.identify_layers(request(Some(1)), Box::new(move |r| *seen_clone.lock() = Some(r)));

        let results = seen.lock().take().unwrap().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].popups, vec![Popup::new("A")]);
        assert_eq!(backend.identify_requests().len(), 1);
    }

    #[test]
    fn test_null_backend_refuses() {
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();
        NullBackend.identify_layers(request(None), Box::new(move |r| *seen_clone.lock() = Some(r)));
        assert_eq!(
            seen.lock().take(),
            Some(Err(SdkError::BackendUnavailable("identify")))
        );
    }

    #[test]
    fn test_export_blank_image() {
        let backend = HeadlessBackend::new();
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();
        backend.export_image(
            ExportRequest {
                width: 2,
                height: 3,
                viewpoint: None,
            },
            Box::new(move |r| *seen_clone.lock() = Some(r)),
        );
        let image = seen.lock().take().unwrap().unwrap();
        assert_eq!(image.pixels.len(), 24);
    }
}
