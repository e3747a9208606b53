//! Adapters from the native object model onto the binding bridge.
//!
//! Native objects become [`ObservableSource`](cartobind_core::ObservableSource)s
//! keyed by a closed property enum, and every completion-callback operation
//! becomes a single-resolution [`Operation`](cartobind_core::Operation). Nothing
//! past this module sees a callback.

mod map_view;
mod operations;

pub use map_view::{MapViewOperations, MapViewProperty};
pub use operations::{CredentialStoreExt, LoadableExt, PortalUserExt};
