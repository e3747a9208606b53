//! cartobind - reactive view models over a callback-based mapping SDK.
//!
//! This crate re-exports the binding bridge from `cartobind-core` and builds
//! the application layer on top of it:
//!
//! - [`sdk`]: headless stand-in for the native map view, portal and credential cache
//! - [`adapter`]: native objects as observable sources, operations as futures
//! - [`view_model`]: map-view facade, map screen, compass, portal browser and item rows, user profile, popup
//! - [`session`]: the portal sign-in state machine
//! - [`config`] / [`context`]: TOML configuration and the services passed to view models
//!
//! # Example
//!
//! ```no_run
//! use cartobind::{AppConfig, AppContext, PortalSession};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let context = AppContext::builder(AppConfig::load("cartobind.toml")?).build()?;
//!     let session = PortalSession::new(context.clone());
//!     session.sign_in_configured()?;
//!     context.ui().run_until(|| !session.state().is_loading(), std::time::Duration::from_secs(30));
//!     println!("{:?}", session.state());
//!     Ok(())
//! }
//! ```

pub use cartobind_core::*;

pub mod adapter;
pub mod config;
pub mod context;
pub mod error;
pub mod sdk;
pub mod session;
pub mod view_model;

pub use adapter::{CredentialStoreExt, LoadableExt, MapViewOperations, MapViewProperty, PortalUserExt};
pub use config::AppConfig;
pub use context::{AppContext, AppContextBuilder};
pub use error::{AppError, ConfigError, SdkError};
pub use session::{PortalSession, SessionState};
pub use view_model::{
    CompassViewModel, MapScreenViewModel, MapViewModel, PopupViewModel, PortalBrowserViewModel, PortalItemViewModel,
    PortalUserViewModel,
};
