//! The application context passed down to every view model.
//!
//! Everything a view model needs from the outside world lives here: the
//! configuration, the UI scheduling context, the async runtime that awaits
//! native operations, and the external services (credential cache, portal
//! connection, rendering backend). Nothing is global; tests build their own.

use std::fmt;
use std::sync::Arc;

use cartobind_core::{AsyncRuntime, UiContext};
use url::Url;

use crate::config::AppConfig;
use crate::error::Result;
use crate::sdk::backend::{GeoViewBackend, NullBackend};
use crate::sdk::credential::{CredentialStore, InMemoryCredentialStore};
use crate::sdk::map_view::MapView;
use crate::sdk::portal::{InMemoryPortalConnection, Portal, PortalConnection, PortalDescription};

struct ContextInner {
    config: AppConfig,
    ui: UiContext,
    runtime: AsyncRuntime,
    credentials: Arc<dyn CredentialStore>,
    connection: Arc<dyn PortalConnection>,
    backend: Arc<dyn GeoViewBackend>,
}

/// Shared application services. Cheap to clone.
#[derive(Clone)]
pub struct AppContext {
    inner: Arc<ContextInner>,
}

impl AppContext {
    /// Start building a context from `config`.
    pub fn builder(config: AppConfig) -> AppContextBuilder {
        AppContextBuilder {
            config,
            ui: None,
            credentials: None,
            connection: None,
            backend: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn ui(&self) -> &UiContext {
        &self.inner.ui
    }

    pub fn runtime(&self) -> &AsyncRuntime {
        &self.inner.runtime
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.credentials
    }

    pub fn connection(&self) -> &Arc<dyn PortalConnection> {
        &self.inner.connection
    }

    pub fn backend(&self) -> &Arc<dyn GeoViewBackend> {
        &self.inner.backend
    }

    /// A new map view rendered by this context's backend.
    pub fn new_map_view(&self) -> Arc<MapView> {
        MapView::with_backend(self.inner.backend.clone())
    }

    /// A portal reached through this context's connection.
    pub fn portal(&self, url: Url, login_required: bool) -> Arc<Portal> {
        Portal::new(url, login_required, self.inner.connection.clone())
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.inner.config)
            .field("runtime", &self.inner.runtime)
            .finish_non_exhaustive()
    }
}

/// Builder for [`AppContext`]. Unset services default to in-memory ones.
pub struct AppContextBuilder {
    config: AppConfig,
    ui: Option<UiContext>,
    credentials: Option<Arc<dyn CredentialStore>>,
    connection: Option<Arc<dyn PortalConnection>>,
    backend: Option<Arc<dyn GeoViewBackend>>,
}

impl AppContextBuilder {
    /// The UI context; defaults to one owned by the thread calling `build`.
    pub fn ui(mut self, ui: UiContext) -> Self {
        self.ui = Some(ui);
        self
    }

    pub fn credentials(mut self, credentials: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn connection(mut self, connection: Arc<dyn PortalConnection>) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn GeoViewBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Start the async runtime and assemble the context.
    pub fn build(self) -> Result<AppContext> {
        let ui = self.ui.unwrap_or_default();
        let runtime = AsyncRuntime::new(self.config.async_runtime(), ui.clone())?;
        let credentials = self
            .credentials
            .unwrap_or_else(|| InMemoryCredentialStore::new() as Arc<dyn CredentialStore>);
        let connection = self
            .connection
            .unwrap_or_else(|| InMemoryPortalConnection::new(PortalDescription::default()) as Arc<dyn PortalConnection>);
        let backend = self.backend.unwrap_or_else(|| Arc::new(NullBackend));
        tracing::debug!(target: "cartobind::context", portal = %self.config.portal.url, "application context built");

        Ok(AppContext {
            inner: Arc::new(ContextInner {
                config: self.config,
                ui,
                runtime,
                credentials,
                connection,
                backend,
            }),
        })
    }
}

static_assertions::assert_impl_all!(AppContext: Send, Sync, Clone);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_in_memory() {
        let context = AppContext::builder(AppConfig::default().with_worker_threads(1))
            .build()
            .unwrap();
        assert!(!context.credentials().is_persistence_enabled());
        assert_eq!(context.runtime().active_tasks(), 0);
        assert!(context.ui().is_ui_thread());

        let portal = context.portal(context.config().portal_url().unwrap(), true);
        assert_eq!(portal.url().as_str(), "https://www.arcgis.com/");
        assert!(context.new_map_view().map().is_none());
    }
}
