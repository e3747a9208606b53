//! The list of the signed-in user's web maps.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use cartobind_core::{ObservableProperty, Subscription};
use futures_util::TryFutureExt;

use super::merged;
use super::portal_item::{ITEM_PLACEHOLDER, PortalItemViewModel, Thumbnail};
use crate::adapter::{LoadableExt, PortalUserExt};
use crate::context::AppContext;
use crate::error::AppError;
use crate::sdk::image::ImageData;
use crate::sdk::portal::{Portal, PortalItem};

const TARGET: &str = "cartobind::view_model";

struct BrowserState {
    items: ObservableProperty<Vec<PortalItem>>,
    /// Loaded thumbnails by item id.
    thumbnails: ObservableProperty<HashMap<String, ImageData>>,
    error_message: ObservableProperty<Option<String>>,
    is_loading: ObservableProperty<bool>,
    disposed: AtomicBool,
}

/// Loads the portal and lists the user's web maps.
pub struct PortalBrowserViewModel {
    portal: Arc<Portal>,
    state: Arc<BrowserState>,
}

impl PortalBrowserViewModel {
    /// Start fetching right away.
    pub fn new(context: &AppContext, portal: Arc<Portal>) -> Self {
        let state = Arc::new(BrowserState {
            items: ObservableProperty::new("items", Vec::new()),
            thumbnails: ObservableProperty::new("thumbnails", HashMap::new()),
            error_message: ObservableProperty::new("errorMessage", None),
            is_loading: ObservableProperty::new("isLoading", false),
            disposed: AtomicBool::new(false),
        });
        let vm = Self { portal, state };
        vm.fetch(context);
        vm
    }

    /// Fetch again, replacing the items on success.
    pub fn reload(&self, context: &AppContext) {
        self.fetch(context);
    }

    fn fetch(&self, context: &AppContext) {
        if self.state.disposed.load(Ordering::SeqCst) || self.state.is_loading.get() {
            return;
        }
        self.state.is_loading.set(true);

        let portal = self.portal.clone();
        let fetch = async move {
            portal.load().await?;
            let user = portal.user().ok_or(AppError::MissingUserCredential)?;
            user.fetch_content()
                .map_ok(|items| items.into_iter().filter(PortalItem::is_web_map).collect::<Vec<_>>())
                .await
        };

        let weak: Weak<BrowserState> = Arc::downgrade(&self.state);
        let portal = self.portal.clone();
        let thumbnails_context = context.clone();
        context.runtime().spawn_with_callback(fetch, move |result| {
            let Some(state) = weak.upgrade() else { return };
            if state.disposed.load(Ordering::SeqCst) {
                return;
            }
            match result {
                Ok(items) => {
                    tracing::debug!(target: TARGET, count = items.len(), "portal items fetched");
                    load_thumbnails(&thumbnails_context, &portal, &state, &items);
                    state.items.set(items);
                    state.error_message.set(None);
                }
                Err(error) => {
                    tracing::debug!(target: TARGET, %error, "portal items unavailable");
                    state.error_message.set(Some(error.to_string()));
                }
            }
            state.is_loading.set(false);
        });
    }

    pub fn portal(&self) -> &Arc<Portal> {
        &self.portal
    }

    /// Web-map items owned by the user.
    pub fn items(&self) -> Vec<PortalItem> {
        self.state.items.get()
    }

    /// The loaded thumbnail of an item, or the globe placeholder.
    pub fn thumbnail(&self, item_id: &str) -> Thumbnail {
        let image = self.state.thumbnails.with(|thumbnails| thumbnails.get(item_id).cloned());
        Thumbnail::or_placeholder(image, ITEM_PLACEHOLDER)
    }

    /// The items as display rows.
    pub fn item_rows(&self) -> Vec<PortalItemViewModel> {
        let thumbnails = self.state.thumbnails.get();
        self.state.items.with(|items| {
            items
                .iter()
                .map(|item| PortalItemViewModel::new(item, thumbnails.get(&item.id).cloned()))
                .collect()
        })
    }

    pub fn error_message(&self) -> Option<String> {
        self.state.error_message.get()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading.get()
    }

    /// Listen for changes to the items, thumbnails, error message or loading
    /// flag.
    pub fn on_changed<F>(&self, slot: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        if self.is_disposed() {
            return Subscription::empty();
        }
        let slot = Arc::new(slot);
        let (items, thumbnails, error, loading) = (slot.clone(), slot.clone(), slot.clone(), slot);
        merged(vec![
            self.state.items.connect_changes(move |_| items()),
            self.state.thumbnails.connect_changes(move |_| thumbnails()),
            self.state.error_message.connect_changes(move |_| error()),
            self.state.is_loading.connect_changes(move |_| loading()),
        ])
    }

    /// Discard any fetch still in flight. Safe to call repeatedly.
    pub fn dispose(&self) -> bool {
        !self.state.disposed.swap(true, Ordering::SeqCst)
    }

    pub fn is_disposed(&self) -> bool {
        self.state.disposed.load(Ordering::SeqCst)
    }
}

/// Load the thumbnails of `items` that have one. Failures keep the
/// placeholder.
fn load_thumbnails(context: &AppContext, portal: &Portal, state: &Arc<BrowserState>, items: &[PortalItem]) {
    for item in items {
        let Some(image) = item.thumbnail_image(portal.connection().clone()) else {
            continue;
        };
        let item_id = item.id.clone();
        let loaded = image.clone();
        let load = image.load().map_ok(move |()| loaded.image());
        let weak = Arc::downgrade(state);
        context.runtime().spawn_with_callback(load, move |result| {
            let Some(state) = weak.upgrade() else { return };
            if state.disposed.load(Ordering::SeqCst) {
                return;
            }
            match result {
                Ok(Some(data)) => {
                    let mut thumbnails = state.thumbnails.get();
                    thumbnails.insert(item_id, data);
                    state.thumbnails.set(thumbnails);
                }
                Ok(None) => {}
                Err(error) => tracing::debug!(target: TARGET, item = %item_id, %error, "thumbnail unavailable"),
            }
        });
    }
}

impl Drop for PortalBrowserViewModel {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for PortalBrowserViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalBrowserViewModel")
            .field("portal", &self.portal)
            .field("items", &self.state.items.with(Vec::len))
            .field("error_message", &self.error_message())
            .finish()
    }
}
