//! The user profile screen.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cartobind_core::{ObservableProperty, Subscription};
use futures_util::TryFutureExt;

use super::merged;
use super::portal_item::{Thumbnail, USER_PLACEHOLDER};
use crate::adapter::LoadableExt;
use crate::context::AppContext;
use crate::sdk::portal::{Portal, PortalUser};

const TARGET: &str = "cartobind::view_model";

/// Portal name shown until the portal provides one.
const DEFAULT_PORTAL_NAME: &str = "Portal";

/// The signed-in user; missing details are empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub username: String,
    pub full_name: String,
    pub email: String,
    /// The person placeholder until the user's thumbnail loads.
    pub thumbnail: Thumbnail,
}

impl UserSummary {
    fn new(user: &PortalUser) -> Self {
        Self {
            username: user.username().to_string(),
            full_name: user.full_name().unwrap_or_default().to_string(),
            email: user.email().unwrap_or_default().to_string(),
            thumbnail: Thumbnail::Placeholder(USER_PLACEHOLDER),
        }
    }
}

/// The user's organization; missing details are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrganizationSummary {
    pub name: String,
    pub subdomain: String,
    pub id: String,
}

struct ProfileState {
    portal_name: ObservableProperty<String>,
    user: ObservableProperty<Option<UserSummary>>,
    organization: ObservableProperty<Option<OrganizationSummary>>,
    error_message: ObservableProperty<Option<String>>,
    disposed: AtomicBool,
}

/// Portal, user and organization details of a signed-in session.
pub struct PortalUserViewModel {
    portal: Arc<Portal>,
    state: Arc<ProfileState>,
}

impl PortalUserViewModel {
    pub fn new(context: &AppContext, portal: Arc<Portal>) -> Self {
        let state = Arc::new(ProfileState {
            portal_name: ObservableProperty::new("portalName", DEFAULT_PORTAL_NAME.to_string()),
            user: ObservableProperty::new("user", None),
            organization: ObservableProperty::new("organization", None),
            error_message: ObservableProperty::new("errorMessage", None),
            disposed: AtomicBool::new(false),
        });
        let vm = Self { portal, state };
        vm.fetch(context);
        vm
    }

    /// Load the portal again, e.g. after a failure.
    pub fn reload(&self, context: &AppContext) {
        self.fetch(context);
    }

    fn fetch(&self, context: &AppContext) {
        if self.is_disposed() {
            return;
        }
        let weak = Arc::downgrade(&self.state);
        let loaded = self.portal.clone();
        let thumbnail_context = context.clone();
        context.runtime().spawn_with_callback(self.portal.load(), move |result| {
            let Some(state) = weak.upgrade() else { return };
            if state.disposed.load(Ordering::SeqCst) {
                return;
            }
            if let Err(error) = result {
                state.error_message.set(Some(error.to_string()));
                return;
            }
            state.error_message.set(None);
            state
                .portal_name
                .set(loaded.portal_name().unwrap_or_else(|| DEFAULT_PORTAL_NAME.to_string()));
            if let Some(organization) = loaded.organization() {
                state.organization.set(Some(OrganizationSummary {
                    name: organization.name.unwrap_or_default(),
                    subdomain: organization.subdomain.unwrap_or_default(),
                    id: organization.id.unwrap_or_default(),
                }));
            }
            if let Some(user) = loaded.user() {
                state.user.set(Some(UserSummary::new(&user)));
                load_user_thumbnail(&thumbnail_context, &state, &user);
            }
        });
    }

    pub fn portal(&self) -> &Arc<Portal> {
        &self.portal
    }

    pub fn portal_name(&self) -> String {
        self.state.portal_name.get()
    }

    pub fn user(&self) -> Option<UserSummary> {
        self.state.user.get()
    }

    pub fn organization(&self) -> Option<OrganizationSummary> {
        self.state.organization.get()
    }

    pub fn error_message(&self) -> Option<String> {
        self.state.error_message.get()
    }

    pub fn on_changed<F>(&self, slot: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        if self.is_disposed() {
            return Subscription::empty();
        }
        let slot = Arc::new(slot);
        let (name, user, organization, error) = (slot.clone(), slot.clone(), slot.clone(), slot);
        merged(vec![
            self.state.portal_name.connect_changes(move |_| name()),
            self.state.user.connect_changes(move |_| user()),
            self.state.organization.connect_changes(move |_| organization()),
            self.state.error_message.connect_changes(move |_| error()),
        ])
    }

    pub fn dispose(&self) -> bool {
        !self.state.disposed.swap(true, Ordering::SeqCst)
    }

    pub fn is_disposed(&self) -> bool {
        self.state.disposed.load(Ordering::SeqCst)
    }
}

/// Swap the placeholder for the user's thumbnail once it loads. Failures keep
/// the placeholder.
fn load_user_thumbnail(context: &AppContext, state: &Arc<ProfileState>, user: &PortalUser) {
    let Some(image) = user.thumbnail() else { return };
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
                if let Some(mut summary) = state.user.get() {
                    summary.thumbnail = Thumbnail::Image(data);
                    state.user.set(Some(summary));
                }
            }
            Ok(None) => {}
            Err(error) => tracing::debug!(target: TARGET, %error, "user thumbnail unavailable"),
        }
    });
}

impl Drop for PortalUserViewModel {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for PortalUserViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalUserViewModel")
            .field("portal_name", &self.portal_name())
            .field("user", &self.user())
            .finish()
    }
}
