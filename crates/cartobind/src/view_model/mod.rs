//! View models of the application.
//!
//! [`MapViewModel`] is the generic facade over a map view. The others back
//! individual screens: they publish a few fields and announce every change
//! through `on_changed`, with results of native operations applied on the UI
//! context and dropped once the view model is disposed.

mod compass;
mod map_screen;
mod map_view;
mod popup;
mod portal_browser;
mod portal_item;
mod portal_user;

pub use compass::CompassViewModel;
pub use map_screen::{DEFAULT_TITLE, IDENTIFY_TOLERANCE, MapScreenViewModel, SCALEBAR_HEIGHT};
pub use map_view::MapViewModel;
pub use popup::{PopupDisplayField, PopupViewModel};
pub use portal_browser::PortalBrowserViewModel;
pub use portal_item::{ITEM_PLACEHOLDER, PortalItemViewModel, Thumbnail, USER_PLACEHOLDER};
pub use portal_user::{OrganizationSummary, PortalUserViewModel, UserSummary};

use cartobind_core::{ChildSubscriptions, Subscription};

/// One subscription owning several.
fn merged(subscriptions: Vec<Subscription>) -> Subscription {
    let children = ChildSubscriptions::new();
    children.replace(subscriptions);
    Subscription::with_children(Subscription::empty(), children)
}
