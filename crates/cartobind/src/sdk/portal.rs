//! Portal, users and content items.
//!
//! The portal protocol itself belongs to the SDK; it is reached through the
//! [`PortalConnection`] trait. [`InMemoryPortalConnection`] answers from a
//! JSON portal description and can inject failures, latency, or hold replies
//! until released.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use cartobind_core::Completion;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use url::Url;

use super::image::LoadableImage;
use super::loadable::{LoadCompletion, LoadStatus, LoadTracker, Loadable};
use crate::error::SdkError;

/// Kind of a portal item, as named by the portal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PortalItemType {
    WebMap,
    FeatureService,
    MapService,
    Other(String),
}

impl From<String> for PortalItemType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "Web Map" => Self::WebMap,
            "Feature Service" => Self::FeatureService,
            "Map Service" => Self::MapService,
            _ => Self::Other(name),
        }
    }
}

impl From<PortalItemType> for String {
    fn from(kind: PortalItemType) -> Self {
        match kind {
            PortalItemType::WebMap => "Web Map".to_string(),
            PortalItemType::FeatureService => "Feature Service".to_string(),
            PortalItemType::MapService => "Map Service".to_string(),
            PortalItemType::Other(name) => name,
        }
    }
}

/// A content item stored in a portal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalItem {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub item_type: PortalItemType,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    /// Display name of the item type, when the portal provides one.
    #[serde(default, rename = "typeName")]
    pub type_name: Option<String>,
    #[serde(default, rename = "numViews")]
    pub view_count: u64,
    /// Thumbnail resource name.
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl PortalItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>, item_type: PortalItemType) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            item_type,
            snippet: None,
            owner: None,
            type_name: None,
            view_count: 0,
            thumbnail: None,
        }
    }

    pub fn is_web_map(&self) -> bool {
        self.item_type == PortalItemType::WebMap
    }

    /// The type as shown to users; falls back to the portal type name.
    pub fn display_type_name(&self) -> String {
        self.type_name
            .clone()
            .unwrap_or_else(|| String::from(self.item_type.clone()))
    }

    /// The thumbnail, fetched through `connection` when loaded.
    pub fn thumbnail_image(&self, connection: Arc<dyn PortalConnection>) -> Option<Arc<LoadableImage>> {
        self.thumbnail
            .as_ref()
            .map(|resource| LoadableImage::new(resource.clone(), connection))
    }
}

/// The organization a portal belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Organization {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "urlKey")]
    pub subdomain: Option<String>,
}

/// Account details of a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserInfo {
    pub username: String,
    #[serde(default, rename = "fullName")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Thumbnail resource name.
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// What a loaded portal describes about itself.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortalInfo {
    #[serde(default, rename = "portalName")]
    pub portal_name: Option<String>,
    #[serde(default)]
    pub user: Option<UserInfo>,
    #[serde(default)]
    pub organization: Option<Organization>,
}

/// Transport to a portal. Every call completes exactly once, on any thread.
pub trait PortalConnection: Send + Sync + 'static {
    /// Fetch the portal self-description for `url`.
    fn fetch_portal_info(&self, url: &Url, login_required: bool, completion: Completion<Result<PortalInfo, SdkError>>);

    /// Fetch the items owned by `username`.
    fn fetch_user_content(&self, username: &str, completion: Completion<Result<Vec<PortalItem>, SdkError>>);

    /// Fetch the data (web map JSON) of an item.
    fn fetch_item_data(&self, item_id: &str, completion: Completion<Result<serde_json::Value, SdkError>>);

    /// Fetch the bytes of a thumbnail resource.
    fn fetch_thumbnail(&self, resource: &str, completion: Completion<Result<Vec<u8>, SdkError>>);
}

/// A portal.
pub struct Portal {
    url: Url,
    login_required: bool,
    connection: Arc<dyn PortalConnection>,
    tracker: Arc<LoadTracker>,
    info: Arc<RwLock<Option<PortalInfo>>>,
}

impl Portal {
    pub fn new(url: Url, login_required: bool, connection: Arc<dyn PortalConnection>) -> Arc<Self> {
        Arc::new(Self {
            url,
            login_required,
            connection,
            tracker: LoadTracker::new(),
            info: Arc::new(RwLock::new(None)),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn login_required(&self) -> bool {
        self.login_required
    }

    pub fn connection(&self) -> &Arc<dyn PortalConnection> {
        &self.connection
    }

    /// The portal description; `None` until loaded.
    pub fn info(&self) -> Option<PortalInfo> {
        self.info.read().clone()
    }

    pub fn portal_name(&self) -> Option<String> {
        self.info.read().as_ref().and_then(|info| info.portal_name.clone())
    }

    pub fn organization(&self) -> Option<Organization> {
        self.info.read().as_ref().and_then(|info| info.organization.clone())
    }

    /// The signed-in user, if the loaded portal has one.
    pub fn user(&self) -> Option<PortalUser> {
        let info = self.info.read();
        let user = info.as_ref()?.user.clone()?;
        Some(PortalUser {
            info: user,
            connection: self.connection.clone(),
        })
    }
}

impl Loadable for Portal {
    fn load_status(&self) -> LoadStatus {
        self.tracker.status()
    }

    fn load_error(&self) -> Option<SdkError> {
        self.tracker.error()
    }

    fn load_with_completion(&self, completion: LoadCompletion) {
        let connection = self.connection.clone();
        let info = self.info.clone();
        let url = self.url.clone();
        let login_required = self.login_required;
        self.tracker.load(completion, move |finish| {
            connection.fetch_portal_info(
                &url,
                login_required,
                Box::new(move |result| {
                    finish(result.map(|fetched| {
                        *info.write() = Some(fetched);
                    }))
                }),
            );
        });
    }
}

impl fmt::Debug for Portal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Portal")
            .field("url", &self.url.as_str())
            .field("login_required", &self.login_required)
            .field("load_status", &self.tracker.status())
            .finish()
    }
}

/// A signed-in portal user.
#[derive(Clone)]
pub struct PortalUser {
    info: UserInfo,
    connection: Arc<dyn PortalConnection>,
}

impl PortalUser {
    pub fn username(&self) -> &str {
        &self.info.username
    }

    pub fn full_name(&self) -> Option<&str> {
        self.info.full_name.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.info.email.as_deref()
    }

    /// The user's thumbnail, if the portal has one.
    pub fn thumbnail(&self) -> Option<Arc<LoadableImage>> {
        self.info
            .thumbnail
            .as_ref()
            .map(|resource| LoadableImage::new(resource.clone(), self.connection.clone()))
    }

    /// Fetch the user's items.
    pub fn fetch_content_with_completion(&self, completion: Completion<Result<Vec<PortalItem>, SdkError>>) {
        self.connection.fetch_user_content(&self.info.username, completion);
    }
}

impl fmt::Debug for PortalUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalUser").field("info", &self.info).finish()
    }
}

/// A portal description document, as served by [`InMemoryPortalConnection`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortalDescription {
    #[serde(flatten)]
    pub info: PortalInfo,
    #[serde(default)]
    pub items: Vec<PortalItem>,
    #[serde(default, rename = "itemData")]
    pub item_data: HashMap<String, serde_json::Value>,
    /// Thumbnail bytes by resource name.
    #[serde(default)]
    pub thumbnails: HashMap<String, Vec<u8>>,
}

type Reply = Box<dyn FnOnce() + Send + 'static>;

struct ConnectionState {
    description: PortalDescription,
    failures: VecDeque<SdkError>,
    latency: Option<Duration>,
    held: bool,
    pending: Vec<Reply>,
    requests: usize,
}

/// An in-process [`PortalConnection`].
pub struct InMemoryPortalConnection {
    state: Mutex<ConnectionState>,
}

impl InMemoryPortalConnection {
    pub fn new(description: PortalDescription) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ConnectionState {
                description,
                failures: VecDeque::new(),
                latency: None,
                held: false,
                pending: Vec::new(),
                requests: 0,
            }),
        })
    }

    /// Build from a JSON portal description.
    pub fn from_json(json: &str) -> Result<Arc<Self>, SdkError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Replace the signed-in user.
    pub fn set_user(&self, user: Option<UserInfo>) {
        self.state.lock().description.info.user = user;
    }

    /// Make the next request fail with `error`. Failures queue up.
    pub fn fail_next(&self, error: SdkError) {
        self.state.lock().failures.push_back(error);
    }

    /// Deliver replies on a background thread after `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.state.lock().latency = latency;
    }

    /// Keep replies back until [`release`](Self::release).
    pub fn hold(&self) {
        self.state.lock().held = true;
    }

    /// Deliver every held reply on the calling thread and stop holding.
    pub fn release(&self) -> usize {
        let pending = {
            let mut state = self.state.lock();
            state.held = false;
            std::mem::take(&mut state.pending)
        };
        let count = pending.len();
        for reply in pending {
            reply();
        }
        count
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.state.lock().requests
    }

    /// Answer a request: `answer` computes the reply from the description
    /// unless a failure is queued.
    fn respond<T, F>(&self, answer: F, completion: Completion<Result<T, SdkError>>)
    where
        T: Send + 'static,
        F: FnOnce(&PortalDescription) -> Result<T, SdkError>,
    {
        let mut state = self.state.lock();
        state.requests += 1;
        let result = match state.failures.pop_front() {
            Some(error) => Err(error),
            None => answer(&state.description),
        };
        let reply: Reply = Box::new(move || completion(result));

        if state.held {
            state.pending.push(reply);
            return;
        }
        let latency = state.latency;
        drop(state);

        match latency {
            Some(delay) => {
                std::thread::spawn(move || {
                    std::thread::sleep(delay);
                    reply();
                });
            }
            None => reply(),
        }
    }
}

impl PortalConnection for InMemoryPortalConnection {
    fn fetch_portal_info(&self, url: &Url, login_required: bool, completion: Completion<Result<PortalInfo, SdkError>>) {
        tracing::trace!(target: "cartobind::sdk", url = url.as_str(), "portal info requested");
        self.respond(
            |description| {
                let info = description.info.clone();
                if login_required && info.user.is_none() {
                    // A login-required portal without a session loads anonymously.
                    return Ok(PortalInfo { user: None, ..info });
                }
                Ok(info)
            },
            completion,
        );
    }

    fn fetch_user_content(&self, username: &str, completion: Completion<Result<Vec<PortalItem>, SdkError>>) {
        let username = username.to_string();
        self.respond(
            move |description| {
                Ok(description
                    .items
                    .iter()
                    .filter(|item| item.owner.as_deref().is_none_or(|owner| owner == username))
                    .cloned()
                    .collect())
            },
            completion,
        );
    }

    fn fetch_item_data(&self, item_id: &str, completion: Completion<Result<serde_json::Value, SdkError>>) {
        let item_id = item_id.to_string();
        self.respond(
            move |description| {
                description
                    .item_data
                    .get(&item_id)
                    .cloned()
                    .ok_or_else(|| SdkError::invalid_response(format!("item '{item_id}' has no data")))
            },
            completion,
        );
    }

    fn fetch_thumbnail(&self, resource: &str, completion: Completion<Result<Vec<u8>, SdkError>>) {
        let resource = resource.to_string();
        self.respond(
            move |description| {
                description
                    .thumbnails
                    .get(&resource)
                    .cloned()
                    .ok_or_else(|| SdkError::invalid_response(format!("no thumbnail '{resource}'")))
            },
            completion,
        );
    }
}

impl fmt::Debug for InMemoryPortalConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("InMemoryPortalConnection")
            .field("requests", &state.requests)
            .field("held", &state.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTION: &str = r#"{
        "portalName": "Esri Demo",
        "user": { "username": "jdoe", "fullName": "Jane Doe", "email": "jdoe@example.com" },
        "organization": { "id": "org1", "name": "Example Org", "urlKey": "example" },
        "items": [
            { "id": "a", "title": "Parks", "type": "Web Map", "typeName": "Web Map", "numViews": 12, "owner": "jdoe", "thumbnail": "parks.png" },
            { "id": "b", "title": "Parcels", "type": "Feature Service", "owner": "jdoe" },
            { "id": "c", "title": "Other", "type": "Web Map", "owner": "someone" }
        ]
    }"#;

    fn url() -> Url {
        Url::parse("https://example.maps.arcgis.com").unwrap()
    }

    #[test]
    fn test_portal_loads_description() {
        let connection = InMemoryPortalConnection::from_json(DESCRIPTION).unwrap();
        let portal = Portal::new(url(), true, connection.clone());
        assert!(portal.user().is_none());

        let result = Arc::new(Mutex::new(None));
        let result_clone = result.clone();
        portal.load_with_completion(Box::new(move |err| *result_clone.lock() = Some(err)));

        assert_eq!(*result.lock(), Some(None));
        assert_eq!(portal.load_status(), LoadStatus::Loaded);
        assert_eq!(portal.portal_name().as_deref(), Some("Esri Demo"));
        assert_eq!(portal.organization().and_then(|o| o.subdomain).as_deref(), Some("example"));
        let user = portal.user().unwrap();
        assert_eq!(user.full_name(), Some("Jane Doe"));
        assert_eq!(connection.request_count(), 1);
    }

    #[test]
    fn test_user_content_is_filtered_by_owner() {
        let connection = InMemoryPortalConnection::from_json(DESCRIPTION).unwrap();
        let items = Arc::new(Mutex::new(Vec::new()));
        let items_clone = items.clone();
        connection.fetch_user_content(
            "jdoe",
            Box::new(move |result| *items_clone.lock() = result.unwrap()),
        );
        let ids: Vec<_> = items.lock().iter().map(|item| item.id.clone()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_item_display_fields() {
        let description: PortalDescription = serde_json::from_str(DESCRIPTION).unwrap();
        let parks = &description.items[0];
        assert_eq!(parks.view_count, 12);
        assert_eq!(parks.display_type_name(), "Web Map");
        assert_eq!(parks.thumbnail.as_deref(), Some("parks.png"));

        let parcels = &description.items[1];
        assert_eq!(parcels.view_count, 0);
        assert_eq!(parcels.display_type_name(), "Feature Service");
        assert!(parcels.thumbnail_image(InMemoryPortalConnection::new(PortalDescription::default())).is_none());
    }

    #[test]
    fn test_item_type_names() {
        assert_eq!(PortalItemType::from("Web Map".to_string()), PortalItemType::WebMap);
        assert_eq!(
            PortalItemType::from("Vector Tile Service".to_string()),
            PortalItemType::Other("Vector Tile Service".to_string())
        );
        assert_eq!(String::from(PortalItemType::FeatureService), "Feature Service");
    }

    #[test]
    fn test_held_replies_and_injected_failures() {
        let connection = InMemoryPortalConnection::from_json(DESCRIPTION).unwrap();
        connection.hold();
        connection.fail_next(SdkError::network("network error"));

        let result = Arc::new(Mutex::new(None));
        let result_clone = result.clone();
        connection.fetch_portal_info(&url(), true, Box::new(move |r| *result_clone.lock() = Some(r)));
        assert!(result.lock().is_none());

        assert_eq!(connection.release(), 1);
        assert_eq!(*result.lock(), Some(Err(SdkError::network("network error"))));
    }
}
