//! Headless walkthrough: sign in, browse web maps, open one, identify, sign out.
//!
//! Run with: cargo run -p cartobind --example headless_session [config.toml]

use std::sync::Arc;
use std::time::Duration;

use cartobind::sdk::{
    CredentialStore, HeadlessBackend, IdentifyLayerResult, InMemoryCredentialStore, InMemoryPortalConnection, Map, Popup,
    PopupValue, ScreenPoint,
};
use cartobind::{
    AppConfig, AppContext, MapScreenViewModel, PopupViewModel, PortalBrowserViewModel, PortalSession,
    PortalUserViewModel, SessionState,
};
use tracing_subscriber::EnvFilter;

const PORTAL: &str = r#"{
    "portalName": "Demo Portal",
    "user": { "username": "jdoe", "fullName": "Jane Doe", "email": "jdoe@example.com" },
    "organization": { "id": "0123", "name": "Demo Org", "urlKey": "demo" },
    "items": [
        { "id": "parks", "title": "City Parks", "type": "Web Map", "numViews": 1204, "owner": "jdoe", "thumbnail": "parks.png" },
        { "id": "parcels", "title": "Parcels", "type": "Feature Service", "owner": "jdoe" }
    ],
    "itemData": {
        "parks": { "operationalLayers": [{ "title": "Parks" }] }
    },
    "thumbnails": { "parks.png": [137, 80, 78, 71] }
}"#;

const WAIT: Duration = Duration::from_secs(5);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    let backend = Arc::new(HeadlessBackend::new().with_results(vec![IdentifyLayerResult {
        layer_name: "Parks".into(),
        popups: vec![
            Popup::new("Golden Gate Park")
                .with_field("NAME", "Name", PopupValue::Text("Golden Gate Park".into()))
                .with_field("ACRES", "Acres", PopupValue::Double(1017.0)),
        ],
    }]));
    let credentials = InMemoryCredentialStore::new();
    let connection = InMemoryPortalConnection::from_json(PORTAL)?;

    let context = AppContext::builder(config)
        .credentials(credentials.clone())
        .connection(connection.clone())
        .backend(backend)
        .build()?;
    let ui = context.ui().clone();

    let session = PortalSession::new(context.clone());
    let _state_log = session.on_state_changed(|state| println!("session: {state:?}"));
    session.sign_in_configured()?;
    ui.run_until(|| !session.state().is_loading(), WAIT);

    let Some(portal) = session.portal() else {
        println!("sign-in failed: {}", session.error_message().unwrap_or_default());
        return Ok(());
    };

    let profile = PortalUserViewModel::new(&context, portal.clone());
    let browser = PortalBrowserViewModel::new(&context, portal);
    ui.run_until(
        || !browser.is_loading() && profile.user().is_some() && context.runtime().active_tasks() == 0,
        WAIT,
    );
    println!("{} / {:?}", profile.portal_name(), profile.user());
    for row in browser.item_rows() {
        let thumbnail = match row.thumbnail.image() {
            Some(image) => format!("{} bytes", image.len()),
            None => "placeholder".to_string(),
        };
        println!("web map: {} - {} - {} [{thumbnail}]", row.title, row.type_name, row.view_count_text());
    }

    if let Some(item) = browser.items().into_iter().next() {
        let screen = MapScreenViewModel::new(&context, Map::from_item(item, connection));
        screen.map_view().resize(390.0, 844.0);
        screen.identify_features(ScreenPoint::new(195.0, 400.0));
        ui.run_until(|| screen.popup().is_some() || screen.error_message().is_some(), WAIT);
        println!("map: {}", screen.title());
        if let Some(popup) = screen.popup() {
            for field in PopupViewModel::new(&popup).fields() {
                println!("  {}: {}", field.name, field.value);
            }
        }
    }

    session.sign_out();
    ui.run_until(|| !credentials.is_persistence_enabled(), WAIT);
    assert_eq!(session.state(), SessionState::NotSignedIn);
    Ok(())
}
