//! Tests for the portal session state machine.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use cartobind::sdk::{
    CredentialEvent, CredentialStore, InMemoryCredentialStore, InMemoryPortalConnection, PortalConnection,
    PortalDescription, PortalInfo, PortalItem, UserInfo,
};
use cartobind::{AppConfig, AppContext, AppError, Completion, PortalSession, SdkError, SessionState, Subscription};
use parking_lot::Mutex;
use url::Url;

const PORTAL_URL: &str = "https://maps.example.com/portal";
const WAIT: Duration = Duration::from_secs(5);

struct Harness {
    context: AppContext,
    credentials: Arc<InMemoryCredentialStore>,
    connection: Arc<InMemoryPortalConnection>,
    session: PortalSession,
}

/// Forwards to an in-memory portal, except that it can lose the next portal
/// request by dropping its completion unanswered.
struct LossyConnection {
    inner: Arc<InMemoryPortalConnection>,
    lose_next: AtomicBool,
}

impl PortalConnection for LossyConnection {
    fn fetch_portal_info(&self, url: &Url, login_required: bool, completion: Completion<Result<PortalInfo, SdkError>>) {
        if self.lose_next.swap(false, Ordering::SeqCst) {
            drop(completion);
            return;
        }
        self.inner.fetch_portal_info(url, login_required, completion);
    }

    fn fetch_user_content(&self, username: &str, completion: Completion<Result<Vec<PortalItem>, SdkError>>) {
        self.inner.fetch_user_content(username, completion);
    }

    fn fetch_item_data(&self, item_id: &str, completion: Completion<Result<serde_json::Value, SdkError>>) {
        self.inner.fetch_item_data(item_id, completion);
    }

    fn fetch_thumbnail(&self, resource: &str, completion: Completion<Result<Vec<u8>, SdkError>>) {
        self.inner.fetch_thumbnail(resource, completion);
    }
}

fn description(user: Option<&str>) -> PortalDescription {
    let mut description = PortalDescription::default();
    description.info.portal_name = Some("Example Portal".into());
    description.info.user = user.map(|username| UserInfo {
        username: username.into(),
        full_name: Some("Jane Doe".into()),
        email: None,
        thumbnail: None,
    });
    description
}

impl Harness {
    fn new(user: Option<&str>) -> Self {
        let credentials = InMemoryCredentialStore::new();
        let connection = InMemoryPortalConnection::new(description(user));
        let context = AppContext::builder(AppConfig::default().with_worker_threads(1))
            .credentials(credentials.clone())
            .connection(connection.clone())
            .build()
            .expect("Failed to build context");
        let session = PortalSession::new(context.clone());
        Self {
            context,
            credentials,
            connection,
            session,
        }
    }

    fn wait_until(&self, done: impl FnMut() -> bool) {
        assert!(self.context.ui().run_until(done, WAIT), "timed out waiting");
    }

    /// Drive the UI context until every spawned operation has reported back.
    fn settle(&self) {
        self.wait_until(|| self.context.runtime().active_tasks() == 0);
    }

    fn record_states(&self) -> (Arc<Mutex<Vec<SessionState>>>, Subscription) {
        let states = Arc::new(Mutex::new(Vec::new()));
        let sink = states.clone();
        let subscription = self.session.on_state_changed(move |state| sink.lock().push(state.clone()));
        (states, subscription)
    }

    fn sign_in(&self) {
        assert_eq!(self.session.sign_in_with_url(PORTAL_URL), Ok(true));
        self.wait_until(|| !self.session.state().is_loading());
    }
}

#[test]
fn test_sign_in_reaches_signed_in() {
    let h = Harness::new(Some("jdoe"));
    let (states, _subscription) = h.record_states();

    assert_eq!(h.session.sign_in_with_url(PORTAL_URL), Ok(true));
    // The result is applied on the UI context, which has not run yet.
    assert!(h.session.state().is_loading());

    h.wait_until(|| h.session.state().is_signed_in());
    let portal = h.session.portal().expect("signed in without a portal");
    assert_eq!(portal.url().as_str(), PORTAL_URL);
    assert_eq!(portal.user().map(|user| user.username().to_string()), Some("jdoe".to_string()));

    let states = states.lock();
    assert_eq!(states.len(), 3);
    assert_eq!(states[0], SessionState::NotSignedIn);
    assert_eq!(states[1], SessionState::Loading);
    assert!(states[2].is_signed_in());

    assert_eq!(h.credentials.enable_count(), 1);
    assert_eq!(h.credentials.persistence_identifier().as_deref(), Some("cartobind"));
}

#[test]
fn test_sign_in_with_configured_portal() {
    let h = Harness::new(Some("jdoe"));
    assert_eq!(h.session.sign_in_configured(), Ok(true));
    h.wait_until(|| h.session.state().is_signed_in());
    let portal = h.session.portal().unwrap();
    assert_eq!(portal.url().as_str(), "https://www.arcgis.com/");
    assert!(portal.login_required());
}

#[test]
fn test_attempt_while_loading_is_ignored() {
    let h = Harness::new(Some("jdoe"));
    h.connection.hold();

    assert_eq!(h.session.sign_in_with_url(PORTAL_URL), Ok(true));
    assert_eq!(h.session.sign_in_with_url(PORTAL_URL), Ok(false));
    assert_eq!(h.connection.request_count(), 1);
    assert_eq!(h.credentials.enable_count(), 0);

    assert_eq!(h.connection.release(), 1);
    h.wait_until(|| h.session.state().is_signed_in());
    assert_eq!(h.credentials.enable_count(), 1);
}

#[test]
fn test_failed_sign_in_then_retry() {
    let h = Harness::new(Some("jdoe"));
    h.connection.fail_next(SdkError::network("network error"));

    h.sign_in();
    assert_eq!(
        h.session.state(),
        SessionState::FailedSigningIn(AppError::Load(SdkError::network("network error")))
    );
    assert_eq!(h.session.error_message().as_deref(), Some("network error"));
    assert!(h.session.portal().is_none());
    assert_eq!(h.credentials.enable_count(), 0);

    h.sign_in();
    assert!(h.session.state().is_signed_in());
    assert_eq!(h.session.error_message(), None);
    assert_eq!(h.credentials.enable_count(), 1);
}

#[test]
fn test_portal_without_user_fails() {
    let h = Harness::new(None);
    h.sign_in();
    assert_eq!(h.session.state().error(), Some(&AppError::MissingUserCredential));
    assert!(!h.credentials.is_persistence_enabled());
}

#[test]
fn test_sign_out_disables_persistence_after_revocation() {
    let h = Harness::new(Some("jdoe"));
    h.sign_in();
    h.credentials.add_credential("jdoe");
    h.credentials.hold();

    h.session.sign_out();
    assert_eq!(h.session.state(), SessionState::NotSignedIn);
    // Persistence stays on until revocation reports back.
    assert!(h.credentials.is_persistence_enabled());

    assert_eq!(h.credentials.release(), 1);
    h.wait_until(|| !h.credentials.is_persistence_enabled());
    assert_eq!(h.credentials.credential_count(), 0);

    let events = h.credentials.events();
    assert_eq!(
        events[events.len() - 3..],
        [
            CredentialEvent::RevokeStarted,
            CredentialEvent::RevokeFinished(Ok(())),
            CredentialEvent::PersistenceDisabled,
        ]
    );
}

#[test]
fn test_sign_out_survives_revocation_failure() {
    let h = Harness::new(Some("jdoe"));
    h.sign_in();
    h.credentials.add_credential("jdoe");
    h.credentials.set_revoke_failure(Some(SdkError::network("offline")));

    h.session.sign_out();
    h.wait_until(|| h.credentials.disable_count() == 1);

    assert_eq!(h.session.state(), SessionState::NotSignedIn);
    assert!(!h.credentials.is_persistence_enabled());
    assert_eq!(h.credentials.credential_count(), 1);
    assert!(h
        .credentials
        .events()
        .contains(&CredentialEvent::RevokeFinished(Err(SdkError::network("offline")))));
}

#[test]
fn test_sign_in_finishing_after_sign_out_is_discarded() {
    let h = Harness::new(Some("jdoe"));
    let (states, _subscription) = h.record_states();
    h.connection.hold();

    assert_eq!(h.session.sign_in_with_url(PORTAL_URL), Ok(true));
    h.session.sign_out();
    assert_eq!(h.connection.release(), 1);
    h.settle();

    assert_eq!(h.session.state(), SessionState::NotSignedIn);
    assert_eq!(h.credentials.enable_count(), 0);
    assert_eq!(
        *states.lock(),
        vec![SessionState::NotSignedIn, SessionState::Loading, SessionState::NotSignedIn]
    );
}

#[test]
fn test_sign_out_when_signed_out() {
    let h = Harness::new(Some("jdoe"));
    h.session.sign_out();
    h.settle();

    assert_eq!(h.session.state(), SessionState::NotSignedIn);
    assert_eq!(h.credentials.revoke_count(), 1);
    assert_eq!(h.credentials.disable_count(), 1);
}

#[test]
fn test_sign_in_after_sign_out() {
    let h = Harness::new(Some("jdoe"));
    h.sign_in();
    h.session.sign_out();
    h.settle();

    h.sign_in();
    assert!(h.session.state().is_signed_in());
    assert_eq!(h.credentials.enable_count(), 2);
    assert!(h.credentials.is_persistence_enabled());
}

#[test]
fn test_lost_portal_reply_fails_and_allows_retry() {
    let connection = Arc::new(LossyConnection {
        inner: InMemoryPortalConnection::new(description(Some("jdoe"))),
        lose_next: AtomicBool::new(true),
    });
    let context = AppContext::builder(AppConfig::default().with_worker_threads(1))
        .connection(connection.clone())
        .build()
        .expect("Failed to build context");
    let session = PortalSession::new(context.clone());

    assert_eq!(session.sign_in_with_url(PORTAL_URL), Ok(true));
    assert!(context.ui().run_until(|| !session.state().is_loading(), WAIT));
    assert_eq!(
        session.state(),
        SessionState::FailedSigningIn(AppError::Load(SdkError::Cancelled))
    );
    assert!(context.ui().run_until(|| context.runtime().active_tasks() == 0, WAIT));

    assert_eq!(session.sign_in_with_url(PORTAL_URL), Ok(true));
    assert!(context.ui().run_until(|| session.state().is_signed_in(), WAIT));
}
