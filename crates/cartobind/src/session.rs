//! The portal session state machine.
//!
//! ```text
//! NotSignedIn ──attempt──► Loading ──loaded with user──► SignedIn(portal)
//!                            │  ▲
//!                     failed │  │ retry
//!                            ▼  │
//!                     FailedSigningIn(error)
//!
//! sign_out: any state ──► NotSignedIn
//! ```
//!
//! Attempts while `Loading` are ignored. Entering `SignedIn` enables
//! credential persistence. Signing out revokes every credential, disables
//! persistence once revocation is over (whatever its outcome), and moves to
//! `NotSignedIn` immediately. A sign-in that completes after a sign-out or a
//! newer attempt is discarded.

use std::fmt;
use std::sync::{Arc, Weak};

use cartobind_core::{ObservableProperty, Subscription};
use parking_lot::Mutex;
use url::Url;

use crate::adapter::{CredentialStoreExt, LoadableExt};
use crate::context::AppContext;
use crate::error::{AppError, Result};
use crate::sdk::portal::Portal;

const TARGET: &str = "cartobind::session";

/// Authentication state of the application.
#[derive(Clone)]
pub enum SessionState {
    /// No portal session; the initial state and the state after sign-out.
    NotSignedIn,
    /// A sign-in attempt is loading the portal.
    Loading,
    /// The portal loaded with an authenticated user.
    SignedIn(Arc<Portal>),
    /// The last attempt failed; another attempt may be made.
    FailedSigningIn(AppError),
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn(_))
    }

    /// The signed-in portal.
    pub fn portal(&self) -> Option<&Arc<Portal>> {
        match self {
            Self::SignedIn(portal) => Some(portal),
            _ => None,
        }
    }

    /// The sign-in failure.
    pub fn error(&self) -> Option<&AppError> {
        match self {
            Self::FailedSigningIn(error) => Some(error),
            _ => None,
        }
    }
}

impl PartialEq for SessionState {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotSignedIn, Self::NotSignedIn) | (Self::Loading, Self::Loading) => true,
            (Self::SignedIn(a), Self::SignedIn(b)) => Arc::ptr_eq(a, b),
            (Self::FailedSigningIn(a), Self::FailedSigningIn(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSignedIn => f.write_str("NotSignedIn"),
            Self::Loading => f.write_str("Loading"),
            Self::SignedIn(portal) => f.debug_tuple("SignedIn").field(&portal.url().as_str()).finish(),
            Self::FailedSigningIn(error) => f.debug_tuple("FailedSigningIn").field(error).finish(),
        }
    }
}

struct SessionShared {
    state: ObservableProperty<SessionState>,
    /// Bumped by every attempt and sign-out; stale completions compare unequal.
    generation: Mutex<u64>,
}

impl SessionShared {
    /// Notify listeners of the stored state. Called after the generation lock
    /// is released, so listeners may start a new attempt.
    fn publish(&self) {
        self.state.notify();
    }

    fn finish_sign_in(&self, context: &AppContext, generation: u64, result: Result<Arc<Portal>>) {
        {
            // Compare and write under one lock: a concurrent sign-out either
            // sees the new state or makes this result stale.
            let current = self.generation.lock();
            if *current != generation {
                tracing::debug!(target: TARGET, generation, "stale sign-in result discarded");
                return;
            }
            let state = match result {
                Ok(portal) => {
                    context
                        .credentials()
                        .enable_persistence(&context.config().credentials.identifier);
                    tracing::info!(target: TARGET, url = portal.url().as_str(), "signed in");
                    SessionState::SignedIn(portal)
                }
                Err(error) => {
                    tracing::info!(target: TARGET, %error, "sign-in failed");
                    SessionState::FailedSigningIn(error)
                }
            };
            self.state.set_silent(state);
        }
        self.publish();
    }
}

/// The application's portal session.
pub struct PortalSession {
    context: AppContext,
    shared: Arc<SessionShared>,
}

impl PortalSession {
    pub fn new(context: AppContext) -> Self {
        Self {
            context,
            shared: Arc::new(SessionShared {
                state: ObservableProperty::new("status", SessionState::NotSignedIn),
                generation: Mutex::new(0),
            }),
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub fn state(&self) -> SessionState {
        self.shared.state.get()
    }

    /// The signed-in portal, if any.
    pub fn portal(&self) -> Option<Arc<Portal>> {
        self.shared.state.with(|state| state.portal().cloned())
    }

    /// The message to show for a failed sign-in.
    pub fn error_message(&self) -> Option<String> {
        self.shared.state.with(|state| state.error().map(ToString::to_string))
    }

    /// Observe the state; the current state is delivered right away.
    pub fn on_state_changed<F>(&self, slot: F) -> Subscription
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        self.shared.state.subscribe(slot)
    }

    /// Sign in to `portal`. Returns `false` if an attempt is already loading.
    #[tracing::instrument(skip_all, target = "cartobind::session", level = "debug", fields(url = portal.url().as_str()))]
    pub fn attempt_sign_in(&self, portal: Arc<Portal>) -> bool {
        let generation = {
            let mut generation = self.shared.generation.lock();
            if self.shared.state.with(SessionState::is_loading) {
                return false;
            }
            // Claim Loading under the lock; listeners are notified after it.
            self.shared.state.set_silent(SessionState::Loading);
            *generation += 1;
            *generation
        };
        self.shared.publish();

        let load = portal.load();
        let sign_in = async move {
            load.await?;
            match portal.user() {
                Some(_) => Ok(portal),
                None => Err(AppError::MissingUserCredential),
            }
        };

        let weak: Weak<SessionShared> = Arc::downgrade(&self.shared);
        let context = self.context.clone();
        self.context.runtime().spawn_with_callback(sign_in, move |result| {
            if let Some(shared) = weak.upgrade() {
                shared.finish_sign_in(&context, generation, result);
            }
        });
        true
    }

    /// Sign in to the portal at `url`, which must be an absolute http(s) URL.
    pub fn sign_in_with_url(&self, url: &str) -> Result<bool> {
        let url = Url::parse(url.trim()).map_err(|_| AppError::InvalidPortalUrl)?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(AppError::InvalidPortalUrl);
        }
        Ok(self.attempt_sign_in(self.context.portal(url, true)))
    }

    /// Sign in to the configured portal.
    pub fn sign_in_configured(&self) -> Result<bool> {
        let config = &self.context.config().portal;
        let url = self
            .context
            .config()
            .portal_url()
            .map_err(|_| AppError::InvalidPortalUrl)?;
        Ok(self.attempt_sign_in(self.context.portal(url, config.login_required)))
    }

    /// Sign out. Always ends in `NotSignedIn`; revocation failures are only
    /// logged.
    #[tracing::instrument(skip_all, target = "cartobind::session", level = "debug")]
    pub fn sign_out(&self) {
        let changed = {
            let mut generation = self.shared.generation.lock();
            *generation += 1;
            let changed = self.shared.state.with(|state| *state != SessionState::NotSignedIn);
            self.shared.state.set_silent(SessionState::NotSignedIn);
            changed
        };
        if changed {
            self.shared.publish();
        }

        let credentials = self.context.credentials().clone();
        let revoke = credentials.revoke_all();
        self.context.runtime().spawn_with_callback(revoke, move |result| {
            if let Err(error) = result {
                tracing::warn!(target: TARGET, %error, "credential revocation failed");
            }
            credentials.disable_persistence();
        });
        tracing::info!(target: TARGET, "signed out");
    }
}

impl fmt::Debug for PortalSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalSession").field("state", &self.state()).finish()
    }
}
