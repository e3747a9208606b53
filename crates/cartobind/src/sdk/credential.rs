//! The credential cache.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use cartobind_core::Completion;
use parking_lot::Mutex;

use crate::error::SdkError;

/// Where signed-in credentials live, and whether they are persisted.
pub trait CredentialStore: Send + Sync + 'static {
    /// Start syncing cached credentials to the keychain under `identifier`.
    fn enable_persistence(&self, identifier: &str);

    /// Stop syncing to the keychain.
    fn disable_persistence(&self);

    fn is_persistence_enabled(&self) -> bool;

    /// Remove every cached credential and revoke its tokens with the server.
    fn revoke_all_with_completion(&self, completion: Completion<Result<(), SdkError>>);
}

/// Something that happened to an [`InMemoryCredentialStore`], in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialEvent {
    PersistenceEnabled(String),
    PersistenceDisabled,
    RevokeStarted,
    RevokeFinished(Result<(), SdkError>),
}

type PendingRevoke = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct StoreState {
    persistence: Option<String>,
    credentials: Vec<String>,
    revoke_failure: Option<SdkError>,
    latency: Option<Duration>,
    held: bool,
    pending: Vec<PendingRevoke>,
    events: Vec<CredentialEvent>,
}

/// A credential cache kept in memory.
pub struct InMemoryCredentialStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Arc::new(Mutex::new(StoreState::default())),
        })
    }

    /// Cache a credential for `username`.
    pub fn add_credential(&self, username: impl Into<String>) {
        self.state.lock().credentials.push(username.into());
    }

    pub fn credential_count(&self) -> usize {
        self.state.lock().credentials.len()
    }

    /// The identifier persistence is enabled under.
    pub fn persistence_identifier(&self) -> Option<String> {
        self.state.lock().persistence.clone()
    }

    /// Make every revocation fail with `error` until cleared with `None`.
    pub fn set_revoke_failure(&self, error: Option<SdkError>) {
        self.state.lock().revoke_failure = error;
    }

    /// Finish revocations on a background thread after `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.state.lock().latency = latency;
    }

    /// Keep revocations unfinished until [`release`](Self::release).
    pub fn hold(&self) {
        self.state.lock().held = true;
    }

    /// Finish every held revocation and stop holding.
    pub fn release(&self) -> usize {
        let pending = {
            let mut state = self.state.lock();
            state.held = false;
            std::mem::take(&mut state.pending)
        };
        let count = pending.len();
        for revoke in pending {
            revoke();
        }
        count
    }

    /// Everything that happened so far.
    pub fn events(&self) -> Vec<CredentialEvent> {
        self.state.lock().events.clone()
    }

    /// How many times persistence was enabled.
    pub fn enable_count(&self) -> usize {
        self.count(|event| matches!(event, CredentialEvent::PersistenceEnabled(_)))
    }

    /// How many times persistence was disabled.
    pub fn disable_count(&self) -> usize {
        self.count(|event| matches!(event, CredentialEvent::PersistenceDisabled))
    }

    /// How many revocations finished.
    pub fn revoke_count(&self) -> usize {
        self.count(|event| matches!(event, CredentialEvent::RevokeFinished(_)))
    }

    fn count(&self, predicate: impl Fn(&CredentialEvent) -> bool) -> usize {
        self.state.lock().events.iter().filter(|event| predicate(event)).count()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn enable_persistence(&self, identifier: &str) {
        let mut state = self.state.lock();
        state.persistence = Some(identifier.to_string());
        state.events.push(CredentialEvent::PersistenceEnabled(identifier.to_string()));
    }

    fn disable_persistence(&self) {
        let mut state = self.state.lock();
        state.persistence = None;
        state.events.push(CredentialEvent::PersistenceDisabled);
    }

    fn is_persistence_enabled(&self) -> bool {
        self.state.lock().persistence.is_some()
    }

    fn revoke_all_with_completion(&self, completion: Completion<Result<(), SdkError>>) {
        let shared = self.state.clone();
        let finish: PendingRevoke = Box::new(move || {
            let result = {
                let mut state = shared.lock();
                let result = match state.revoke_failure.clone() {
                    Some(error) => Err(error),
                    None => {
                        state.credentials.clear();
                        Ok(())
                    }
                };
                state.events.push(CredentialEvent::RevokeFinished(result.clone()));
                result
            };
            completion(result);
        });

        let mut state = self.state.lock();
        state.events.push(CredentialEvent::RevokeStarted);
        if state.held {
            state.pending.push(finish);
            return;
        }
        let latency = state.latency;
        drop(state);

        match latency {
            Some(delay) => {
                std::thread::spawn(move || {
                    std::thread::sleep(delay);
                    finish();
                });
            }
            None => finish(),
        }
    }
}

impl fmt::Debug for InMemoryCredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("InMemoryCredentialStore")
            .field("persistence", &state.persistence)
            .field("credentials", &state.credentials.len())
            .finish()
    }
}
