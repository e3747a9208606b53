//! Loading, content fetches and credential revocation as futures.

use cartobind_core::{Operation, operation};

use crate::error::AppError;
use crate::sdk::credential::CredentialStore;
use crate::sdk::loadable::Loadable;
use crate::sdk::portal::{PortalItem, PortalUser};

/// Load any [`Loadable`] as a future.
pub trait LoadableExt {
    /// Resolves once the object is loaded, or with [`AppError::Load`].
    fn load(&self) -> Operation<(), AppError>;
}

impl<T: Loadable + ?Sized> LoadableExt for T {
    fn load(&self) -> Operation<(), AppError> {
        operation(|resolver| {
            self.load_with_completion(Box::new(move |error| match error {
                None => resolver.succeed(()),
                Some(error) => resolver.fail(AppError::Load(error)),
            }))
        })
    }
}

/// Fetch a user's content as a future.
pub trait PortalUserExt {
    fn fetch_content(&self) -> Operation<Vec<PortalItem>, AppError>;
}

impl PortalUserExt for PortalUser {
    fn fetch_content(&self) -> Operation<Vec<PortalItem>, AppError> {
        operation(|resolver| {
            self.fetch_content_with_completion(Box::new(move |result| resolver.resolve(result.map_err(AppError::Load))))
        })
    }
}

/// Revoke credentials as a future.
pub trait CredentialStoreExt {
    /// Resolves once every credential is revoked, or with
    /// [`AppError::Revocation`].
    fn revoke_all(&self) -> Operation<(), AppError>;
}

impl<T: CredentialStore + ?Sized> CredentialStoreExt for T {
    fn revoke_all(&self) -> Operation<(), AppError> {
        operation(|resolver| {
            self.revoke_all_with_completion(Box::new(move |result| {
                resolver.resolve(result.map_err(AppError::Revocation))
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SdkError;
    use crate::sdk::credential::InMemoryCredentialStore;
    use crate::sdk::portal::{InMemoryPortalConnection, Portal, PortalDescription};
    use std::sync::Arc;
    use url::Url;

    fn portal(connection: Arc<InMemoryPortalConnection>) -> Arc<Portal> {
        Portal::new(Url::parse("https://www.arcgis.com").unwrap(), true, connection)
    }

    #[tokio::test]
    async fn test_load_resolves_after_release() {
        let connection = InMemoryPortalConnection::new(PortalDescription::default());
        connection.hold();
        let portal = portal(connection.clone());

        let load = portal.load();
        let release = tokio::task::spawn_blocking(move || connection.release());
        assert_eq!(load.await, Ok(()));
        assert_eq!(release.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_load_failure_is_a_load_error() {
        let connection = InMemoryPortalConnection::new(PortalDescription::default());
        connection.fail_next(SdkError::network("network error"));
        let result = portal(connection).load().await;
        assert_eq!(result, Err(AppError::Load(SdkError::network("network error"))));
        assert_eq!(result.unwrap_err().to_string(), "network error");
    }

    #[tokio::test]
    async fn test_revocation_failure_is_tagged() {
        let store = InMemoryCredentialStore::new();
        store.set_revoke_failure(Some(SdkError::network("offline")));
        let dynamic: Arc<dyn CredentialStore> = store;
        assert_eq!(
            dynamic.revoke_all().await,
            Err(AppError::Revocation(SdkError::network("offline")))
        );
    }

    #[tokio::test]
    async fn test_dropped_completion_abandons() {
        struct Forgetful;
        impl Loadable for Forgetful {
            fn load_status(&self) -> crate::sdk::loadable::LoadStatus {
                crate::sdk::loadable::LoadStatus::NotLoaded
            }
            fn load_error(&self) -> Option<SdkError> {
                None
            }
            fn load_with_completion(&self, completion: crate::sdk::loadable::LoadCompletion) {
                drop(completion);
            }
        }
        assert!(matches!(Forgetful.load().await, Err(AppError::OperationAbandoned(_))));
    }
}
