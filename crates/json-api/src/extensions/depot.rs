//! Depot helper extensions.

use std::any::Any;

use emporium_app::{auth::Principal, domain::users::records::UserUuid};
use salvo::prelude::{Depot, StatusError};

const PRINCIPAL_DEPOT_KEY: &str = "principal";

/// Helpers for reading request-scoped values out of the depot.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError>;

    fn insert_principal(&mut self, principal: Principal);

    fn principal_or_401(&self) -> Result<Principal, StatusError>;

    /// The calling user's id.
    fn user_or_401(&self) -> Result<UserUuid, StatusError> {
        self.principal_or_401().map(|principal| principal.user_uuid)
    }

    fn admin_or_403(&self) -> Result<Principal, StatusError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError> {
        self.obtain::<T>()
            .map_err(|_ignored| StatusError::internal_server_error())
    }

    fn insert_principal(&mut self, principal: Principal) {
        self.insert(PRINCIPAL_DEPOT_KEY, principal);
    }

    fn principal_or_401(&self) -> Result<Principal, StatusError> {
        self.get::<Principal>(PRINCIPAL_DEPOT_KEY)
            .copied()
            .map_err(|_ignored| StatusError::unauthorized().brief("Authentication required"))
    }

    fn admin_or_403(&self) -> Result<Principal, StatusError> {
        let principal = self.principal_or_401()?;

        if principal.is_admin() {
            Ok(principal)
        } else {
            Err(StatusError::forbidden().brief("Admin access required"))
        }
    }
}
