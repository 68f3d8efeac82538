use crate::domain::{entities::*, errors::RepositoryError};
use async_trait::async_trait;

/// Read-only lookup of onboarded institutions
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn find_customer_by_org_identifier(
        &self,
        org_identifier: &str,
    ) -> Result<Option<Customer>, RepositoryError>;
}

/// Store of reconciled user accounts keyed by external identifier
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, external_id: &str) -> Result<Option<User>, RepositoryError>;

    /// Persist a new user; fails with `AlreadyExists` if the key is taken.
    /// Returns the stored user with its assigned version.
    async fn create_user(&self, user: &User) -> Result<User, RepositoryError>;

    /// Overwrite a user, conditional on `user.version` matching the stored
    /// revision. Fails with `VersionConflict` otherwise.
    async fn update_user(&self, user: &User) -> Result<User, RepositoryError>;
}
