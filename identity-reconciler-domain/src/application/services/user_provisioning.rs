use super::deadline::within;
use crate::{
    application::ports::{RoleSettings, UserDirectory},
    domain::{
        entities::*,
        errors::{DomainError, DomainResult, RepositoryError},
    },
};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// What a user lookup found
#[derive(Debug)]
pub enum UserLookup {
    Found(User),
    NotFound,
    /// The read failed and was tolerated; the user may still exist
    Unavailable(RepositoryError),
}

/// Fetches, creates and saves users in the user directory
pub struct UserProvisioningService {
    directory: Arc<dyn UserDirectory>,
    roles: RoleSettings,
    strict_lookup: bool,
    call_timeout: Duration,
}

impl UserProvisioningService {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        roles: RoleSettings,
        strict_lookup: bool,
        call_timeout: Duration,
    ) -> Self {
        Self {
            directory,
            roles,
            strict_lookup,
            call_timeout,
        }
    }

    pub fn role_catalog(&self) -> &RoleCatalog {
        &self.roles.catalog
    }

    /// Look up the stored user for a principal.
    ///
    /// Unless strict lookup is enabled, a failed read is reported as absent and
    /// the login goes on to provision the account.
    #[instrument(skip(self))]
    pub async fn find_existing(&self, external_id: &str) -> DomainResult<UserLookup> {
        let lookup = within(
            self.call_timeout,
            self.directory.find_user(external_id),
            |millis| RepositoryError::Timeout { millis },
        )
        .await;

        match lookup {
            Ok(Some(user)) => {
                user.validate()?;
                info!(
                    "Found user '{}' with {} roles (version {})",
                    external_id,
                    user.roles.len(),
                    user.version
                );
                Ok(UserLookup::Found(user))
            }
            Ok(None) => {
                info!("User '{}' not found, will provision", external_id);
                Ok(UserLookup::NotFound)
            }
            Err(e) if self.strict_lookup => Err(e.into()),
            Err(e) => {
                warn!(
                    "User lookup for '{}' failed, treating as not found: {}",
                    external_id, e
                );
                Ok(UserLookup::Unavailable(e))
            }
        }
    }

    /// Build the account for a first login: baseline role, roles earned by
    /// affiliation, and the institution link when a customer resolved
    pub fn new_user(
        &self,
        principal: &Principal,
        customer: Option<&Customer>,
        automatic_roles: &BTreeSet<String>,
    ) -> DomainResult<User> {
        let mut user = User::new(principal.external_id.clone())?;
        user.given_name = principal.given_name.clone();
        user.family_name = principal.family_name.clone();
        user.institution = customer.map(Customer::institution_link);

        user.add_role(self.roles.catalog.materialize(&self.roles.baseline_role)?);
        for name in automatic_roles {
            user.add_role(self.roles.catalog.materialize(name)?);
        }

        Ok(user)
    }

    /// Create and persist the account for a first login
    #[instrument(skip(self, principal, customer), fields(external_id = %principal.external_id))]
    pub async fn provision(
        &self,
        principal: &Principal,
        customer: Option<&Customer>,
        automatic_roles: &BTreeSet<String>,
    ) -> DomainResult<User> {
        let user = self.new_user(principal, customer, automatic_roles)?;

        let created = within(
            self.call_timeout,
            self.directory.create_user(&user),
            |millis| RepositoryError::Timeout { millis },
        )
        .await?;

        info!(
            "Provisioned user '{}' with roles {:?}",
            created.external_id(),
            created.roles.names()
        );
        Ok(created)
    }

    /// Persist a reconciled user, conditional on the version it was read at
    #[instrument(skip(self, user), fields(external_id = %user.external_id(), version = user.version))]
    pub async fn save(&self, user: &User) -> DomainResult<User> {
        user.validate()?;

        let saved = within(
            self.call_timeout,
            self.directory.update_user(user),
            |millis| RepositoryError::Timeout { millis },
        )
        .await
        .map_err(DomainError::from)?;

        info!(
            "Saved user '{}' at version {}",
            saved.external_id(),
            saved.version
        );
        Ok(saved)
    }
}
