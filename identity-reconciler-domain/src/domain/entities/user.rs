use super::common::*;
use super::customer::{Customer, InstitutionLink};
use super::principal::Principal;
use super::role::{Role, RoleSet};
use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};

/// Account reconciled on every login, keyed by the principal's external identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    external_id: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    #[serde(default)]
    pub institution: Option<InstitutionLink>,
    #[serde(default)]
    pub roles: RoleSet,
    /// Directory-assigned revision used for conditional writes
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub timestamps: Timestamps,
}

impl User {
    /// Create a new user with no roles
    pub fn new(external_id: impl Into<String>) -> DomainResult<Self> {
        let external_id = external_id.into();
        Self::validate_external_id(&external_id)?;

        Ok(Self {
            external_id,
            given_name: None,
            family_name: None,
            institution: None,
            roles: RoleSet::new(),
            version: 0,
            timestamps: Timestamps::default(),
        })
    }

    /// Validate the primary key; blank identifiers are never persisted
    pub fn validate_external_id(external_id: &str) -> DomainResult<()> {
        if external_id.trim().is_empty() {
            return Err(DomainError::invalid_input(
                "external_id",
                "User external identifier cannot be blank",
            ));
        }
        Ok(())
    }

    /// Re-check invariants on a user that may have been deserialized
    pub fn validate(&self) -> DomainResult<()> {
        Self::validate_external_id(&self.external_id)?;
        for role in self.roles.iter() {
            Role::validate_role_name(&role.name)?;
        }
        Ok(())
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.contains(name)
    }

    pub fn add_role(&mut self, role: Role) {
        self.roles.insert(role);
        self.timestamps.touch();
    }

    /// Replace the whole role set
    pub fn set_roles(&mut self, roles: RoleSet) {
        self.roles = roles;
        self.timestamps.touch();
    }

    pub fn with_roles<I: IntoIterator<Item = Role>>(mut self, roles: I) -> Self {
        self.roles = roles.into_iter().collect();
        self
    }

    pub fn with_name(
        mut self,
        given_name: impl Into<String>,
        family_name: impl Into<String>,
    ) -> Self {
        self.given_name = Some(given_name.into());
        self.family_name = Some(family_name.into());
        self
    }

    pub fn with_institution(mut self, link: InstitutionLink) -> Self {
        self.institution = Some(link);
        self
    }

    /// Refresh profile fields from this login.
    ///
    /// Names are always overwritten. The institution link follows the resolved
    /// customer and is left as-is when no customer resolved.
    pub fn merge_profile(&mut self, principal: &Principal, customer: Option<&Customer>) {
        self.given_name = principal.given_name.clone();
        self.family_name = principal.family_name.clone();
        if let Some(customer) = customer {
            self.institution = Some(customer.institution_link());
        }
        self.timestamps.touch();
    }

    pub fn customer_id(&self) -> Option<&EntityId> {
        self.institution.as_ref().map(|link| &link.customer_id)
    }

    pub fn org_registry_id(&self) -> Option<&str> {
        self.institution
            .as_ref()
            .and_then(|link| link.org_registry_id.as_deref())
    }

    /// Get full display name
    pub fn display_name(&self) -> String {
        match (&self.given_name, &self.family_name) {
            (Some(given), Some(family)) => format!("{given} {family}"),
            (Some(given), None) => given.clone(),
            (None, Some(family)) => family.clone(),
            (None, None) => self.external_id.clone(),
        }
    }
}
