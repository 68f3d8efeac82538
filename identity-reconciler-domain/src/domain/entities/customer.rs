use super::common::EntityId;
use serde::{Deserialize, Serialize};

/// An onboarded institution as returned by the customer directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: EntityId,
    /// Identifier of the institution in the downstream organization registry
    #[serde(default)]
    pub org_registry_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Customer {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            org_registry_id: None,
            display_name: None,
        }
    }

    pub fn with_org_registry_id(mut self, org_registry_id: impl Into<String>) -> Self {
        self.org_registry_id = Some(org_registry_id.into());
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Link to store on a user affiliated with this customer
    pub fn institution_link(&self) -> InstitutionLink {
        InstitutionLink {
            customer_id: self.id.clone(),
            org_registry_id: self.org_registry_id.clone(),
        }
    }
}

/// A user's link to the institution resolved on a login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionLink {
    pub customer_id: EntityId,
    #[serde(default)]
    pub org_registry_id: Option<String>,
}
