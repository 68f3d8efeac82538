use crate::application::ports::InboundAttributeNames;
use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Authentication event delivered by the identity provider before token issuance.
///
/// Only the fields the engine reads are modelled; callers keep the raw payload
/// around so the event can be handed back unmodified.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationEvent {
    #[serde(default)]
    pub user_pool_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub request: AuthenticationRequest,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationRequest {
    #[serde(default)]
    pub user_attributes: HashMap<String, String>,
}

impl AuthenticationEvent {
    pub fn new(user_pool_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            user_pool_id: user_pool_id.into(),
            user_name: user_name.into(),
            request: AuthenticationRequest::default(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.user_attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.request.user_attributes.get(key).map(String::as_str)
    }

    /// Address of the provider-side account that receives the computed claims
    pub fn session_target(&self) -> DomainResult<SessionTarget> {
        SessionTarget::new(self.user_pool_id.clone(), self.user_name.clone())
    }
}

/// Identity-provider coordinates for attribute write-back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTarget {
    pub pool_id: String,
    pub username: String,
}

impl SessionTarget {
    pub fn new(pool_id: String, username: String) -> DomainResult<Self> {
        if pool_id.trim().is_empty() {
            return Err(DomainError::invalid_input(
                "userPoolId",
                "User pool id cannot be blank",
            ));
        }
        if username.trim().is_empty() {
            return Err(DomainError::invalid_input(
                "userName",
                "Provider username cannot be blank",
            ));
        }
        Ok(Self { pool_id, username })
    }
}

/// The externally verified identity behind a single login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub external_id: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub affiliation: Option<String>,
    pub org_identifier: Option<String>,
}

impl Principal {
    pub fn new(external_id: impl Into<String>) -> DomainResult<Self> {
        let external_id = external_id.into();
        if external_id.trim().is_empty() {
            return Err(DomainError::invalid_input(
                "external_id",
                "Principal external identifier cannot be blank",
            ));
        }

        Ok(Self {
            external_id,
            given_name: None,
            family_name: None,
            affiliation: None,
            org_identifier: None,
        })
    }

    /// Extract the principal from the event's user attributes
    pub fn from_event(
        event: &AuthenticationEvent,
        names: &InboundAttributeNames,
    ) -> DomainResult<Self> {
        let external_id = event.attribute(&names.external_id).unwrap_or_default();
        let mut principal = Self::new(external_id)?;

        principal.given_name = non_blank(event.attribute(&names.given_name));
        principal.family_name = non_blank(event.attribute(&names.family_name));
        principal.affiliation = event.attribute(&names.affiliation).map(str::to_string);
        principal.org_identifier = non_blank(event.attribute(&names.org_identifier));
        Ok(principal)
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

    pub fn with_affiliation(mut self, affiliation: impl Into<String>) -> Self {
        self.affiliation = Some(affiliation.into());
        self
    }

    pub fn with_org_identifier(mut self, org_identifier: impl Into<String>) -> Self {
        self.org_identifier = Some(org_identifier.into());
        self
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
