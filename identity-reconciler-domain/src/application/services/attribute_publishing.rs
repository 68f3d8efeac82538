use super::deadline::within;
use crate::{
    application::ports::{AttributePublisher, ClaimSettings, OutboundAttributeNames},
    domain::{
        entities::*,
        errors::{DomainError, DomainResult, PublishError},
    },
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};

/// Renders the reconciled user into token claims and writes them back to the
/// identity provider
pub struct AttributePublishingService {
    publisher: Arc<dyn AttributePublisher>,
    names: OutboundAttributeNames,
    claims: ClaimSettings,
    call_timeout: Duration,
}

impl AttributePublishingService {
    pub fn new(
        publisher: Arc<dyn AttributePublisher>,
        names: OutboundAttributeNames,
        claims: ClaimSettings,
        call_timeout: Duration,
    ) -> Self {
        Self {
            publisher,
            names,
            claims,
            call_timeout,
        }
    }

    /// Attribute set for `user`. Institution attributes are omitted when the
    /// user has no link; the access-right list is always present, possibly empty.
    pub fn render_attributes(&self, user: &User, principal: &Principal) -> AttributeMap {
        let mut attributes = AttributeMap::new();

        if let Some(customer_id) = user.customer_id() {
            attributes.set(&self.names.customer_id, customer_id.as_str());
        }
        if let Some(org_registry_id) = user.org_registry_id() {
            attributes.set(&self.names.org_registry_id, org_registry_id);
        }
        attributes.set(&self.names.application, &self.claims.application_marker);
        attributes.set(
            &self.names.identifiers,
            format!("{}{}", self.claims.identifier_prefix, principal.external_id),
        );
        attributes.set(&self.names.roles, join(user.roles.names()));
        attributes.set(&self.names.access_rights, join(user.roles.access_rights()));

        attributes
    }

    #[instrument(skip(self, user, principal), fields(pool_id = %target.pool_id, username = %target.username))]
    pub async fn publish(
        &self,
        target: &SessionTarget,
        user: &User,
        principal: &Principal,
    ) -> DomainResult<AttributeMap> {
        let attributes = self.render_attributes(user, principal);

        within(
            self.call_timeout,
            self.publisher.publish_attributes(target, &attributes),
            |millis| PublishError::Timeout { millis },
        )
        .await
        .map_err(|e| {
            error!(
                "Attribute write-back for '{}' failed after directory commit: {}",
                principal.external_id, e
            );
            DomainError::PublishFailed {
                pool_id: target.pool_id.clone(),
                username: target.username.clone(),
                message: e.to_string(),
            }
        })?;

        info!(
            "Published {} attributes for '{}'",
            attributes.len(),
            principal.external_id
        );
        Ok(attributes)
    }
}

fn join(values: impl IntoIterator<Item = String>) -> String {
    values.into_iter().collect::<Vec<_>>().join(",")
}
