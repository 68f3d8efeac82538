use super::{
    AttributePublishingService, CustomerResolutionService, UserLookup, UserProvisioningService,
};
use crate::{
    application::ports::*,
    domain::{
        affiliation::automatic_roles,
        entities::*,
        errors::{DomainError, DomainResult},
        reconciliation::reconcile_roles,
    },
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// What a login changed, for logging and tests. The trigger itself hands the
/// original event back and never exposes this to the identity provider.
#[derive(Debug, Clone)]
pub struct ReconciliationOutcome {
    pub user: User,
    pub customer: Option<Customer>,
    pub attributes: AttributeMap,
    pub created: bool,
    pub roles_added: BTreeSet<String>,
    pub roles_removed: BTreeSet<String>,
    pub conflict_retries: u32,
}

/// Result of the directory half of a login, before write-back
struct UserReconciliation {
    user: User,
    created: bool,
    added: BTreeSet<String>,
    removed: BTreeSet<String>,
}

/// Runs on every authentication event before a token is issued
pub struct LoginReconciliationService {
    customers: CustomerResolutionService,
    users: UserProvisioningService,
    attributes: AttributePublishingService,
    event_publisher: Arc<dyn EventPublisher>,
    inbound: InboundAttributeNames,
    max_conflict_retries: u32,
}

impl LoginReconciliationService {
    pub fn new(
        customer_directory: Arc<dyn CustomerDirectory>,
        user_directory: Arc<dyn UserDirectory>,
        attribute_publisher: Arc<dyn AttributePublisher>,
        event_publisher: Arc<dyn EventPublisher>,
        config: &AppConfig,
    ) -> Self {
        let call_timeout = config.http.get_call_timeout();

        Self {
            customers: CustomerResolutionService::new(customer_directory, call_timeout),
            users: UserProvisioningService::new(
                user_directory,
                config.roles.clone(),
                config.reconcile.strict_user_lookup,
                call_timeout,
            ),
            attributes: AttributePublishingService::new(
                attribute_publisher,
                config.outbound.clone(),
                config.claims.clone(),
                call_timeout,
            ),
            event_publisher,
            inbound: config.inbound.clone(),
            max_conflict_retries: config.reconcile.max_conflict_retries,
        }
    }

    /// Reconcile the login described by `event`.
    ///
    /// Input is validated before any directory call, so a malformed event
    /// never causes a write.
    #[instrument(skip(self, event), fields(pool_id = %event.user_pool_id))]
    pub async fn handle_event(
        &self,
        event: &AuthenticationEvent,
    ) -> DomainResult<ReconciliationOutcome> {
        let target = event.session_target()?;
        let principal = Principal::from_event(event, &self.inbound)?;
        self.reconcile_login(&principal, &target).await
    }

    #[instrument(skip(self, principal, target), fields(external_id = %principal.external_id))]
    pub async fn reconcile_login(
        &self,
        principal: &Principal,
        target: &SessionTarget,
    ) -> DomainResult<ReconciliationOutcome> {
        let correlation_id = Uuid::new_v4().to_string();
        let automatic = automatic_roles(principal.affiliation.as_deref());
        info!(
            "Affiliation of '{}' earns automatic roles {:?}",
            principal.external_id, automatic
        );

        let customer = self
            .customers
            .resolve(principal.org_identifier.as_deref())
            .await;

        let mut conflict_retries = 0;
        let reconciled = loop {
            match self
                .reconcile_user(principal, customer.as_ref(), &automatic)
                .await
            {
                Ok(reconciled) => break reconciled,
                Err(DomainError::Conflict { identifier, .. })
                    if conflict_retries < self.max_conflict_retries =>
                {
                    conflict_retries += 1;
                    warn!(
                        "Concurrent write to user '{}', retrying reconciliation ({}/{})",
                        identifier, conflict_retries, self.max_conflict_retries
                    );
                }
                Err(e) => return Err(e),
            }
        };

        self.publish_user_events(principal, &reconciled, customer.as_ref(), &correlation_id)
            .await;

        let attributes = self
            .attributes
            .publish(target, &reconciled.user, principal)
            .await?;

        let published = DomainEvent::claims_published(
            principal.external_id.clone(),
            target.pool_id.clone(),
            attributes.iter().map(|(name, _)| name.clone()).collect(),
        );
        self.publish_event(published, &correlation_id, &target.pool_id)
            .await;

        info!(
            "Reconciled login for '{}' (created: {}, added: {:?}, removed: {:?})",
            principal.external_id, reconciled.created, reconciled.added, reconciled.removed
        );

        Ok(ReconciliationOutcome {
            user: reconciled.user,
            customer,
            attributes,
            created: reconciled.created,
            roles_added: reconciled.added,
            roles_removed: reconciled.removed,
            conflict_retries,
        })
    }

    /// Find-or-create the user and bring it in line with this login.
    /// Performs exactly one directory write.
    async fn reconcile_user(
        &self,
        principal: &Principal,
        customer: Option<&Customer>,
        automatic: &BTreeSet<String>,
    ) -> DomainResult<UserReconciliation> {
        let mut user = match self.users.find_existing(&principal.external_id).await? {
            UserLookup::Found(user) => user,
            UserLookup::NotFound => return self.create_user(principal, customer, automatic).await,
            UserLookup::Unavailable(read_error) => {
                // An existing account that cannot be read is an upstream failure,
                // not a concurrent login.
                return match self.create_user(principal, customer, automatic).await {
                    Err(DomainError::Conflict { .. }) => {
                        warn!(
                            "User '{}' exists but could not be read",
                            principal.external_id
                        );
                        Err(read_error.into())
                    }
                    result => result,
                };
            }
        };

        let reconciliation = reconcile_roles(&user.roles, automatic, self.users.role_catalog())?;
        if !reconciliation.is_unchanged() {
            info!(
                "Reconciling roles of '{}': adding {:?}, removing {:?}",
                principal.external_id, reconciliation.added, reconciliation.removed
            );
        }
        user.set_roles(reconciliation.roles);
        user.merge_profile(principal, customer);

        let user = self.users.save(&user).await?;
        Ok(UserReconciliation {
            user,
            created: false,
            added: reconciliation.added,
            removed: reconciliation.removed,
        })
    }

    async fn create_user(
        &self,
        principal: &Principal,
        customer: Option<&Customer>,
        automatic: &BTreeSet<String>,
    ) -> DomainResult<UserReconciliation> {
        let user = self.users.provision(principal, customer, automatic).await?;
        let added = automatic
            .iter()
            .filter(|name| user.has_role(name))
            .cloned()
            .collect();
        Ok(UserReconciliation {
            user,
            created: true,
            added,
            removed: BTreeSet::new(),
        })
    }

    async fn publish_user_events(
        &self,
        principal: &Principal,
        reconciled: &UserReconciliation,
        customer: Option<&Customer>,
        correlation_id: &str,
    ) {
        let external_id = principal.external_id.clone();
        let customer_id = customer.map(|c| c.id.to_string());

        let mut events = Vec::new();
        if reconciled.created {
            events.push(DomainEvent::user_provisioned(
                external_id,
                reconciled.user.roles.names().into_iter().collect(),
                customer_id,
            ));
        } else {
            if !reconciled.added.is_empty() || !reconciled.removed.is_empty() {
                events.push(DomainEvent::user_roles_reconciled(
                    external_id.clone(),
                    reconciled.added.iter().cloned().collect(),
                    reconciled.removed.iter().cloned().collect(),
                ));
            }
            events.push(DomainEvent::user_profile_refreshed(external_id, customer_id));
        }

        let metadata = EventMetadata::new().with_correlation_id(correlation_id.to_string());
        let events = events
            .into_iter()
            .map(|event| event.with_metadata(metadata.clone()))
            .collect();

        if let Err(e) = self.event_publisher.publish_batch(events).await {
            warn!("Failed to publish user events: {}", e);
        }
    }

    async fn publish_event(&self, event: DomainEvent, correlation_id: &str, pool_id: &str) {
        let event_type = event.event_type.clone();
        let event = event.with_metadata(
            EventMetadata::new()
                .with_correlation_id(correlation_id.to_string())
                .with_pool_id(pool_id.to_string()),
        );

        if let Err(e) = self.event_publisher.publish(event).await {
            warn!("Failed to publish {} event: {}", event_type, e);
        }
    }
}
