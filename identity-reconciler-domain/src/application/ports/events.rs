use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event publisher port for domain events
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a single domain event
    async fn publish(&self, event: DomainEvent) -> Result<(), EventError>;

    /// Publish multiple domain events
    async fn publish_batch(&self, events: Vec<DomainEvent>) -> Result<(), EventError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}

/// Domain event that represents something that happened during a login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    pub id: String,
    pub event_type: EventType,
    /// External identifier of the user the event concerns
    pub aggregate_id: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: EventMetadata,
    pub data: EventData,
}

impl DomainEvent {
    pub fn new(event_type: EventType, aggregate_id: String, data: EventData) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type,
            aggregate_id,
            timestamp: Utc::now(),
            metadata: EventMetadata::default(),
            data,
        }
    }

    pub fn with_metadata(mut self, metadata: EventMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn user_provisioned(
        external_id: String,
        roles: Vec<String>,
        customer_id: Option<String>,
    ) -> Self {
        Self::new(
            EventType::UserProvisioned,
            external_id,
            EventData::UserProvisioned { roles, customer_id },
        )
    }

    pub fn user_roles_reconciled(
        external_id: String,
        added: Vec<String>,
        removed: Vec<String>,
    ) -> Self {
        Self::new(
            EventType::UserRolesReconciled,
            external_id,
            EventData::UserRolesReconciled { added, removed },
        )
    }

    pub fn user_profile_refreshed(external_id: String, customer_id: Option<String>) -> Self {
        Self::new(
            EventType::UserProfileRefreshed,
            external_id,
            EventData::UserProfileRefreshed { customer_id },
        )
    }

    pub fn claims_published(external_id: String, pool_id: String, attributes: Vec<String>) -> Self {
        Self::new(
            EventType::ClaimsPublished,
            external_id,
            EventData::ClaimsPublished {
                pool_id,
                attributes,
            },
        )
    }
}

/// Types of domain events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EventType {
    UserProvisioned,
    UserRolesReconciled,
    UserProfileRefreshed,
    ClaimsPublished,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventType::UserProvisioned => "UserProvisioned",
            EventType::UserRolesReconciled => "UserRolesReconciled",
            EventType::UserProfileRefreshed => "UserProfileRefreshed",
            EventType::ClaimsPublished => "ClaimsPublished",
        };
        write!(f, "{name}")
    }
}

/// Event metadata containing contextual information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventMetadata {
    pub correlation_id: Option<String>,
    pub pool_id: Option<String>,
}

impl EventMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_correlation_id(mut self, correlation_id: String) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    pub fn with_pool_id(mut self, pool_id: String) -> Self {
        self.pool_id = Some(pool_id);
        self
    }
}

/// Event data containing the actual event payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventData {
    UserProvisioned {
        roles: Vec<String>,
        customer_id: Option<String>,
    },
    UserRolesReconciled {
        added: Vec<String>,
        removed: Vec<String>,
    },
    UserProfileRefreshed {
        customer_id: Option<String>,
    },
    ClaimsPublished {
        pool_id: String,
        /// Names of the attributes written, values are not recorded
        attributes: Vec<String>,
    },
}

/// Event-related errors
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Failed to publish event: {message}")]
    PublishFailed { message: String },

    #[error("Event serialization failed: {message}")]
    SerializationFailed { message: String },
}
