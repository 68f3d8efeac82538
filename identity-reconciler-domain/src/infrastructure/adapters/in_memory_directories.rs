use crate::application::ports::{AttributePublisher, CustomerDirectory, UserDirectory};
use crate::domain::{
    entities::*,
    errors::{PublishError, RepositoryError},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// In-memory customer directory for development and tests
pub struct InMemoryCustomerDirectory {
    customers: Arc<RwLock<HashMap<String, Customer>>>,
}

impl InMemoryCustomerDirectory {
    pub fn new() -> Self {
        Self {
            customers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register `customer` under an organization identifier
    pub async fn insert(&self, org_identifier: impl Into<String>, customer: Customer) {
        self.customers
            .write()
            .await
            .insert(org_identifier.into(), customer);
    }
}

impl Default for InMemoryCustomerDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryCustomerDirectory {
    async fn find_customer_by_org_identifier(
        &self,
        org_identifier: &str,
    ) -> Result<Option<Customer>, RepositoryError> {
        Ok(self.customers.read().await.get(org_identifier).cloned())
    }
}

/// In-memory user directory with versioned, conditional writes
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get all users (for testing purposes)
    pub async fn get_all_users(&self) -> Vec<User> {
        self.users.read().await.values().cloned().collect()
    }
}

impl Default for InMemoryUserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user(&self, external_id: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().await.get(external_id).cloned())
    }

    async fn create_user(&self, user: &User) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;
        if users.contains_key(user.external_id()) {
            return Err(RepositoryError::AlreadyExists {
                key: user.external_id().to_string(),
            });
        }

        let mut stored = user.clone();
        stored.version = 1;
        users.insert(stored.external_id().to_string(), stored.clone());
        debug!("Created user '{}'", stored.external_id());
        Ok(stored)
    }

    async fn update_user(&self, user: &User) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;
        let current = users
            .get(user.external_id())
            .map(|existing| existing.version)
            .ok_or_else(|| RepositoryError::QueryFailed {
                query: format!("update_user({})", user.external_id()),
                message: "User does not exist".to_string(),
            })?;

        if current != user.version {
            return Err(RepositoryError::VersionConflict {
                key: user.external_id().to_string(),
                expected: user.version,
            });
        }

        let mut stored = user.clone();
        stored.version = current + 1;
        users.insert(stored.external_id().to_string(), stored.clone());
        debug!(
            "Updated user '{}' to version {}",
            stored.external_id(),
            stored.version
        );
        Ok(stored)
    }
}

/// Attribute publisher that keeps the last write per provider account.
/// Used when no identity provider endpoint is configured.
pub struct InMemoryAttributePublisher {
    published: Arc<RwLock<HashMap<(String, String), AttributeMap>>>,
}

impl InMemoryAttributePublisher {
    pub fn new() -> Self {
        Self {
            published: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn published_for(&self, target: &SessionTarget) -> Option<AttributeMap> {
        self.published
            .read()
            .await
            .get(&(target.pool_id.clone(), target.username.clone()))
            .cloned()
    }
}

impl Default for InMemoryAttributePublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AttributePublisher for InMemoryAttributePublisher {
    async fn publish_attributes(
        &self,
        target: &SessionTarget,
        attributes: &AttributeMap,
    ) -> Result<(), PublishError> {
        info!(
            "Recording {} attributes for '{}' in pool '{}'",
            attributes.len(),
            target.username,
            target.pool_id
        );
        self.published.write().await.insert(
            (target.pool_id.clone(), target.username.clone()),
            attributes.clone(),
        );
        Ok(())
    }
}
