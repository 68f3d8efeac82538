#![allow(dead_code)]

use async_trait::async_trait;
use identity_reconciler_domain::{
    application::ports::{
        AppConfig, AttributePublisher, CustomerDirectory, DomainEvent, EventError, EventPublisher,
        EventType, UserDirectory,
    },
    application::services::LoginReconciliationService,
    domain::{
        entities::*,
        errors::{PublishError, RepositoryError},
    },
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock customer directory keyed by organization identifier
pub struct MockCustomerDirectory {
    pub customers: Arc<Mutex<HashMap<String, Customer>>>,
    pub should_fail: Arc<Mutex<bool>>,
    pub delay: Arc<Mutex<Option<Duration>>>,
    pub calls: Arc<Mutex<u32>>,
}

impl MockCustomerDirectory {
    pub fn new() -> Self {
        Self {
            customers: Arc::new(Mutex::new(HashMap::new())),
            should_fail: Arc::new(Mutex::new(false)),
            delay: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_customer(self, org_identifier: &str, customer: Customer) -> Self {
        self.customers
            .lock()
            .unwrap()
            .insert(org_identifier.to_string(), customer);
        self
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        *self.should_fail.lock().unwrap() = should_fail;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn call_count(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl CustomerDirectory for MockCustomerDirectory {
    async fn find_customer_by_org_identifier(
        &self,
        org_identifier: &str,
    ) -> Result<Option<Customer>, RepositoryError> {
        *self.calls.lock().unwrap() += 1;

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if *self.should_fail.lock().unwrap() {
            return Err(RepositoryError::NetworkError {
                message: "Mock failure enabled".to_string(),
            });
        }

        Ok(self.customers.lock().unwrap().get(org_identifier).cloned())
    }
}

/// Mock user directory with versioned writes, failure switches and call counters
pub struct MockUserDirectory {
    pub users: Arc<Mutex<HashMap<String, User>>>,
    pub fail_reads: Arc<Mutex<bool>>,
    pub fail_writes: Arc<Mutex<bool>>,
    /// Number of upcoming updates rejected with a version conflict
    pub forced_conflicts: Arc<Mutex<u32>>,
    /// Write committed by "another login" just before the next update lands
    pub interleaved_write: Arc<Mutex<Option<User>>>,
    /// Number of upcoming reads that miss a stored user, as when another
    /// login creates it right after the read
    pub hidden_reads: Arc<Mutex<u32>>,
    pub find_calls: Arc<Mutex<u32>>,
    pub create_calls: Arc<Mutex<u32>>,
    pub update_calls: Arc<Mutex<u32>>,
}

impl MockUserDirectory {
    pub fn new() -> Self {
        Self {
            users: Arc::new(Mutex::new(HashMap::new())),
            fail_reads: Arc::new(Mutex::new(false)),
            fail_writes: Arc::new(Mutex::new(false)),
            forced_conflicts: Arc::new(Mutex::new(0)),
            interleaved_write: Arc::new(Mutex::new(None)),
            hidden_reads: Arc::new(Mutex::new(0)),
            find_calls: Arc::new(Mutex::new(0)),
            create_calls: Arc::new(Mutex::new(0)),
            update_calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Seed a stored user; the stored version is kept as given
    pub fn with_user(self, user: User) -> Self {
        self.users
            .lock()
            .unwrap()
            .insert(user.external_id().to_string(), user);
        self
    }

    pub fn set_fail_reads(&self, fail: bool) {
        *self.fail_reads.lock().unwrap() = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }

    pub fn force_conflicts(&self, count: u32) {
        *self.forced_conflicts.lock().unwrap() = count;
    }

    pub fn interleave_write(&self, user: User) {
        *self.interleaved_write.lock().unwrap() = Some(user);
    }

    pub fn hide_next_reads(&self, count: u32) {
        *self.hidden_reads.lock().unwrap() = count;
    }

    pub fn stored(&self, external_id: &str) -> Option<User> {
        self.users.lock().unwrap().get(external_id).cloned()
    }

    pub fn find_count(&self) -> u32 {
        *self.find_calls.lock().unwrap()
    }

    pub fn create_count(&self) -> u32 {
        *self.create_calls.lock().unwrap()
    }

    pub fn update_count(&self) -> u32 {
        *self.update_calls.lock().unwrap()
    }

    pub fn write_count(&self) -> u32 {
        self.create_count() + self.update_count()
    }
}

#[async_trait]
impl UserDirectory for MockUserDirectory {
    async fn find_user(&self, external_id: &str) -> Result<Option<User>, RepositoryError> {
        *self.find_calls.lock().unwrap() += 1;

        if *self.fail_reads.lock().unwrap() {
            return Err(RepositoryError::ConnectionFailed {
                message: "Mock read failure".to_string(),
            });
        }

        {
            let mut hidden = self.hidden_reads.lock().unwrap();
            if *hidden > 0 {
                *hidden -= 1;
                return Ok(None);
            }
        }

        Ok(self.users.lock().unwrap().get(external_id).cloned())
    }

    async fn create_user(&self, user: &User) -> Result<User, RepositoryError> {
        *self.create_calls.lock().unwrap() += 1;

        if *self.fail_writes.lock().unwrap() {
            return Err(RepositoryError::NetworkError {
                message: "Mock write failure".to_string(),
            });
        }

        let mut users = self.users.lock().unwrap();
        if users.contains_key(user.external_id()) {
            return Err(RepositoryError::AlreadyExists {
                key: user.external_id().to_string(),
            });
        }

        let mut stored = user.clone();
        stored.version = 1;
        users.insert(stored.external_id().to_string(), stored.clone());
        Ok(stored)
    }

    async fn update_user(&self, user: &User) -> Result<User, RepositoryError> {
        *self.update_calls.lock().unwrap() += 1;

        if *self.fail_writes.lock().unwrap() {
            return Err(RepositoryError::NetworkError {
                message: "Mock write failure".to_string(),
            });
        }

        let mut users = self.users.lock().unwrap();

        if let Some(mut concurrent) = self.interleaved_write.lock().unwrap().take() {
            let current = users
                .get(concurrent.external_id())
                .map(|u| u.version)
                .unwrap_or_default();
            concurrent.version = current + 1;
            users.insert(concurrent.external_id().to_string(), concurrent);
        }

        {
            let mut forced = self.forced_conflicts.lock().unwrap();
            if *forced > 0 {
                *forced -= 1;
                return Err(RepositoryError::VersionConflict {
                    key: user.external_id().to_string(),
                    expected: user.version,
                });
            }
        }

        let current = users
            .get(user.external_id())
            .map(|u| u.version)
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
        Ok(stored)
    }
}

/// Mock attribute publisher that records every write
pub struct MockAttributePublisher {
    pub published: Arc<Mutex<Vec<(SessionTarget, AttributeMap)>>>,
    pub should_fail: Arc<Mutex<bool>>,
}

impl MockAttributePublisher {
    pub fn new() -> Self {
        Self {
            published: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        *self.should_fail.lock().unwrap() = should_fail;
    }

    pub fn get_published(&self) -> Vec<(SessionTarget, AttributeMap)> {
        self.published.lock().unwrap().clone()
    }

    pub fn last_published(&self) -> Option<AttributeMap> {
        self.get_published().last().map(|(_, attributes)| attributes.clone())
    }
}

#[async_trait]
impl AttributePublisher for MockAttributePublisher {
    async fn publish_attributes(
        &self,
        target: &SessionTarget,
        attributes: &AttributeMap,
    ) -> Result<(), PublishError> {
        if *self.should_fail.lock().unwrap() {
            return Err(PublishError::Rejected {
                status: 503,
                message: "Mock failure enabled".to_string(),
            });
        }

        self.published
            .lock()
            .unwrap()
            .push((target.clone(), attributes.clone()));
        Ok(())
    }
}

/// Mock event publisher for testing
pub struct MockEventPublisher {
    pub published_events: Arc<Mutex<Vec<DomainEvent>>>,
    pub should_fail: Arc<Mutex<bool>>,
}

impl MockEventPublisher {
    pub fn new() -> Self {
        Self {
            published_events: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        *self.should_fail.lock().unwrap() = should_fail;
    }

    pub fn get_published_events(&self) -> Vec<DomainEvent> {
        self.published_events.lock().unwrap().clone()
    }

    pub fn event_types(&self) -> Vec<EventType> {
        self.get_published_events()
            .into_iter()
            .map(|event| event.event_type)
            .collect()
    }
}

#[async_trait]
impl EventPublisher for MockEventPublisher {
    async fn publish(&self, event: DomainEvent) -> Result<(), EventError> {
        if *self.should_fail.lock().unwrap() {
            return Err(EventError::PublishFailed {
                message: "Mock failure enabled".to_string(),
            });
        }

        self.published_events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Service wired to fresh mocks, with handles kept for assertions
pub struct Harness {
    pub customers: Arc<MockCustomerDirectory>,
    pub users: Arc<MockUserDirectory>,
    pub publisher: Arc<MockAttributePublisher>,
    pub events: Arc<MockEventPublisher>,
    pub service: LoginReconciliationService,
}

impl Harness {
    pub fn new(customers: MockCustomerDirectory, users: MockUserDirectory) -> Self {
        Self::with_config(customers, users, &AppConfig::default())
    }

    pub fn with_config(
        customers: MockCustomerDirectory,
        users: MockUserDirectory,
        config: &AppConfig,
    ) -> Self {
        let customers = Arc::new(customers);
        let users = Arc::new(users);
        let publisher = Arc::new(MockAttributePublisher::new());
        let events = Arc::new(MockEventPublisher::new());

        let service = LoginReconciliationService::new(
            customers.clone(),
            users.clone(),
            publisher.clone(),
            events.clone(),
            config,
        );

        Self {
            customers,
            users,
            publisher,
            events,
            service,
        }
    }
}

pub const POOL_ID: &str = "eu-west-1_pool";
pub const PROVIDER_USERNAME: &str = "feide_ola";
pub const ORG_NUMBER: &str = "NO919477822";

pub fn target() -> SessionTarget {
    SessionTarget::new(POOL_ID.to_string(), PROVIDER_USERNAME.to_string()).unwrap()
}

pub fn institution() -> Customer {
    Customer::new("cust-1")
        .with_org_registry_id("194.0.0.0")
        .with_display_name("University of Example")
}

pub fn role(name: &str) -> Role {
    Role::new(name).unwrap()
}

/// Authentication event carrying the default inbound attribute names
pub fn login_event(
    external_id: &str,
    affiliation: &str,
    org_identifier: Option<&str>,
) -> AuthenticationEvent {
    let mut event = AuthenticationEvent::new(POOL_ID, PROVIDER_USERNAME)
        .with_attribute("custom:feideId", external_id)
        .with_attribute("given_name", "Ola")
        .with_attribute("family_name", "Nordmann")
        .with_attribute("custom:affiliation", affiliation);
    if let Some(org) = org_identifier {
        event = event.with_attribute("custom:orgNumber", org);
    }
    event
}
