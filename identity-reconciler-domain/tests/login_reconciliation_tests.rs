use identity_reconciler_domain::{
    application::ports::{AppConfig, EventType, OutboundAttributeNames},
    domain::{entities::*, errors::DomainError},
};
use std::time::Duration;

mod mocks;
use mocks::*;

fn outbound() -> OutboundAttributeNames {
    OutboundAttributeNames::default()
}

/// First login of a staff member at an onboarded institution
#[tokio::test]
async fn test_first_login_provisions_user_with_earned_roles() {
    let harness = Harness::new(
        MockCustomerDirectory::new().with_customer(ORG_NUMBER, institution()),
        MockUserDirectory::new(),
    );

    let event = login_event("ola@uni.no", "staff", Some(ORG_NUMBER));
    let outcome = harness.service.handle_event(&event).await.unwrap();

    assert!(outcome.created);
    assert_eq!(outcome.conflict_retries, 0);
    assert!(outcome.user.has_role(BASELINE_ROLE));
    assert!(outcome.user.has_role(CREATOR_ROLE));
    assert_eq!(outcome.user.roles.len(), 2);
    assert_eq!(outcome.user.given_name.as_deref(), Some("Ola"));
    assert_eq!(
        outcome.user.customer_id().map(|id| id.as_str()),
        Some("cust-1")
    );
    assert!(outcome.roles_added.contains(CREATOR_ROLE));

    assert_eq!(harness.users.create_count(), 1);
    assert_eq!(harness.users.update_count(), 0);

    let published = harness.publisher.get_published();
    assert_eq!(published.len(), 1);
    let (published_target, attributes) = &published[0];
    assert_eq!(published_target, &target());

    let names = outbound();
    assert_eq!(attributes.get(&names.customer_id), Some("cust-1"));
    assert_eq!(attributes.get(&names.org_registry_id), Some("194.0.0.0"));
    assert_eq!(attributes.get(&names.application), Some("portal"));
    assert_eq!(attributes.get(&names.identifiers), Some("feide:ola@uni.no"));
    assert_eq!(attributes.get(&names.roles), Some("Creator,User"));
    assert_eq!(
        attributes.get(&names.access_rights),
        Some("MANAGE_OWN_RESOURCES")
    );
}

/// Affiliation changed to student: the automatic role goes, manual ones stay
#[tokio::test]
async fn test_existing_user_loses_creator_but_keeps_manual_roles() {
    let mut existing = User::new("kari@uni.no")
        .unwrap()
        .with_institution(institution().institution_link())
        .with_roles([role(BASELINE_ROLE), role(CREATOR_ROLE), role("Curator")]);
    existing.version = 4;

    let harness = Harness::new(
        MockCustomerDirectory::new().with_customer(ORG_NUMBER, institution()),
        MockUserDirectory::new().with_user(existing),
    );

    let event = login_event("kari@uni.no", "student", Some(ORG_NUMBER));
    let outcome = harness.service.handle_event(&event).await.unwrap();

    assert!(!outcome.created);
    assert!(outcome.roles_removed.contains(CREATOR_ROLE));
    assert!(outcome.roles_added.is_empty());
    assert!(outcome.user.has_role(BASELINE_ROLE));
    assert!(outcome.user.has_role("Curator"));
    assert!(!outcome.user.has_role(CREATOR_ROLE));
    assert_eq!(outcome.user.version, 5);

    assert_eq!(harness.users.create_count(), 0);
    assert_eq!(harness.users.update_count(), 1);

    let stored = harness.users.stored("kari@uni.no").unwrap();
    assert_eq!(stored.roles.names(), outcome.user.roles.names());

    let attributes = harness.publisher.last_published().unwrap();
    assert_eq!(attributes.get(&outbound().roles), Some("Curator,User"));
}

/// No organization identifier in the event: the stored link is kept
#[tokio::test]
async fn test_login_without_org_identifier_keeps_institution_link() {
    let existing = User::new("per@uni.no")
        .unwrap()
        .with_institution(institution().institution_link())
        .with_roles([role(BASELINE_ROLE)]);

    let harness = Harness::new(
        MockCustomerDirectory::new(),
        MockUserDirectory::new().with_user(existing),
    );

    let event = login_event("per@uni.no", "member", None);
    let outcome = harness.service.handle_event(&event).await.unwrap();

    assert_eq!(harness.customers.call_count(), 0);
    assert!(outcome.customer.is_none());
    assert_eq!(
        outcome.user.customer_id().map(|id| id.as_str()),
        Some("cust-1")
    );

    let attributes = harness.publisher.last_published().unwrap();
    assert_eq!(attributes.get(&outbound().customer_id), Some("cust-1"));
    assert_eq!(attributes.get(&outbound().org_registry_id), Some("194.0.0.0"));
    assert_eq!(attributes.get(&outbound().roles), Some("User"));
    assert_eq!(attributes.get(&outbound().access_rights), Some(""));
}

#[tokio::test]
async fn test_unchanged_login_still_writes_exactly_once() {
    let existing = User::new("ola@uni.no")
        .unwrap()
        .with_institution(institution().institution_link())
        .with_roles([role(BASELINE_ROLE), role(CREATOR_ROLE)]);

    let harness = Harness::new(
        MockCustomerDirectory::new().with_customer(ORG_NUMBER, institution()),
        MockUserDirectory::new().with_user(existing),
    );

    let event = login_event("ola@uni.no", "faculty", Some(ORG_NUMBER));
    let outcome = harness.service.handle_event(&event).await.unwrap();

    assert!(outcome.roles_added.is_empty());
    assert!(outcome.roles_removed.is_empty());
    assert_eq!(harness.users.write_count(), 1);
    assert_eq!(harness.publisher.get_published().len(), 1);
}

#[tokio::test]
async fn test_profile_names_are_refreshed_from_login() {
    let existing = User::new("ola@uni.no")
        .unwrap()
        .with_name("Old", "Name")
        .with_roles([role(BASELINE_ROLE)]);

    let harness = Harness::new(
        MockCustomerDirectory::new(),
        MockUserDirectory::new().with_user(existing),
    );

    let event = login_event("ola@uni.no", "member", None);
    let outcome = harness.service.handle_event(&event).await.unwrap();

    assert_eq!(outcome.user.given_name.as_deref(), Some("Ola"));
    assert_eq!(outcome.user.family_name.as_deref(), Some("Nordmann"));
}

#[tokio::test]
async fn test_customer_directory_failure_proceeds_without_customer() {
    let customers = MockCustomerDirectory::new().with_customer(ORG_NUMBER, institution());
    customers.set_should_fail(true);
    let harness = Harness::new(customers, MockUserDirectory::new());

    let event = login_event("ola@uni.no", "staff", Some(ORG_NUMBER));
    let outcome = harness.service.handle_event(&event).await.unwrap();

    assert!(outcome.customer.is_none());
    assert!(outcome.user.institution.is_none());
    assert!(outcome.user.has_role(CREATOR_ROLE));

    let attributes = harness.publisher.last_published().unwrap();
    assert!(!attributes.contains(&outbound().customer_id));
    assert!(!attributes.contains(&outbound().org_registry_id));
}

#[tokio::test]
async fn test_slow_customer_directory_is_treated_as_absent() {
    let customers = MockCustomerDirectory::new().with_customer(ORG_NUMBER, institution());
    customers.set_delay(Duration::from_millis(500));

    let mut config = AppConfig::default();
    config.http.call_timeout_ms = 50;
    let harness = Harness::with_config(customers, MockUserDirectory::new(), &config);

    let event = login_event("ola@uni.no", "staff", Some(ORG_NUMBER));
    let outcome = harness.service.handle_event(&event).await.unwrap();

    assert!(outcome.customer.is_none());
    assert!(outcome.user.institution.is_none());
}

#[tokio::test]
async fn test_unknown_org_identifier_yields_no_customer() {
    let harness = Harness::new(MockCustomerDirectory::new(), MockUserDirectory::new());

    let event = login_event("ola@uni.no", "staff", Some("NO000000000"));
    let outcome = harness.service.handle_event(&event).await.unwrap();

    assert_eq!(harness.customers.call_count(), 1);
    assert!(outcome.customer.is_none());
    assert!(outcome.created);
}

#[tokio::test]
async fn test_user_lookup_failure_falls_through_to_creation() {
    let users = MockUserDirectory::new();
    users.set_fail_reads(true);
    let harness = Harness::new(MockCustomerDirectory::new(), users);

    let event = login_event("ola@uni.no", "staff", None);
    let outcome = harness.service.handle_event(&event).await.unwrap();

    assert!(outcome.created);
    assert_eq!(harness.users.create_count(), 1);
}

#[tokio::test]
async fn test_strict_lookup_aborts_on_read_failure() {
    let users = MockUserDirectory::new();
    users.set_fail_reads(true);

    let mut config = AppConfig::default();
    config.reconcile.strict_user_lookup = true;
    let harness = Harness::with_config(MockCustomerDirectory::new(), users, &config);

    let event = login_event("ola@uni.no", "staff", None);
    let err = harness.service.handle_event(&event).await.unwrap_err();

    assert!(matches!(err, DomainError::ExternalService { .. }));
    assert_eq!(harness.users.write_count(), 0);
    assert!(harness.publisher.get_published().is_empty());
}

#[tokio::test]
async fn test_missing_external_id_aborts_before_any_directory_call() {
    let harness = Harness::new(MockCustomerDirectory::new(), MockUserDirectory::new());

    let event = AuthenticationEvent::new(POOL_ID, PROVIDER_USERNAME)
        .with_attribute("custom:affiliation", "staff")
        .with_attribute("custom:orgNumber", ORG_NUMBER);
    let err = harness.service.handle_event(&event).await.unwrap_err();

    assert!(err.is_invalid_input());
    assert_eq!(harness.customers.call_count(), 0);
    assert_eq!(harness.users.find_count(), 0);
    assert_eq!(harness.users.write_count(), 0);
    assert!(harness.publisher.get_published().is_empty());
}

#[tokio::test]
async fn test_blank_session_target_aborts_before_any_directory_call() {
    let harness = Harness::new(MockCustomerDirectory::new(), MockUserDirectory::new());

    let mut event = login_event("ola@uni.no", "staff", Some(ORG_NUMBER));
    event.user_name = "  ".to_string();
    let err = harness.service.handle_event(&event).await.unwrap_err();

    assert!(matches!(
        err,
        DomainError::InvalidInput { ref field, .. } if field == "userName"
    ));
    assert_eq!(harness.users.find_count(), 0);
    assert_eq!(harness.users.write_count(), 0);
}

#[tokio::test]
async fn test_publish_failure_escalates_after_directory_commit() {
    let harness = Harness::new(MockCustomerDirectory::new(), MockUserDirectory::new());
    harness.publisher.set_should_fail(true);

    let event = login_event("ola@uni.no", "staff", None);
    let err = harness.service.handle_event(&event).await.unwrap_err();

    match err {
        DomainError::PublishFailed {
            pool_id, username, ..
        } => {
            assert_eq!(pool_id, POOL_ID);
            assert_eq!(username, PROVIDER_USERNAME);
        }
        other => panic!("Expected PublishFailed, got {other:?}"),
    }

    // The directory write is not rolled back
    assert!(harness.users.stored("ola@uni.no").is_some());
}

#[tokio::test]
async fn test_user_write_failure_skips_publishing() {
    let users = MockUserDirectory::new();
    users.set_fail_writes(true);
    let harness = Harness::new(MockCustomerDirectory::new(), users);

    let event = login_event("ola@uni.no", "staff", None);
    let err = harness.service.handle_event(&event).await.unwrap_err();

    assert!(matches!(err, DomainError::ExternalService { .. }));
    assert!(harness.publisher.get_published().is_empty());
}

#[tokio::test]
async fn test_concurrent_write_is_retried_against_fresh_state() {
    let existing = User::new("ola@uni.no")
        .unwrap()
        .with_roles([role(BASELINE_ROLE)]);
    let users = MockUserDirectory::new().with_user(existing.clone());

    // Another login grants a manual role between our read and our write
    users.interleave_write(existing.with_roles([role(BASELINE_ROLE), role("Curator")]));
    let harness = Harness::new(MockCustomerDirectory::new(), users);

    let event = login_event("ola@uni.no", "staff", None);
    let outcome = harness.service.handle_event(&event).await.unwrap();

    assert_eq!(outcome.conflict_retries, 1);
    assert!(outcome.user.has_role("Curator"));
    assert!(outcome.user.has_role(CREATOR_ROLE));
    assert!(outcome.user.has_role(BASELINE_ROLE));
    assert_eq!(harness.users.update_count(), 2);
    assert_eq!(harness.publisher.get_published().len(), 1);
}

#[tokio::test]
async fn test_conflict_retries_are_bounded() {
    let existing = User::new("ola@uni.no")
        .unwrap()
        .with_roles([role(BASELINE_ROLE)]);
    let users = MockUserDirectory::new().with_user(existing);
    users.force_conflicts(10);
    let harness = Harness::new(MockCustomerDirectory::new(), users);

    let event = login_event("ola@uni.no", "staff", None);
    let err = harness.service.handle_event(&event).await.unwrap_err();

    assert!(matches!(err, DomainError::Conflict { .. }));
    // Initial attempt plus the default two retries
    assert_eq!(harness.users.update_count(), 3);
    assert!(harness.publisher.get_published().is_empty());
}

/// Another login creates the user between our read and our create
#[tokio::test]
async fn test_create_racing_another_login_becomes_update() {
    let mut existing = User::new("ola@uni.no")
        .unwrap()
        .with_roles([role(BASELINE_ROLE), role("Manual")]);
    existing.version = 1;
    let users = MockUserDirectory::new().with_user(existing);
    users.hide_next_reads(1);
    let harness = Harness::new(MockCustomerDirectory::new(), users);

    let event = login_event("ola@uni.no", "staff", None);
    let outcome = harness.service.handle_event(&event).await.unwrap();

    assert!(!outcome.created);
    assert_eq!(outcome.conflict_retries, 1);
    assert!(outcome.user.has_role("Manual"));
    assert!(outcome.user.has_role(CREATOR_ROLE));
    assert!(outcome.user.has_role(BASELINE_ROLE));
    assert_eq!(outcome.user.version, 2);
    assert!(outcome.roles_added.contains(CREATOR_ROLE));

    assert_eq!(harness.users.create_count(), 1);
    assert_eq!(harness.users.update_count(), 1);
    assert_eq!(harness.publisher.get_published().len(), 1);
}

/// Unreadable directory with the account already present: upstream failure
#[tokio::test]
async fn test_unreadable_existing_user_is_external_failure() {
    let existing = User::new("ola@uni.no")
        .unwrap()
        .with_roles([role(BASELINE_ROLE)]);
    let users = MockUserDirectory::new().with_user(existing);
    users.set_fail_reads(true);
    let harness = Harness::new(MockCustomerDirectory::new(), users);

    let event = login_event("ola@uni.no", "staff", None);
    let err = harness.service.handle_event(&event).await.unwrap_err();

    assert!(matches!(err, DomainError::ExternalService { .. }));
    assert_eq!(harness.users.create_count(), 1);
    assert_eq!(harness.users.update_count(), 0);
    assert!(harness.publisher.get_published().is_empty());
}

#[tokio::test]
async fn test_events_are_emitted_for_provisioning() {
    let harness = Harness::new(MockCustomerDirectory::new(), MockUserDirectory::new());

    let event = login_event("ola@uni.no", "staff", None);
    harness.service.handle_event(&event).await.unwrap();

    assert_eq!(
        harness.events.event_types(),
        vec![EventType::UserProvisioned, EventType::ClaimsPublished]
    );

    let events = harness.events.get_published_events();
    assert!(events.iter().all(|e| e.aggregate_id == "ola@uni.no"));
    assert_eq!(
        events[0].metadata.correlation_id,
        events[1].metadata.correlation_id
    );
    assert_eq!(events[1].metadata.pool_id.as_deref(), Some(POOL_ID));
}

#[tokio::test]
async fn test_events_are_emitted_for_role_changes() {
    let existing = User::new("ola@uni.no")
        .unwrap()
        .with_roles([role(BASELINE_ROLE), role(CREATOR_ROLE)]);
    let harness = Harness::new(
        MockCustomerDirectory::new(),
        MockUserDirectory::new().with_user(existing),
    );

    let event = login_event("ola@uni.no", "student", None);
    harness.service.handle_event(&event).await.unwrap();

    assert_eq!(
        harness.events.event_types(),
        vec![
            EventType::UserRolesReconciled,
            EventType::UserProfileRefreshed,
            EventType::ClaimsPublished
        ]
    );
}

#[tokio::test]
async fn test_event_publisher_failure_does_not_fail_login() {
    let harness = Harness::new(MockCustomerDirectory::new(), MockUserDirectory::new());
    harness.events.set_should_fail(true);

    let event = login_event("ola@uni.no", "staff", None);
    let outcome = harness.service.handle_event(&event).await.unwrap();

    assert!(outcome.created);
    assert_eq!(harness.publisher.get_published().len(), 1);
}

#[tokio::test]
async fn test_configured_attribute_names_are_honored() {
    let mut config = AppConfig::default();
    config.inbound.external_id = "custom:eduPersonPrincipalName".to_string();
    config.outbound.roles = "custom:roles".to_string();
    config.claims.application_marker = "archive".to_string();
    let harness = Harness::with_config(
        MockCustomerDirectory::new(),
        MockUserDirectory::new(),
        &config,
    );

    let event = AuthenticationEvent::new(POOL_ID, PROVIDER_USERNAME)
        .with_attribute("custom:eduPersonPrincipalName", "ola@uni.no")
        .with_attribute("custom:affiliation", "member");
    let outcome = harness.service.handle_event(&event).await.unwrap();

    assert_eq!(outcome.user.external_id(), "ola@uni.no");
    assert_eq!(outcome.attributes.get("custom:roles"), Some("User"));
    assert_eq!(
        outcome.attributes.get(&config.outbound.application),
        Some("archive")
    );
}
