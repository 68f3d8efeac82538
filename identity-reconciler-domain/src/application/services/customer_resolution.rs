use super::deadline::within;
use crate::{
    application::ports::CustomerDirectory,
    domain::{entities::Customer, errors::RepositoryError},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Resolves the institution a login belongs to.
///
/// Never fails: an unknown institution, an unreachable directory and a
/// malformed answer all mean the login proceeds without a customer.
pub struct CustomerResolutionService {
    directory: Arc<dyn CustomerDirectory>,
    call_timeout: Duration,
}

impl CustomerResolutionService {
    pub fn new(directory: Arc<dyn CustomerDirectory>, call_timeout: Duration) -> Self {
        Self {
            directory,
            call_timeout,
        }
    }

    #[instrument(skip(self))]
    pub async fn resolve(&self, org_identifier: Option<&str>) -> Option<Customer> {
        let Some(org_identifier) = org_identifier.filter(|id| !id.trim().is_empty()) else {
            info!("No organization identifier on login, continuing without customer");
            return None;
        };

        let lookup = within(
            self.call_timeout,
            self.directory.find_customer_by_org_identifier(org_identifier),
            |millis| RepositoryError::Timeout { millis },
        )
        .await;

        match lookup {
            Ok(Some(customer)) => {
                info!(
                    "Resolved organization '{}' to customer '{}'",
                    org_identifier, customer.id
                );
                Some(customer)
            }
            Ok(None) => {
                info!("No customer onboarded for organization '{}'", org_identifier);
                None
            }
            Err(e) => {
                warn!(
                    "Customer lookup for organization '{}' failed, continuing without customer: {}",
                    org_identifier, e
                );
                None
            }
        }
    }
}
