use super::http_client::{endpoint, transport_error, unexpected_status};
use crate::application::ports::CustomerDirectory;
use crate::domain::{entities::Customer, errors::RepositoryError};
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

/// Customer directory reached over HTTP.
///
/// `GET {base}/customers/org/{orgIdentifier}` answers with the customer as JSON,
/// or 404 when the organization is unknown.
pub struct RestCustomerDirectory {
    base_url: String,
    client: reqwest::Client,
}

impl RestCustomerDirectory {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }
}

#[async_trait]
impl CustomerDirectory for RestCustomerDirectory {
    async fn find_customer_by_org_identifier(
        &self,
        org_identifier: &str,
    ) -> Result<Option<Customer>, RepositoryError> {
        let query = format!("find_customer_by_org_identifier({org_identifier})");
        let url = endpoint(&self.base_url, &["customers", "org", org_identifier]).map_err(
            |message| RepositoryError::QueryFailed {
                query: query.clone(),
                message,
            },
        )?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!("No customer registered for '{}'", org_identifier);
                Ok(None)
            }
            status if status.is_success() => {
                let customer: Customer = response.json().await.map_err(transport_error)?;
                Ok(Some(customer))
            }
            _ => Err(unexpected_status(query, response).await),
        }
    }
}
