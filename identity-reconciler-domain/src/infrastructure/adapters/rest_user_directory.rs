use super::http_client::{endpoint, transport_error, unexpected_status};
use crate::application::ports::UserDirectory;
use crate::domain::{entities::User, errors::RepositoryError};
use async_trait::async_trait;
use reqwest::{header::IF_MATCH, StatusCode};
use tracing::debug;

/// User directory reached over HTTP.
///
/// - `GET {base}/users/{externalId}`: 200 with the user, 404 when absent
/// - `POST {base}/users`: create; 409 when the key is taken
/// - `PUT {base}/users/{externalId}` with `If-Match: <version>`: 409 or 412
///   when the stored version moved on
///
/// Writes answer with the stored user, carrying its new version.
pub struct RestUserDirectory {
    base_url: String,
    client: reqwest::Client,
}

impl RestUserDirectory {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    fn url(&self, segments: &[&str], query: &str) -> Result<reqwest::Url, RepositoryError> {
        endpoint(&self.base_url, segments).map_err(|message| RepositoryError::QueryFailed {
            query: query.to_string(),
            message,
        })
    }
}

#[async_trait]
impl UserDirectory for RestUserDirectory {
    async fn find_user(&self, external_id: &str) -> Result<Option<User>, RepositoryError> {
        let query = format!("find_user({external_id})");
        let url = self.url(&["users", external_id], &query)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let user: User = response.json().await.map_err(transport_error)?;
                Ok(Some(user))
            }
            _ => Err(unexpected_status(query, response).await),
        }
    }

    async fn create_user(&self, user: &User) -> Result<User, RepositoryError> {
        let query = format!("create_user({})", user.external_id());
        let url = self.url(&["users"], &query)?;

        let response = self
            .client
            .post(url)
            .json(user)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            StatusCode::CONFLICT => Err(RepositoryError::AlreadyExists {
                key: user.external_id().to_string(),
            }),
            status if status.is_success() => {
                let stored: User = response.json().await.map_err(transport_error)?;
                debug!(
                    "Created user '{}' at version {}",
                    stored.external_id(),
                    stored.version
                );
                Ok(stored)
            }
            _ => Err(unexpected_status(query, response).await),
        }
    }

    async fn update_user(&self, user: &User) -> Result<User, RepositoryError> {
        let query = format!("update_user({})", user.external_id());
        let url = self.url(&["users", user.external_id()], &query)?;

        let response = self
            .client
            .put(url)
            .header(IF_MATCH, user.version.to_string())
            .json(user)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => {
                Err(RepositoryError::VersionConflict {
                    key: user.external_id().to_string(),
                    expected: user.version,
                })
            }
            status if status.is_success() => {
                let stored: User = response.json().await.map_err(transport_error)?;
                debug!(
                    "Updated user '{}' to version {}",
                    stored.external_id(),
                    stored.version
                );
                Ok(stored)
            }
            _ => Err(unexpected_status(query, response).await),
        }
    }
}
