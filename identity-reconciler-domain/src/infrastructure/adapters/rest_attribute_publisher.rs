use super::http_client::endpoint;
use crate::application::ports::AttributePublisher;
use crate::domain::{
    entities::{AttributeMap, SessionTarget},
    errors::PublishError,
};
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct AttributeUpdate<'a> {
    attributes: Vec<AttributeEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct AttributeEntry<'a> {
    name: &'a str,
    value: &'a str,
}

/// Writes custom attributes to the identity provider's admin endpoint:
/// `POST {base}/userpools/{poolId}/users/{username}/attributes`
pub struct RestAttributePublisher {
    base_url: String,
    client: reqwest::Client,
}

impl RestAttributePublisher {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }
}

#[async_trait]
impl AttributePublisher for RestAttributePublisher {
    async fn publish_attributes(
        &self,
        target: &SessionTarget,
        attributes: &AttributeMap,
    ) -> Result<(), PublishError> {
        let url = endpoint(
            &self.base_url,
            &[
                "userpools",
                &target.pool_id,
                "users",
                &target.username,
                "attributes",
            ],
        )
        .map_err(|message| PublishError::Unreachable { message })?;

        let body = AttributeUpdate {
            attributes: attributes
                .iter()
                .map(|(name, value)| AttributeEntry { name, value })
                .collect(),
        };

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PublishError::Unreachable {
                message: format!("HTTP request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(())
    }
}
