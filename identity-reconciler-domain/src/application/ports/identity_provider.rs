use crate::domain::{
    entities::{AttributeMap, SessionTarget},
    errors::PublishError,
};
use async_trait::async_trait;

/// Write-back of computed claims to the identity provider
#[async_trait]
pub trait AttributePublisher: Send + Sync {
    /// Store `attributes` on the provider account so the token being issued
    /// carries them
    async fn publish_attributes(
        &self,
        target: &SessionTarget,
        attributes: &AttributeMap,
    ) -> Result<(), PublishError>;
}
