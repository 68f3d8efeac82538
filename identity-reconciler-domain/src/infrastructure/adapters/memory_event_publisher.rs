use crate::application::ports::{DomainEvent, EventError, EventPublisher};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

/// In-memory event publisher; events are delivered to the paired receiver
pub struct MemoryEventPublisher {
    sender: mpsc::UnboundedSender<DomainEvent>,
}

impl MemoryEventPublisher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DomainEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl EventPublisher for MemoryEventPublisher {
    async fn publish(&self, event: DomainEvent) -> Result<(), EventError> {
        debug!(
            "Publishing event: {} for user {}",
            event.event_type, event.aggregate_id
        );

        self.sender
            .send(event)
            .map_err(|e| EventError::PublishFailed {
                message: format!("Failed to send event: {e}"),
            })?;

        Ok(())
    }
}
