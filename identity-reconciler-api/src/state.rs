use crate::config::Config;
use identity_reconciler_domain::{
    application::{
        ports::{AttributePublisher, CustomerDirectory, DirectoryConfig, UserDirectory},
        services::LoginReconciliationService,
    },
    domain::errors::DomainResult,
    infrastructure::adapters::{
        build_http_client, InMemoryAttributePublisher, InMemoryCustomerDirectory,
        InMemoryUserDirectory, MemoryEventPublisher, RestAttributePublisher,
        RestCustomerDirectory, RestUserDirectory,
    },
};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub reconciler: Arc<LoginReconciliationService>,
}

impl AppState {
    /// Wire the reconciliation service to the configured collaborators.
    /// Collaborators without a URL fall back to in-process adapters.
    pub async fn new(config: &Config) -> DomainResult<Self> {
        let app = &config.app;
        let client = build_http_client(&app.http, app.directories.api_token.as_deref())?;
        let DirectoryConfig {
            customer_directory_url,
            user_directory_url,
            identity_provider_url,
            ..
        } = &app.directories;

        let customer_directory: Arc<dyn CustomerDirectory> = match customer_directory_url {
            Some(url) => Arc::new(RestCustomerDirectory::new(url.clone(), client.clone())),
            None => {
                warn!("CUSTOMER_DIRECTORY_URL not set, using in-memory customer directory");
                Arc::new(InMemoryCustomerDirectory::new())
            }
        };

        let user_directory: Arc<dyn UserDirectory> = match user_directory_url {
            Some(url) => Arc::new(RestUserDirectory::new(url.clone(), client.clone())),
            None => {
                warn!("USER_DIRECTORY_URL not set, using in-memory user directory");
                Arc::new(InMemoryUserDirectory::new())
            }
        };

        let attribute_publisher: Arc<dyn AttributePublisher> = match identity_provider_url {
            Some(url) => Arc::new(RestAttributePublisher::new(url.clone(), client)),
            None => {
                warn!("IDENTITY_PROVIDER_URL not set, attributes are kept in memory");
                Arc::new(InMemoryAttributePublisher::new())
            }
        };

        let (event_publisher, mut event_receiver) = MemoryEventPublisher::new();
        tokio::spawn(async move {
            while let Some(event) = event_receiver.recv().await {
                info!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    external_id = %event.aggregate_id,
                    "Domain event"
                );
            }
        });

        let reconciler = LoginReconciliationService::new(
            customer_directory,
            user_directory,
            attribute_publisher,
            Arc::new(event_publisher),
            app,
        );

        Ok(Self::with_reconciler(config.clone(), Arc::new(reconciler)))
    }

    pub fn with_reconciler(config: Config, reconciler: Arc<LoginReconciliationService>) -> Self {
        Self { config, reconciler }
    }
}
