/*!
# Identity Reconciler Domain

Login-time identity reconciliation using hexagonal architecture principles.

Invoked on every authentication event before a token is issued, the engine:
- resolves the principal's institution through the customer directory
- finds or creates the matching user in the user directory
- reconciles roles earned from affiliation while keeping manually granted ones
- writes the resulting claims back to the identity provider

## Architecture

```text
┌─────────────────────────────────────────────────────────────┐
│                    Primary Adapters                         │
├─────────────────────────────────────────────────────────────┤
│          HTTP trigger endpoint (identity-reconciler-api)    │
└─────────────────────────────────────────────────────────────┘
                              │
┌─────────────────────────────────────────────────────────────┐
│                Application Layer                            │
├─────────────────────────────────────────────────────────────┤
│  • LoginReconciliationService  • CustomerResolutionService  │
│  • UserProvisioningService     • AttributePublishingService │
└─────────────────────────────────────────────────────────────┘
                              │
┌─────────────────────────────────────────────────────────────┐
│                 Domain Layer (Ports)                        │
├─────────────────────────────────────────────────────────────┤
│  • CustomerDirectory   • UserDirectory                      │
│  • AttributePublisher  • EventPublisher                     │
└─────────────────────────────────────────────────────────────┘
                              │
┌─────────────────────────────────────────────────────────────┐
│              Infrastructure Layer (Adapters)                │
├─────────────────────────────────────────────────────────────┤
│  • RestCustomerDirectory     • InMemoryCustomerDirectory    │
│  • RestUserDirectory         • InMemoryUserDirectory        │
│  • RestAttributePublisher    • InMemoryAttributePublisher   │
│  • MemoryEventPublisher                                     │
└─────────────────────────────────────────────────────────────┘
```

## Usage

```rust,ignore
use identity_reconciler_domain::{
    application::services::LoginReconciliationService,
    infrastructure::adapters::*,
    AppConfig, AuthenticationEvent,
};

let config = AppConfig::from_env()?;
let (events, _receiver) = MemoryEventPublisher::new();
let service = LoginReconciliationService::new(
    Arc::new(RestCustomerDirectory::new(customer_url, client.clone())),
    Arc::new(RestUserDirectory::new(user_url, client.clone())),
    Arc::new(RestAttributePublisher::new(idp_url, client)),
    Arc::new(events),
    &config,
);

let outcome = service.handle_event(&event).await?;
```
*/

pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use application::ports::*;
pub use application::services::*;
pub use domain::entities::*;
pub use domain::errors::*;
