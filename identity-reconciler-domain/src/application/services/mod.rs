mod deadline;

pub mod attribute_publishing;
pub mod customer_resolution;
pub mod login_reconciliation;
pub mod user_provisioning;

pub use attribute_publishing::*;
pub use customer_resolution::*;
pub use login_reconciliation::*;
pub use user_provisioning::*;
