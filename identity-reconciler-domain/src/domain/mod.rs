pub mod affiliation;
pub mod entities;
pub mod errors;
pub mod reconciliation;
