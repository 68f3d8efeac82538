pub mod config;
pub mod directory;
pub mod events;
pub mod identity_provider;

pub use config::*;
pub use directory::*;
pub use events::*;
pub use identity_provider::*;
