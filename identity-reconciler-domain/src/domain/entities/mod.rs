pub mod common;
pub mod customer;
pub mod principal;
pub mod role;
pub mod user;

pub use common::*;
pub use customer::*;
pub use principal::*;
pub use role::*;
pub use user::*;
