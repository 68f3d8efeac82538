pub mod http_client;
pub mod in_memory_directories;
pub mod memory_event_publisher;
pub mod rest_attribute_publisher;
pub mod rest_customer_directory;
pub mod rest_user_directory;

pub use http_client::build_http_client;
pub use in_memory_directories::*;
pub use memory_event_publisher::*;
pub use rest_attribute_publisher::*;
pub use rest_customer_directory::*;
pub use rest_user_directory::*;
