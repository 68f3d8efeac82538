use thiserror::Error;

/// Domain-specific errors for login-time reconciliation
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("External service error: {service} - {message}")]
    ExternalService { service: String, message: String },

    #[error("Concurrent modification of {entity_type} {identifier}")]
    Conflict {
        entity_type: String,
        identifier: String,
    },

    #[error("Attribute publication failed for {username} in pool {pool_id}: {message}")]
    PublishFailed {
        pool_id: String,
        username: String,
        message: String,
    },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl DomainError {
    pub fn invalid_input(field: &str, message: impl Into<String>) -> Self {
        DomainError::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// True for failures caused by the caller's input rather than infrastructure
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, DomainError::InvalidInput { .. })
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Directory-specific errors raised by customer and user directory adapters
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Query failed: {query} - {message}")]
    QueryFailed { query: String, message: String },

    #[error("Serialization failed: {message}")]
    SerializationFailed { message: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Timeout after {millis} ms")]
    Timeout { millis: u64 },

    #[error("Version conflict for {key}: expected {expected}")]
    VersionConflict { key: String, expected: u64 },

    #[error("Entry already exists: {key}")]
    AlreadyExists { key: String },
}

impl From<RepositoryError> for DomainError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::ConnectionFailed { message } => DomainError::ExternalService {
                service: "directory".to_string(),
                message,
            },
            RepositoryError::QueryFailed { query, message } => DomainError::ExternalService {
                service: "directory".to_string(),
                message: format!("{query}: {message}"),
            },
            RepositoryError::SerializationFailed { message } => {
                DomainError::Serialization { message }
            }
            RepositoryError::NetworkError { message } => DomainError::ExternalService {
                service: "directory".to_string(),
                message,
            },
            RepositoryError::Timeout { millis } => DomainError::ExternalService {
                service: "directory".to_string(),
                message: format!("Request timed out after {millis} ms"),
            },
            RepositoryError::VersionConflict { key, .. } => DomainError::Conflict {
                entity_type: "user".to_string(),
                identifier: key,
            },
            RepositoryError::AlreadyExists { key } => DomainError::Conflict {
                entity_type: "user".to_string(),
                identifier: key,
            },
        }
    }
}

/// Identity-provider write-back errors
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Identity provider rejected attributes: HTTP {status} - {message}")]
    Rejected { status: u16, message: String },

    #[error("Identity provider unreachable: {message}")]
    Unreachable { message: String },

    #[error("Timeout after {millis} ms")]
    Timeout { millis: u64 },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}")]
    MissingRequired { key: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl From<ConfigError> for DomainError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingRequired { key } => DomainError::Configuration {
                message: format!("Missing required configuration: {key}"),
            },
            ConfigError::InvalidValue { key, message } => DomainError::Configuration {
                message: format!("Invalid value for {key}: {message}"),
            },
        }
    }
}
