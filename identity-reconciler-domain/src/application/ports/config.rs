use crate::domain::affiliation::is_automatic;
use crate::domain::entities::{Role, RoleCatalog, BASELINE_ROLE, CREATOR_ROLE};
use crate::domain::errors::{ConfigError, DomainResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

/// Names of the event user attributes the principal is read from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InboundAttributeNames {
    pub external_id: String,
    pub given_name: String,
    pub family_name: String,
    pub org_identifier: String,
    pub affiliation: String,
}

impl Default for InboundAttributeNames {
    fn default() -> Self {
        Self {
            external_id: "custom:feideId".to_string(),
            given_name: "given_name".to_string(),
            family_name: "family_name".to_string(),
            org_identifier: "custom:orgNumber".to_string(),
            affiliation: "custom:affiliation".to_string(),
        }
    }
}

impl InboundAttributeNames {
    fn entries(&self) -> [(&'static str, &str); 5] {
        [
            ("INBOUND_EXTERNAL_ID_ATTRIBUTE", self.external_id.as_str()),
            ("INBOUND_GIVEN_NAME_ATTRIBUTE", self.given_name.as_str()),
            ("INBOUND_FAMILY_NAME_ATTRIBUTE", self.family_name.as_str()),
            ("INBOUND_ORG_IDENTIFIER_ATTRIBUTE", self.org_identifier.as_str()),
            ("INBOUND_AFFILIATION_ATTRIBUTE", self.affiliation.as_str()),
        ]
    }

    pub fn validate(&self) -> DomainResult<()> {
        validate_names(&self.entries())
    }
}

/// Names of the custom attributes written back to the identity provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutboundAttributeNames {
    pub customer_id: String,
    pub org_registry_id: String,
    pub application: String,
    pub identifiers: String,
    pub roles: String,
    pub access_rights: String,
}

impl Default for OutboundAttributeNames {
    fn default() -> Self {
        Self {
            customer_id: "custom:customerId".to_string(),
            org_registry_id: "custom:cristinId".to_string(),
            application: "custom:application".to_string(),
            identifiers: "custom:identifiers".to_string(),
            roles: "custom:applicationRoles".to_string(),
            access_rights: "custom:accessRights".to_string(),
        }
    }
}

impl OutboundAttributeNames {
    fn entries(&self) -> [(&'static str, &str); 6] {
        [
            ("OUTBOUND_CUSTOMER_ID_ATTRIBUTE", self.customer_id.as_str()),
            ("OUTBOUND_ORG_REGISTRY_ID_ATTRIBUTE", self.org_registry_id.as_str()),
            ("OUTBOUND_APPLICATION_ATTRIBUTE", self.application.as_str()),
            ("OUTBOUND_IDENTIFIERS_ATTRIBUTE", self.identifiers.as_str()),
            ("OUTBOUND_ROLES_ATTRIBUTE", self.roles.as_str()),
            ("OUTBOUND_ACCESS_RIGHTS_ATTRIBUTE", self.access_rights.as_str()),
        ]
    }

    pub fn validate(&self) -> DomainResult<()> {
        validate_names(&self.entries())
    }
}

/// Non-blank and pairwise distinct attribute names
fn validate_names(entries: &[(&'static str, &str)]) -> DomainResult<()> {
    let mut seen = HashSet::new();
    for (key, name) in entries {
        if name.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                key: key.to_string(),
            }
            .into());
        }
        if !seen.insert(*name) {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("Attribute name '{name}' is used more than once"),
            }
            .into());
        }
    }
    Ok(())
}

/// Literal claim values
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClaimSettings {
    pub application_marker: String,
    pub identifier_prefix: String,
}

impl Default for ClaimSettings {
    fn default() -> Self {
        Self {
            application_marker: "portal".to_string(),
            identifier_prefix: "feide:".to_string(),
        }
    }
}

impl ClaimSettings {
    pub fn validate(&self) -> DomainResult<()> {
        if self.application_marker.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "CLAIM_APPLICATION_MARKER".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Baseline role and the access rights of known roles
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleSettings {
    pub baseline_role: String,
    pub catalog: RoleCatalog,
}

impl Default for RoleSettings {
    fn default() -> Self {
        Self {
            baseline_role: BASELINE_ROLE.to_string(),
            catalog: RoleCatalog::new()
                .with_role(BASELINE_ROLE, Vec::<String>::new())
                .with_role(CREATOR_ROLE, ["MANAGE_OWN_RESOURCES"]),
        }
    }
}

impl RoleSettings {
    pub fn validate(&self) -> DomainResult<()> {
        Role::validate_role_name(&self.baseline_role).map_err(|_| ConfigError::InvalidValue {
            key: "ROLE_BASELINE".to_string(),
            message: "Baseline role name cannot be blank".to_string(),
        })?;

        // An automatic baseline role would be stripped on the first login
        // without a matching affiliation.
        if is_automatic(&self.baseline_role) {
            return Err(ConfigError::InvalidValue {
                key: "ROLE_BASELINE".to_string(),
                message: format!(
                    "'{}' is assigned from affiliation and cannot be the baseline role",
                    self.baseline_role
                ),
            }
            .into());
        }
        Ok(())
    }

    /// Parse `Name=RIGHT_A|RIGHT_B;Other=` into a catalog
    pub fn parse_catalog(raw: &str) -> Result<RoleCatalog, ConfigError> {
        let mut catalog = RoleCatalog::new();
        for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, rights) = entry.split_once('=').ok_or_else(|| ConfigError::InvalidValue {
                key: "ROLE_CATALOG".to_string(),
                message: format!("Expected NAME=RIGHTS, got '{entry}'"),
            })?;
            let name = name.trim();
            if name.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "ROLE_CATALOG".to_string(),
                    message: format!("Blank role name in '{entry}'"),
                });
            }
            let rights: Vec<String> = rights
                .split('|')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect();
            catalog = catalog.with_role(name, rights);
        }
        Ok(catalog)
    }
}

/// Locations of the external collaborators. Absent URLs select the in-process
/// adapters, which is only allowed outside production.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectoryConfig {
    pub customer_directory_url: Option<String>,
    pub user_directory_url: Option<String>,
    pub identity_provider_url: Option<String>,
    pub api_token: Option<String>,
}

impl DirectoryConfig {
    pub fn validate(&self, environment: &Environment) -> DomainResult<()> {
        let urls = [
            ("CUSTOMER_DIRECTORY_URL", &self.customer_directory_url),
            ("USER_DIRECTORY_URL", &self.user_directory_url),
            ("IDENTITY_PROVIDER_URL", &self.identity_provider_url),
        ];

        for (key, url) in urls {
            match url {
                Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
                    return Err(ConfigError::InvalidValue {
                        key: key.to_string(),
                        message: "Must start with http:// or https://".to_string(),
                    }
                    .into());
                }
                None if *environment == Environment::Production => {
                    return Err(ConfigError::MissingRequired {
                        key: key.to_string(),
                    }
                    .into());
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// HTTP client configuration for calls made on the login path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HttpConfig {
    pub call_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: 2000,
            connect_timeout_ms: 500,
            user_agent: "identity-reconciler/0.1.0".to_string(),
        }
    }
}

impl HttpConfig {
    pub fn validate(&self) -> DomainResult<()> {
        if self.call_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "HTTP_CALL_TIMEOUT_MS".to_string(),
                message: "Must be greater than 0".to_string(),
            }
            .into());
        }

        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "HTTP_CONNECT_TIMEOUT_MS".to_string(),
                message: "Must be greater than 0".to_string(),
            }
            .into());
        }

        Ok(())
    }

    pub fn get_call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn get_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Reconciliation behavior switches
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconcileConfig {
    /// Re-runs after a version conflict on the user directory write
    pub max_conflict_retries: u32,
    /// Abort the login when the user directory read fails instead of
    /// provisioning a new account
    pub strict_user_lookup: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: 2,
            strict_user_lookup: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
        }
    }
}

/// Log level enumeration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Log format enumeration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

/// Environment-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Staging,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub environment: Environment,
    pub inbound: InboundAttributeNames,
    pub outbound: OutboundAttributeNames,
    pub claims: ClaimSettings,
    pub roles: RoleSettings,
    pub directories: DirectoryConfig,
    pub http: HttpConfig,
    pub reconcile: ReconcileConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> DomainResult<()> {
        self.inbound.validate()?;
        self.outbound.validate()?;
        self.claims.validate()?;
        self.roles.validate()?;
        self.directories.validate(&self.environment)?;
        self.http.validate()?;
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Load configuration from environment variables
    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> DomainResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let inbound = InboundAttributeNames {
            external_id: text("INBOUND_EXTERNAL_ID_ATTRIBUTE", &defaults.inbound.external_id),
            given_name: text("INBOUND_GIVEN_NAME_ATTRIBUTE", &defaults.inbound.given_name),
            family_name: text("INBOUND_FAMILY_NAME_ATTRIBUTE", &defaults.inbound.family_name),
            org_identifier: text(
                "INBOUND_ORG_IDENTIFIER_ATTRIBUTE",
                &defaults.inbound.org_identifier,
            ),
            affiliation: text("INBOUND_AFFILIATION_ATTRIBUTE", &defaults.inbound.affiliation),
        };

        let outbound = OutboundAttributeNames {
            customer_id: text("OUTBOUND_CUSTOMER_ID_ATTRIBUTE", &defaults.outbound.customer_id),
            org_registry_id: text(
                "OUTBOUND_ORG_REGISTRY_ID_ATTRIBUTE",
                &defaults.outbound.org_registry_id,
            ),
            application: text("OUTBOUND_APPLICATION_ATTRIBUTE", &defaults.outbound.application),
            identifiers: text("OUTBOUND_IDENTIFIERS_ATTRIBUTE", &defaults.outbound.identifiers),
            roles: text("OUTBOUND_ROLES_ATTRIBUTE", &defaults.outbound.roles),
            access_rights: text(
                "OUTBOUND_ACCESS_RIGHTS_ATTRIBUTE",
                &defaults.outbound.access_rights,
            ),
        };

        let claims = ClaimSettings {
            application_marker: text(
                "CLAIM_APPLICATION_MARKER",
                &defaults.claims.application_marker,
            ),
            identifier_prefix: text("CLAIM_IDENTIFIER_PREFIX", &defaults.claims.identifier_prefix),
        };

        let roles = RoleSettings {
            baseline_role: text("ROLE_BASELINE", &defaults.roles.baseline_role),
            catalog: match lookup("ROLE_CATALOG") {
                Some(raw) => RoleSettings::parse_catalog(&raw)?,
                None => defaults.roles.catalog,
            },
        };

        let directories = DirectoryConfig {
            customer_directory_url: lookup("CUSTOMER_DIRECTORY_URL"),
            user_directory_url: lookup("USER_DIRECTORY_URL"),
            identity_provider_url: lookup("IDENTITY_PROVIDER_URL"),
            api_token: lookup("DIRECTORY_API_TOKEN"),
        };

        let http = HttpConfig {
            call_timeout_ms: parse_or(&lookup, "HTTP_CALL_TIMEOUT_MS", defaults.http.call_timeout_ms)?,
            connect_timeout_ms: parse_or(
                &lookup,
                "HTTP_CONNECT_TIMEOUT_MS",
                defaults.http.connect_timeout_ms,
            )?,
            user_agent: text("HTTP_USER_AGENT", &defaults.http.user_agent),
        };

        let reconcile = ReconcileConfig {
            max_conflict_retries: parse_or(
                &lookup,
                "RECONCILE_MAX_CONFLICT_RETRIES",
                defaults.reconcile.max_conflict_retries,
            )?,
            strict_user_lookup: parse_or(
                &lookup,
                "RECONCILE_STRICT_USER_LOOKUP",
                defaults.reconcile.strict_user_lookup,
            )?,
        };

        let logging = LoggingConfig {
            level: parse_or(&lookup, "LOG_LEVEL", defaults.logging.level)?,
            format: parse_or(&lookup, "LOG_FORMAT", defaults.logging.format)?,
        };

        let config = AppConfig {
            environment: parse_or(&lookup, "ENVIRONMENT", defaults.environment)?,
            inbound,
            outbound,
            claims,
            roles,
            directories,
            http,
            reconcile,
            logging,
        };

        config.validate()?;
        Ok(config)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// String parsing implementations
impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(format!("Invalid environment: {s}")),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {s}")),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {s}")),
        }
    }
}
