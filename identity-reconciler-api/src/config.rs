use identity_reconciler_domain::{
    application::ports::AppConfig,
    domain::errors::{ConfigError, DomainResult},
};
use std::env;

/// Server settings plus the reconciliation configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Shared secret expected in `x-api-key`; unset disables the check
    pub api_key: Option<String>,
    pub app: AppConfig,
}

impl Config {
    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> DomainResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                key: "PORT".to_string(),
                message: format!("'{raw}' is not a valid port"),
            })?,
            None => 3000,
        };

        Ok(Self {
            port,
            api_key: lookup("API_KEY").filter(|key| !key.trim().is_empty()),
            app: AppConfig::from_lookup(&lookup)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_port_3000() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.port, 3000);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn rejects_invalid_port() {
        let result = Config::from_lookup(|key| (key == "PORT").then(|| "http".to_string()));
        assert!(result.is_err());
    }
}
