use crate::application::ports::HttpConfig;
use crate::domain::errors::{ConfigError, RepositoryError};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Url;

/// Build the reqwest client shared by the REST adapters.
///
/// Every request carries the configured timeouts, so a slow collaborator fails
/// the call instead of stalling token issuance.
pub fn build_http_client(
    config: &HttpConfig,
    api_token: Option<&str>,
) -> Result<reqwest::Client, ConfigError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = api_token {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
            ConfigError::InvalidValue {
                key: "DIRECTORY_API_TOKEN".to_string(),
                message: e.to_string(),
            }
        })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    reqwest::Client::builder()
        .timeout(config.get_call_timeout())
        .connect_timeout(config.get_connect_timeout())
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .build()
        .map_err(|e| ConfigError::InvalidValue {
            key: "HTTP".to_string(),
            message: format!("Failed to build HTTP client: {e}"),
        })
}

/// Append percent-encoded path segments to `base`
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<Url, String> {
    let mut url = Url::parse(base).map_err(|e| format!("Invalid base URL '{base}': {e}"))?;
    url.path_segments_mut()
        .map_err(|_| format!("Base URL '{base}' cannot carry a path"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Map a transport failure to the repository error vocabulary
pub(crate) fn transport_error(e: reqwest::Error) -> RepositoryError {
    if e.is_connect() {
        RepositoryError::ConnectionFailed {
            message: e.to_string(),
        }
    } else if e.is_decode() {
        RepositoryError::SerializationFailed {
            message: format!("Failed to parse response: {e}"),
        }
    } else {
        RepositoryError::NetworkError {
            message: format!("HTTP request failed: {e}"),
        }
    }
}

/// Turn a non-success response into `QueryFailed`, keeping the body for the log
pub(crate) async fn unexpected_status(
    query: String,
    response: reqwest::Response,
) -> RepositoryError {
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();
    RepositoryError::QueryFailed {
        query,
        message: format!("HTTP error {status}: {error_text}"),
    }
}
