use crate::error::ConfigError;
use secrecy::SecretString;

const DEFAULT_PORT: u16 = 9000;
const DEFAULT_REDIRECT_URL: &str = "https://example.com";
const DEFAULT_SLACK_API_BASE_URL: &str = "https://slack.com/api";

/// Process-wide settings, read once at startup and shared read-only.
#[derive(Clone, Debug)]
pub struct Config {
    pub signing_secret: SecretString,
    pub client_id: String,
    pub client_secret: SecretString,
    pub port: u16,
    /// Where the OAuth callback sends the browser, with the outcome flag appended.
    pub oauth_redirect_url: String,
    pub slack_api_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &'static str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| value(name).ok_or(ConfigError::Missing(name));

        let signing_secret = SecretString::from(required("SLACK_SIGNING_SECRET")?);
        let client_id = required("SLACK_CLIENT_ID")?;
        let client_secret = SecretString::from(required("SLACK_CLIENT_SECRET")?);

        let port = match value("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "PORT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let oauth_redirect_url =
            value("OAUTH_REDIRECT_URL").unwrap_or_else(|| DEFAULT_REDIRECT_URL.to_string());
        let slack_api_base_url = value("SLACK_API_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_SLACK_API_BASE_URL.to_string());

        Ok(Self {
            signing_secret,
            client_id,
            client_secret,
            port,
            oauth_redirect_url,
            slack_api_base_url,
        })
    }
}
