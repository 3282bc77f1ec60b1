use crate::error::SlackError;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub struct SlackWebClient {
    api_base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Ephemeral,
}

/// Body posted to an interaction's `response_url`.
#[derive(Debug, Serialize)]
pub struct ResponseMessage {
    pub text: String,
    pub response_type: ResponseType,
}

impl ResponseMessage {
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            response_type: ResponseType::Ephemeral,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct OAuthTeam {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct AuthedUser {
    pub id: String,
    pub scope: Option<String>,
}

/// Successful `oauth.v2.access` response.
#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct OAuthAccess {
    #[serde(deserialize_with = "secret_string")]
    pub access_token: SecretString,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub bot_user_id: Option<String>,
    pub app_id: Option<String>,
    pub team: Option<OAuthTeam>,
    pub enterprise: Option<OAuthTeam>,
    pub authed_user: Option<AuthedUser>,
}

fn secret_string<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

impl SlackWebClient {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Posts a message to an interaction's `response_url`. Slack answers these with
    /// a bare status, so only the status is checked.
    pub async fn post_response(
        &self,
        response_url: &str,
        message: &ResponseMessage,
    ) -> Result<(), SlackError> {
        let response = self
            .client
            .post(response_url)
            .header("Content-Type", "application/json")
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SlackError::Http(status));
        }

        Ok(())
    }

    /// Exchanges an OAuth authorization code via `oauth.v2.access`.
    pub async fn exchange_code(
        &self,
        code: &str,
        client_id: &str,
        client_secret: &SecretString,
    ) -> Result<OAuthAccess, SlackError> {
        let url = format!("{}/oauth.v2.access", self.api_base_url);
        let params = [
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret.expose_secret()),
        ];

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SlackError::Http(status));
        }

        // Parse as raw JSON first: error responses carry none of the success fields
        let raw: Value = serde_json::from_str(&response.text().await?)?;

        if !raw.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            let error = raw
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            return Err(SlackError::Api(error.to_string()));
        }

        Ok(serde_json::from_value(raw)?)
    }
}
