use crate::error::StoreError;
use crate::routes::AppState;
use crate::slack::OAuthAccess;
use async_trait::async_trait;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{error, info, warn};

#[derive(Debug, Default, Deserialize)]
pub struct OAuthCallbackParams {
    pub code: Option<String>,
    /// Opaque value round-tripped through Slack, typically identifying our user.
    pub state: Option<String>,
    /// Set by Slack instead of `code` when the user cancels.
    pub error: Option<String>,
}

/// Where freshly issued credentials go. Persistence is up to the deployment.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn save(&self, state: Option<&str>, access: OAuthAccess) -> Result<(), StoreError>;
}

/// Default store: records the installation in the log and keeps nothing.
pub struct LoggingCredentialStore;

#[async_trait]
impl CredentialStore for LoggingCredentialStore {
    async fn save(&self, state: Option<&str>, access: OAuthAccess) -> Result<(), StoreError> {
        info!(
            state = ?state,
            team_id = ?access.team.as_ref().map(|t| t.id.as_str()),
            app_id = ?access.app_id,
            bot_user_id = ?access.bot_user_id,
            scope = ?access.scope,
            "Installation credentials issued (not persisted)"
        );
        Ok(())
    }
}

pub async fn oauth_handler(
    State(state): State<AppState>,
    Query(params): Query<OAuthCallbackParams>,
) -> Response {
    let ok = complete_installation(&state, params).await;
    redirect(&state.config.oauth_redirect_url, ok)
}

async fn complete_installation(state: &AppState, params: OAuthCallbackParams) -> bool {
    if let Some(error) = params.error {
        warn!("OAuth authorization was not granted: {}", error);
        return false;
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        warn!("OAuth callback without a code");
        return false;
    };

    let access = match state
        .slack
        .exchange_code(&code, &state.config.client_id, &state.config.client_secret)
        .await
    {
        Ok(access) => access,
        Err(e) => {
            warn!("OAuth code exchange failed: {}", e);
            return false;
        }
    };

    match state.credentials.save(params.state.as_deref(), access).await {
        Ok(()) => true,
        Err(e) => {
            error!("Failed to hand off OAuth credentials: {}", e);
            false
        }
    }
}

/// `302 Found` to the configured URL with the outcome as a query flag.
pub fn redirect(base_url: &str, ok: bool) -> Response {
    let separator = if base_url.contains('?') { '&' } else { '?' };
    let location = format!("{}{}is_integration_good={}", base_url, separator, ok);
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}
