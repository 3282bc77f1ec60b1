use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::VerifyError;
use crate::interaction;
use crate::oauth::{oauth_handler, CredentialStore};
use crate::signature::{
    self, GENERIC_SIGNATURE_HEADER, GENERIC_TIMESTAMP_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
use crate::slack::SlackWebClient;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub slack: Arc<SlackWebClient>,
    pub dispatcher: Arc<Dispatcher>,
    pub credentials: Arc<dyn CredentialStore>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET, Method::POST]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/interactivity", post(interactivity_handler))
        .route("/oauth", get(oauth_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "ok"
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|h| h.to_str().ok())
}

/// Slack's header if present, else the generic spelling.
fn signing_header<'a>(headers: &'a HeaderMap, slack: &str, generic: &str) -> Option<&'a str> {
    header_str(headers, slack).or_else(|| header_str(headers, generic))
}

async fn interactivity_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, VerifyError> {
    info!(
        "Received request to /interactivity, body length: {} bytes",
        body.len()
    );

    let form = signature::authenticate(
        &state.config.signing_secret,
        signature::unix_now(),
        signing_header(&headers, TIMESTAMP_HEADER, GENERIC_TIMESTAMP_HEADER),
        signing_header(&headers, SIGNATURE_HEADER, GENERIC_SIGNATURE_HEADER),
        &body,
    )
    .map_err(|e| {
        warn!("Rejected interactivity request: {}", e);
        e
    })?;

    // Authenticated but undecodable: still acknowledge, Slack gains nothing from an error.
    let envelope = match interaction::payload_field(&form).and_then(interaction::decode) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("Failed to decode interaction payload: {}", e);
            return Ok(StatusCode::OK);
        }
    };

    let outcome = state.dispatcher.dispatch(&envelope);
    debug!(kind = envelope.payload.kind(), ?outcome, "Dispatched interaction");

    Ok(StatusCode::OK)
}
