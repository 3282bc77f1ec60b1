use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Why an inbound interactivity request was rejected before dispatch.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    #[error("request timestamp header is missing")]
    MissingTimestamp,

    /// Timestamp is unparseable or more than five minutes away from our clock.
    #[error("request timestamp is outside the freshness window")]
    StaleRequest,

    #[error("request body is not valid form data")]
    MalformedBody,

    /// Signature header is absent, malformed, or does not match.
    #[error("request signature does not match")]
    InvalidSignature,
}

impl IntoResponse for VerifyError {
    fn into_response(self) -> Response {
        match self {
            Self::StaleRequest => (StatusCode::BAD_REQUEST, "Ignore this request.").into_response(),
            Self::MissingTimestamp | Self::MalformedBody => {
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            Self::InvalidSignature => (StatusCode::UNAUTHORIZED, "Unauthenticated").into_response(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("form body has no `payload` field")]
    MissingPayload,

    #[error("payload has no `type` discriminant")]
    MissingDiscriminant,

    #[error("payload is not a valid interaction: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SlackError {
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected HTTP status: {0}")]
    Http(reqwest::StatusCode),

    #[error("Parse failed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Slack API error: {0}")]
    Api(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Error)]
#[error("credential store failed: {0}")]
pub struct StoreError(pub String);
