//! Interaction payloads: https://api.slack.com/interactivity/handling#payloads
//!
//! Slack posts a form with a single `payload` field whose value is JSON text.

use crate::error::DecodeError;
use serde::Deserialize;
use serde_json::Value;

#[allow(dead_code)]
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct InteractionUser {
    pub id: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub team_id: Option<String>,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct InteractionTeam {
    pub id: String,
    pub domain: Option<String>,
}

/// Fields every interaction kind carries.
#[allow(dead_code)]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InteractionContext {
    pub user: Option<InteractionUser>,
    pub team: Option<InteractionTeam>,
    pub token: Option<String>,
    pub trigger_id: Option<String>,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Container {
    #[serde(rename = "type")]
    pub container_type: Option<String>,
    pub message_ts: Option<String>,
    pub channel_id: Option<String>,
    pub is_ephemeral: Option<bool>,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BlockAction {
    pub action_id: String,
    pub block_id: Option<String>,
    /// Buttons carry a value; other elements (selects, date pickers) may not.
    pub value: Option<String>,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InteractionMessage {
    #[serde(default)]
    pub blocks: Vec<Value>,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Deserialize)]
pub struct BlockActions {
    pub api_app_id: Option<String>,
    pub container: Option<Container>,
    #[serde(default)]
    pub actions: Vec<BlockAction>,
    /// Only present when the action came from a message, not a modal.
    pub response_url: Option<String>,
    pub message: Option<InteractionMessage>,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Shortcut {
    pub action_ts: Option<String>,
    pub callback_id: String,
}

#[derive(Debug, Clone)]
pub enum InteractionPayload {
    Shortcut(Shortcut),
    MessageAction,
    BlockActions(BlockActions),
    ViewSubmission,
    ViewClosed,
    /// A kind this service doesn't know yet. Carried so it can be logged.
    Unknown(String),
}

impl InteractionPayload {
    pub fn kind(&self) -> &str {
        match self {
            Self::Shortcut(_) => "shortcut",
            Self::MessageAction => "message_action",
            Self::BlockActions(_) => "block_actions",
            Self::ViewSubmission => "view_submission",
            Self::ViewClosed => "view_closed",
            Self::Unknown(kind) => kind.as_str(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InteractionEnvelope {
    pub context: InteractionContext,
    pub payload: InteractionPayload,
}

/// Picks the `payload` field out of the decoded form body.
pub fn payload_field(form: &[(String, String)]) -> Result<&str, DecodeError> {
    form.iter()
        .find(|(key, _)| key == "payload")
        .map(|(_, value)| value.as_str())
        .ok_or(DecodeError::MissingPayload)
}

/// Parses the JSON, reads the `type` tag, then decodes only what that kind needs.
/// Fields we don't model are ignored.
pub fn decode(payload: &str) -> Result<InteractionEnvelope, DecodeError> {
    let value: Value = serde_json::from_str(payload)?;

    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingDiscriminant)?;

    let payload = match kind {
        "shortcut" => InteractionPayload::Shortcut(Shortcut::deserialize(&value)?),
        "message_action" | "message_actions" => InteractionPayload::MessageAction,
        "block_actions" => InteractionPayload::BlockActions(BlockActions::deserialize(&value)?),
        "view_submission" => InteractionPayload::ViewSubmission,
        "view_closed" => InteractionPayload::ViewClosed,
        other => InteractionPayload::Unknown(other.to_string()),
    };

    let context = InteractionContext::deserialize(&value)?;

    Ok(InteractionEnvelope { context, payload })
}
