use crate::interaction::{
    BlockActions, InteractionContext, InteractionEnvelope, InteractionPayload, Shortcut,
};
use crate::slack::{ResponseMessage, SlackWebClient};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const ACKNOWLEDGEMENT_TEXT: &str =
    "Thanks for your request, we'll process it and get back to you.";

/// Business logic for one shortcut `callback_id`.
///
/// Runs on the acknowledgment path, so implementations must return quickly and
/// spawn anything slow.
pub trait ShortcutHandler: Send + Sync {
    fn handle(&self, context: &InteractionContext, shortcut: &Shortcut);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    BlockAction {
        action_id: String,
        acknowledged: bool,
    },
    EmptyActions,
    Shortcut {
        callback_id: String,
        handled: bool,
    },
    Ignored {
        kind: String,
    },
}

pub struct Dispatcher {
    slack: Arc<SlackWebClient>,
    shortcuts: HashMap<String, Arc<dyn ShortcutHandler>>,
}

impl Dispatcher {
    pub fn new(slack: Arc<SlackWebClient>) -> Self {
        Self {
            slack,
            shortcuts: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub fn with_shortcut(
        mut self,
        callback_id: impl Into<String>,
        handler: impl ShortcutHandler + 'static,
    ) -> Self {
        self.shortcuts.insert(callback_id.into(), Arc::new(handler));
        self
    }

    /// Routes an interaction by kind. Never awaits network I/O; the caller can
    /// acknowledge as soon as this returns. Must be called inside a tokio runtime.
    pub fn dispatch(&self, envelope: &InteractionEnvelope) -> DispatchOutcome {
        match &envelope.payload {
            InteractionPayload::BlockActions(block_actions) => self.on_block_actions(block_actions),
            InteractionPayload::Shortcut(shortcut) => self.on_shortcut(&envelope.context, shortcut),
            other => {
                debug!(kind = other.kind(), "No handler for interaction kind");
                DispatchOutcome::Ignored {
                    kind: other.kind().to_string(),
                }
            }
        }
    }

    fn on_block_actions(&self, block_actions: &BlockActions) -> DispatchOutcome {
        let Some(action) = block_actions.actions.first() else {
            warn!("block_actions payload carried no actions");
            return DispatchOutcome::EmptyActions;
        };

        info!(
            action_id = %action.action_id,
            block_id = ?action.block_id,
            "Received block action"
        );

        let acknowledged = match block_actions.response_url.as_deref() {
            Some(url) if !url.is_empty() => {
                self.acknowledge(url);
                true
            }
            _ => false,
        };

        DispatchOutcome::BlockAction {
            action_id: action.action_id.clone(),
            acknowledged,
        }
    }

    fn on_shortcut(&self, context: &InteractionContext, shortcut: &Shortcut) -> DispatchOutcome {
        let handler = self.shortcuts.get(&shortcut.callback_id);
        info!(
            callback_id = %shortcut.callback_id,
            handled = handler.is_some(),
            "Received shortcut"
        );

        if let Some(handler) = handler {
            handler.handle(context, shortcut);
        }

        DispatchOutcome::Shortcut {
            callback_id: shortcut.callback_id.clone(),
            handled: handler.is_some(),
        }
    }

    /// Fire-and-forget: the task is detached and its result only logged.
    fn acknowledge(&self, response_url: &str) {
        let slack = Arc::clone(&self.slack);
        let response_url = response_url.to_string();

        tokio::spawn(async move {
            let message = ResponseMessage::ephemeral(ACKNOWLEDGEMENT_TEXT);
            match slack.post_response(&response_url, &message).await {
                Ok(()) => debug!("Posted acknowledgement to response_url"),
                Err(e) => warn!("Failed to post acknowledgement to response_url: {}", e),
            }
        });
    }
}
