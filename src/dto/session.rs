use serde::Serialize;

use crate::state::{FinishReason, GamePhase, SessionState};

/// Event name used for every session snapshot.
pub const EVENT_SESSION_STATE: &str = "session.state";

#[derive(Clone, Debug, PartialEq, Eq)]
/// Named payload handed to the presentation layer.
pub struct OutboundEvent {
    /// Event name, e.g. [`EVENT_SESSION_STATE`].
    pub event: String,
    /// JSON-encoded payload.
    pub data: String,
}

impl OutboundEvent {
    /// Convenience wrapper that serialises `payload` into the data field.
    pub fn json<T>(event: impl Into<String>, payload: &T) -> serde_json::Result<Self>
    where
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }

    /// Render in `event:`/`data:` framing, terminated by a blank line.
    pub fn to_frame(&self) -> String {
        format!("event: {}\ndata: {}\n\n", self.event, self.data)
    }
}

#[derive(Debug, Serialize)]
/// Wire form of a [`SessionState`].
pub struct SessionSnapshot {
    pub phase: GamePhase,
    pub score: u32,
    pub ammunition: u32,
    pub time_remaining_seconds: u32,
    pub selected_character: String,
    pub view_width: u32,
    pub view_height: u32,
    pub capture_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

impl From<&SessionState> for SessionSnapshot {
    fn from(value: &SessionState) -> Self {
        Self {
            phase: value.phase,
            score: value.score,
            ammunition: value.ammunition,
            time_remaining_seconds: value.time_remaining_seconds,
            selected_character: value.selected_character.to_string(),
            view_width: value.view_size.width,
            view_height: value.view_size.height,
            capture_available: value.capture_available,
            finish_reason: value.finish_reason,
        }
    }
}
