pub mod notifier;
pub mod score;
pub mod session;
pub mod state_machine;
pub mod timer;

use std::fmt;

pub use self::notifier::{Notifier, SubscriptionId};
pub use self::score::{ScoreChanged, ScoreTracker};
pub use self::session::GameSession;
pub use self::state_machine::{FinishReason, GamePhase};
pub use self::timer::{SessionTimer, TimerTick};

/// Identifier of the playable character picked by the player.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharacterId(String);

impl CharacterId {
    /// Wrap a character identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Size of the presentation surface, passed through untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewSize {
    /// Width in presentation units.
    pub width: u32,
    /// Height in presentation units.
    pub height: u32,
}

/// Immutable snapshot published to presentation on every relevant mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Current phase of the match.
    pub phase: GamePhase,
    /// Live score, or the recorded final score once the match is over.
    pub score: u32,
    /// Rounds left.
    pub ammunition: u32,
    /// Seconds left on the countdown.
    pub time_remaining_seconds: u32,
    /// Character currently selected.
    pub selected_character: CharacterId,
    /// Presentation hint, opaque to the session.
    pub view_size: ViewSize,
    /// Whether the capture collaborator currently reports itself usable.
    pub capture_available: bool,
    /// Why the last match ended, while the phase is [`GamePhase::Over`].
    pub finish_reason: Option<FinishReason>,
}
