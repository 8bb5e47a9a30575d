use serde::Serialize;
use thiserror::Error;

/// High-level phases a game session can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// No match is in progress; waiting for `startGame`.
    Idle,
    /// The countdown is ticking and hits are consumed as ammunition.
    Running,
    /// The countdown is frozen until the session is resumed.
    Paused,
    /// Final score is frozen until an explicit replay.
    Over,
}

/// Indicates why a match transitioned to [`GamePhase::Over`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The last round of ammunition was spent.
    AmmunitionDepleted,
    /// The session timer reached zero.
    TimeExpired,
    /// A collaborator reported the end of the match.
    External,
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Begin a match from the idle state.
    StartGame,
    /// Freeze the running match.
    Pause,
    /// Continue a paused match.
    Resume,
    /// End the match and show the final score.
    Finish(FinishReason),
    /// Abort the match without recording a result.
    Stop,
    /// Leave the final score screen to start over.
    Replay,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: GamePhase,
    /// Version number of the state machine (increments on each transition).
    pub version: usize,
}

/// State machine implementing the match flow.
#[derive(Debug, Clone)]
pub struct GameStateMachine {
    phase: GamePhase,
    version: usize,
}

impl Default for GameStateMachine {
    fn default() -> Self {
        Self {
            phase: GamePhase::Idle,
            version: 0,
        }
    }
}

impl GameStateMachine {
    /// Create a new state machine initialised in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
        }
    }

    /// Apply an event, moving the state machine to the next phase.
    /// Returns the new phase after the transition.
    pub fn apply(&mut self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        self.version += 1;
        Ok(next)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (GamePhase::Idle, GameEvent::StartGame) => GamePhase::Running,
            (GamePhase::Running, GameEvent::Pause) => GamePhase::Paused,
            (GamePhase::Paused, GameEvent::Resume) => GamePhase::Running,
            (GamePhase::Idle | GamePhase::Running | GamePhase::Paused, GameEvent::Finish(_)) => {
                GamePhase::Over
            }
            (GamePhase::Running | GamePhase::Paused, GameEvent::Stop) => GamePhase::Idle,
            (GamePhase::Over, GameEvent::Replay) => GamePhase::Idle,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}
