use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info};

use crate::{
    error::SessionClosed,
    state::{CharacterId, GameSession, SessionState},
};

/// Cadence at which the session countdown advances.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// Commands accepted by a running session, from presentation or the capture collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Start a match.
    StartGame,
    /// Abort the current match.
    StopGame,
    /// Freeze the countdown.
    PauseGame,
    /// Continue the countdown.
    ResumeGame,
    /// Start over from the final score screen.
    ReplayGame,
    /// End the match, optionally with an externally computed score.
    GameOver {
        /// Score to record instead of the tracked one.
        final_score: Option<u32>,
    },
    /// Pick a character.
    SelectCharacter(CharacterId),
    /// Record the presentation surface size.
    UpdateViewSize {
        /// Width in presentation units.
        width: u32,
        /// Height in presentation units.
        height: u32,
    },
    /// A hit detected by the capture collaborator.
    RegisterHit {
        /// Points awarded for the hit.
        points: u32,
    },
    /// Capture availability reported by the collaborator (e.g. permission revoked).
    CaptureAvailability(bool),
}

/// Route a command to the matching session operation.
pub fn dispatch(session: &mut GameSession, command: SessionCommand) {
    debug!(?command, "dispatching session command");
    match command {
        SessionCommand::StartGame => session.start_game(),
        SessionCommand::StopGame => session.stop_game(),
        SessionCommand::PauseGame => session.pause_game(),
        SessionCommand::ResumeGame => session.resume_game(),
        SessionCommand::ReplayGame => session.replay_game(),
        SessionCommand::GameOver { final_score } => session.game_over(final_score),
        SessionCommand::SelectCharacter(id) => session.select_character(id),
        SessionCommand::UpdateViewSize { width, height } => {
            session.update_view_size(width, height)
        }
        SessionCommand::RegisterHit { points } => session.register_hit(points),
        SessionCommand::CaptureAvailability(available) => {
            session.set_capture_available(available)
        }
    }
}

/// Build a driver owning `session` and a cloneable handle talking to it.
pub fn channel(mut session: GameSession, tick_period: Duration) -> (SessionDriver, SessionHandle) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(session.state());
    session.subscribe(move |state| {
        state_tx.send_replace(state.clone());
    });

    let driver = SessionDriver {
        session,
        commands: command_rx,
        tick_period,
    };
    let handle = SessionHandle {
        commands: command_tx,
        states: state_rx,
    };
    (driver, handle)
}

/// Event loop that owns the [`GameSession`] and serialises commands and ticks.
pub struct SessionDriver {
    session: GameSession,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    tick_period: Duration,
}

impl SessionDriver {
    /// Run until every [`SessionHandle`] has been dropped.
    ///
    /// Ticks are only delivered while the countdown is armed, and the cadence
    /// restarts each time it is re-armed so a resumed match loses no time.
    pub async fn run(mut self) {
        let period = self.tick_period;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut scheduled_generation = self.session.timer_generation();

        info!(tick_period = ?period, "session driver started");
        loop {
            let generation = self.session.timer_generation();
            if generation != scheduled_generation {
                ticker.reset();
                scheduled_generation = generation;
            }
            let armed = self.session.timer_armed();

            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(command) => dispatch(&mut self.session, command),
                    None => break,
                },
                _ = ticker.tick(), if armed => self.session.tick(),
            }
        }
        info!("all session handles dropped; driver stopping");
    }
}

/// Cloneable handle used to send commands and observe snapshots.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    states: watch::Receiver<SessionState>,
}

impl SessionHandle {
    /// Queue a command for the driver.
    pub fn send(&self, command: SessionCommand) -> Result<(), SessionClosed> {
        self.commands.send(command).map_err(|_| SessionClosed)
    }

    /// Queue `startGame`.
    pub fn start_game(&self) -> Result<(), SessionClosed> {
        self.send(SessionCommand::StartGame)
    }

    /// Queue `stopGame`.
    pub fn stop_game(&self) -> Result<(), SessionClosed> {
        self.send(SessionCommand::StopGame)
    }

    /// Queue `pauseGame`.
    pub fn pause_game(&self) -> Result<(), SessionClosed> {
        self.send(SessionCommand::PauseGame)
    }

    /// Queue `resumeGame`.
    pub fn resume_game(&self) -> Result<(), SessionClosed> {
        self.send(SessionCommand::ResumeGame)
    }

    /// Queue `replayGame`.
    pub fn replay_game(&self) -> Result<(), SessionClosed> {
        self.send(SessionCommand::ReplayGame)
    }

    /// Queue `gameOver`.
    pub fn game_over(&self, final_score: Option<u32>) -> Result<(), SessionClosed> {
        self.send(SessionCommand::GameOver { final_score })
    }

    /// Queue `selectCharacter`.
    pub fn select_character(&self, id: CharacterId) -> Result<(), SessionClosed> {
        self.send(SessionCommand::SelectCharacter(id))
    }

    /// Queue `updateViewSize`.
    pub fn update_view_size(&self, width: u32, height: u32) -> Result<(), SessionClosed> {
        self.send(SessionCommand::UpdateViewSize { width, height })
    }

    /// Queue `registerHit`.
    pub fn register_hit(&self, points: u32) -> Result<(), SessionClosed> {
        self.send(SessionCommand::RegisterHit { points })
    }

    /// Report capture availability.
    pub fn set_capture_available(&self, available: bool) -> Result<(), SessionClosed> {
        self.send(SessionCommand::CaptureAvailability(available))
    }

    /// Latest published snapshot.
    pub fn current(&self) -> SessionState {
        self.states.borrow().clone()
    }

    /// Stream of snapshots, starting with the latest one.
    pub fn states(&self) -> WatchStream<SessionState> {
        WatchStream::new(self.states.clone())
    }
}
