use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use tracing::{debug, info};

use crate::{config::SessionConfig, services::capture::CaptureService};

use super::{
    CharacterId, SessionState, ViewSize,
    notifier::{Notifier, SubscriptionId},
    score::{ScoreChanged, ScoreTracker},
    state_machine::{FinishReason, GameEvent, GamePhase, GameStateMachine},
    timer::{SessionTimer, TimerTick},
};

/// Notification queued by the tracker/timer handlers, drained on the same turn.
#[derive(Debug, Clone, Copy)]
enum Signal {
    Score(ScoreChanged),
    Tick(TimerTick),
}

type Inbox = Rc<RefCell<VecDeque<Signal>>>;

/// Orchestrates one player's matches: phase state machine, score, countdown,
/// and the capture collaborator.
///
/// All methods run on a single event loop. Commands that are not valid in the
/// current phase are ignored, so a UI may call them speculatively. Every
/// relevant mutation publishes a fresh [`SessionState`] to subscribers.
pub struct GameSession {
    config: SessionConfig,
    machine: GameStateMachine,
    started: bool,
    capturing: bool,
    capture_available: bool,
    selected_character: CharacterId,
    view_size: ViewSize,
    final_score: Option<u32>,
    finish_reason: Option<FinishReason>,
    tracker: ScoreTracker,
    timer: SessionTimer,
    capture: Box<dyn CaptureService>,
    inbox: Inbox,
    score_subscription: SubscriptionId,
    tick_subscription: SubscriptionId,
    states: Notifier<SessionState>,
}

impl GameSession {
    /// Build an idle session from a validated configuration.
    pub fn new(config: SessionConfig, capture: Box<dyn CaptureService>) -> Self {
        let inbox: Inbox = Rc::new(RefCell::new(VecDeque::new()));

        let mut tracker = ScoreTracker::new(config.initial_ammunition());
        let score_inbox = Rc::clone(&inbox);
        let score_subscription = tracker.subscribe(move |change| {
            score_inbox.borrow_mut().push_back(Signal::Score(*change));
        });

        let mut timer = SessionTimer::new(config.time_limit_secs());
        let tick_inbox = Rc::clone(&inbox);
        let tick_subscription = timer.subscribe(move |tick| {
            tick_inbox.borrow_mut().push_back(Signal::Tick(*tick));
        });

        Self {
            selected_character: config.default_character().clone(),
            config,
            machine: GameStateMachine::new(),
            started: false,
            capturing: false,
            capture_available: true,
            view_size: ViewSize::default(),
            final_score: None,
            finish_reason: None,
            tracker,
            timer,
            capture,
            inbox,
            score_subscription,
            tick_subscription,
            states: Notifier::new(),
        }
    }

    /// Start a match from idle. Ignored once a match has been started, until it
    /// is stopped or replayed.
    pub fn start_game(&mut self) {
        if self.started {
            debug!(phase = ?self.phase(), "start ignored: match already started");
            return;
        }
        if !self.transition(GameEvent::StartGame) {
            return;
        }

        self.started = true;
        self.final_score = None;
        self.finish_reason = None;
        self.timer.arm(self.config.time_limit_secs());
        self.tracker.reset();
        self.start_capture();
        info!(
            ammunition = self.tracker.current_ammunition(),
            time_limit_secs = self.config.time_limit_secs(),
            "match started"
        );
        self.process_signals();
    }

    /// Abort the running or paused match without recording a result.
    pub fn stop_game(&mut self) {
        if !self.transition(GameEvent::Stop) {
            return;
        }

        self.started = false;
        self.timer.disarm();
        self.stop_capture();
        info!(score = self.tracker.current_score(), "match stopped");
        self.publish();
    }

    /// Freeze the countdown. Only valid while running.
    pub fn pause_game(&mut self) {
        if !self.transition(GameEvent::Pause) {
            return;
        }

        self.timer.disarm();
        info!(
            remaining_seconds = self.timer.remaining_seconds(),
            "match paused"
        );
        self.publish();
    }

    /// Continue the countdown from where it was paused. Only valid while paused.
    pub fn resume_game(&mut self) {
        if !self.transition(GameEvent::Resume) {
            return;
        }

        self.timer.arm(self.timer.remaining_seconds());
        info!(
            remaining_seconds = self.timer.remaining_seconds(),
            "match resumed"
        );
        self.publish();
    }

    /// Leave the final score screen and immediately start a fresh match.
    pub fn replay_game(&mut self) {
        if !self.transition(GameEvent::Replay) {
            return;
        }

        self.started = false;
        self.final_score = None;
        self.finish_reason = None;
        self.timer.reset(self.config.time_limit_secs());
        self.tracker.reset();
        self.process_signals();
        self.start_game();
    }

    /// End the match on behalf of a collaborator, optionally overriding the
    /// recorded score with a value it computed.
    pub fn game_over(&mut self, final_score: Option<u32>) {
        self.finish(FinishReason::External, final_score);
    }

    /// Pick the character shown by presentation.
    pub fn select_character(&mut self, id: CharacterId) {
        debug!(character = %id, "character selected");
        self.selected_character = id;
        self.publish();
    }

    /// Record the size of the presentation surface.
    pub fn update_view_size(&mut self, width: u32, height: u32) {
        self.view_size = ViewSize { width, height };
        self.publish();
    }

    /// Consume one hit as ammunition. Ignored unless running.
    pub fn register_hit(&mut self, points: u32) {
        if self.phase() != GamePhase::Running {
            debug!(points, phase = ?self.phase(), "hit ignored outside of a running match");
            return;
        }

        self.tracker.add_hit(points);
        self.process_signals();
    }

    /// Record a change in the capture collaborator's availability.
    ///
    /// The phase is left untouched; a running match keeps going without hits.
    pub fn set_capture_available(&mut self, available: bool) {
        if self.capture_available != available {
            info!(available, phase = ?self.phase(), "capture availability changed");
        }
        self.capture_available = available;
        self.publish();
    }

    /// Deliver one elapsed second to the countdown.
    pub fn tick(&mut self) {
        if self.timer.tick() {
            self.process_signals();
        }
    }

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.machine.phase()
    }

    /// Whether the countdown is currently advancing.
    pub fn timer_armed(&self) -> bool {
        self.timer.is_armed()
    }

    /// Number of times the countdown has been armed.
    pub fn timer_generation(&self) -> u64 {
        self.timer.generation()
    }

    /// Number of phase transitions applied since construction.
    pub fn transition_count(&self) -> usize {
        self.machine.snapshot().version
    }

    /// Build the current snapshot.
    pub fn state(&self) -> SessionState {
        let phase = self.phase();
        let live_score = self.tracker.current_score();
        let score = match phase {
            GamePhase::Over => self.final_score.unwrap_or(live_score),
            _ => live_score,
        };

        SessionState {
            phase,
            score,
            ammunition: self.tracker.current_ammunition(),
            time_remaining_seconds: self.timer.remaining_seconds(),
            selected_character: self.selected_character.clone(),
            view_size: self.view_size,
            capture_available: self.capture_available,
            finish_reason: self.finish_reason.filter(|_| phase == GamePhase::Over),
        }
    }

    /// Register a handler receiving every published snapshot.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&SessionState) + 'static,
    {
        self.states.subscribe(handler)
    }

    /// Revoke a handler registered through [`GameSession::subscribe`].
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.states.unsubscribe(id)
    }

    fn finish(&mut self, reason: FinishReason, final_score: Option<u32>) {
        if !self.transition(GameEvent::Finish(reason)) {
            return;
        }

        self.started = false;
        self.timer.disarm();
        self.stop_capture();
        let score = final_score.unwrap_or_else(|| self.tracker.current_score());
        self.final_score = Some(score);
        self.finish_reason = Some(reason);
        info!(?reason, score, "match over");
        self.publish();
    }

    /// Apply an event to the state machine; invalid events are logged and dropped.
    fn transition(&mut self, event: GameEvent) -> bool {
        match self.machine.apply(event) {
            Ok(next) => {
                debug!(?event, phase = ?next, "phase changed");
                true
            }
            Err(err) => {
                debug!(error = %err, "ignoring command");
                false
            }
        }
    }

    /// Drain tracker/timer notifications. When they exhaust ammunition or time
    /// during a running match, the match ends and only the `Over` snapshot is
    /// published (ammunition is checked first); otherwise one snapshot is
    /// published per notification.
    fn process_signals(&mut self) {
        let signals: Vec<Signal> = self.inbox.borrow_mut().drain(..).collect();
        if signals.is_empty() {
            return;
        }

        let mut ammunition_depleted = false;
        let mut time_expired = false;
        for signal in &signals {
            match signal {
                Signal::Score(change) => ammunition_depleted = change.ammunition == 0,
                Signal::Tick(tick) => {
                    debug!(remaining_seconds = tick.remaining_seconds, "tick");
                    time_expired |= tick.expired;
                }
            }
        }

        if self.phase() == GamePhase::Running {
            let score = self.tracker.current_score();
            if ammunition_depleted {
                self.finish(FinishReason::AmmunitionDepleted, Some(score));
                return;
            }
            if time_expired {
                self.finish(FinishReason::TimeExpired, Some(score));
                return;
            }
        }

        for _ in &signals {
            self.publish();
        }
    }

    fn publish(&mut self) {
        let state = self.state();
        self.states.publish(&state);
    }

    fn start_capture(&mut self) {
        if !self.capturing {
            self.capture.start_session();
            self.capturing = true;
        }
    }

    fn stop_capture(&mut self) {
        if self.capturing {
            self.capture.stop_session();
            self.capturing = false;
        }
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        self.tracker.unsubscribe(self.score_subscription);
        self.timer.unsubscribe(self.tick_subscription);
        self.stop_capture();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingCapture {
        calls: Rc<RefCell<Vec<&'static str>>>,
    }

    impl CaptureService for RecordingCapture {
        fn start_session(&mut self) {
            self.calls.borrow_mut().push("start");
        }

        fn stop_session(&mut self) {
            self.calls.borrow_mut().push("stop");
        }
    }

    struct Harness {
        session: GameSession,
        calls: Rc<RefCell<Vec<&'static str>>>,
        states: Rc<RefCell<Vec<SessionState>>>,
    }

    fn harness(ammunition: i64, time_limit: i64) -> Harness {
        let config = SessionConfig::new(ammunition, time_limit, "ninja").unwrap();
        let capture = RecordingCapture::default();
        let calls = Rc::clone(&capture.calls);
        let mut session = GameSession::new(config, Box::new(capture));

        let states = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&states);
        session.subscribe(move |state| sink.borrow_mut().push(state.clone()));

        Harness {
            session,
            calls,
            states,
        }
    }

    fn over_count(states: &[SessionState]) -> usize {
        states
            .windows(2)
            .filter(|pair| pair[0].phase != GamePhase::Over && pair[1].phase == GamePhase::Over)
            .count()
    }

    #[test]
    fn new_session_is_idle_with_defaults() {
        let h = harness(3, 60);
        let state = h.session.state();

        assert_eq!(state.phase, GamePhase::Idle);
        assert_eq!(state.score, 0);
        assert_eq!(state.ammunition, 3);
        assert_eq!(state.time_remaining_seconds, 60);
        assert_eq!(state.selected_character.as_str(), "ninja");
        assert!(state.capture_available);
        assert!(h.calls.borrow().is_empty());
    }

    #[test]
    fn start_arms_timer_and_begins_capture() {
        let mut h = harness(3, 60);
        h.session.start_game();

        assert_eq!(h.session.phase(), GamePhase::Running);
        assert!(h.session.timer_armed());
        assert_eq!(*h.calls.borrow(), vec!["start"]);
        assert_eq!(
            h.states.borrow().last().map(|state| state.phase),
            Some(GamePhase::Running)
        );
    }

    #[test]
    fn starting_twice_keeps_a_single_countdown() {
        let mut h = harness(3, 60);
        h.session.start_game();
        h.session.start_game();

        assert_eq!(h.session.timer_generation(), 1);
        assert_eq!(*h.calls.borrow(), vec!["start"]);

        h.session.tick();
        assert_eq!(h.session.state().time_remaining_seconds, 59);
    }

    #[test]
    fn depleting_ammunition_ends_the_match_once() {
        let mut h = harness(3, 60);
        h.session.start_game();
        for _ in 0..3 {
            h.session.register_hit(10);
        }

        let state = h.session.state();
        assert_eq!(state.phase, GamePhase::Over);
        assert_eq!(state.score, 30);
        assert_eq!(state.ammunition, 0);
        assert_eq!(state.finish_reason, Some(FinishReason::AmmunitionDepleted));
        assert!(!h.session.timer_armed());
        assert_eq!(*h.calls.borrow(), vec!["start", "stop"]);
        assert_eq!(over_count(&h.states.borrow()), 1);

        h.session.register_hit(10);
        assert_eq!(h.session.state().score, 30);
    }

    #[test]
    fn timer_expiry_ends_the_match_with_current_score() {
        let mut h = harness(10, 3);
        h.session.start_game();
        h.session.register_hit(7);
        for _ in 0..5 {
            h.session.tick();
        }

        let state = h.session.state();
        assert_eq!(state.phase, GamePhase::Over);
        assert_eq!(state.score, 7);
        assert_eq!(state.time_remaining_seconds, 0);
        assert_eq!(state.finish_reason, Some(FinishReason::TimeExpired));
        assert_eq!(over_count(&h.states.borrow()), 1);
    }

    #[test]
    fn pause_and_resume_keep_remaining_time() {
        let mut h = harness(3, 60);
        h.session.start_game();
        for _ in 0..15 {
            h.session.tick();
        }
        h.session.pause_game();
        assert_eq!(h.session.state().time_remaining_seconds, 45);

        for _ in 0..10 {
            h.session.tick();
        }
        h.session.register_hit(5);
        assert_eq!(h.session.state().time_remaining_seconds, 45);
        assert_eq!(h.session.state().score, 0);

        h.session.resume_game();
        h.session.tick();
        assert_eq!(h.session.state().time_remaining_seconds, 44);
    }

    #[test]
    fn invalid_pause_and_resume_are_ignored() {
        let mut h = harness(3, 60);
        h.session.resume_game();
        h.session.pause_game();
        assert_eq!(h.session.phase(), GamePhase::Idle);

        h.session.start_game();
        h.session.resume_game();
        assert_eq!(h.session.phase(), GamePhase::Running);
        assert_eq!(h.session.transition_count(), 1);
    }

    #[test]
    fn stop_returns_to_idle_without_finishing() {
        let mut h = harness(3, 60);
        h.session.start_game();
        h.session.register_hit(4);
        h.session.pause_game();
        h.session.stop_game();

        let state = h.session.state();
        assert_eq!(state.phase, GamePhase::Idle);
        assert_eq!(state.finish_reason, None);
        assert!(!h.session.timer_armed());
        assert_eq!(*h.calls.borrow(), vec!["start", "stop"]);

        h.session.start_game();
        let state = h.session.state();
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.score, 0);
        assert_eq!(state.ammunition, 3);
        assert_eq!(state.time_remaining_seconds, 60);
    }

    #[test]
    fn start_is_ignored_after_game_over_until_replay() {
        let mut h = harness(1, 60);
        h.session.start_game();
        h.session.register_hit(2);
        assert_eq!(h.session.phase(), GamePhase::Over);

        h.session.start_game();
        assert_eq!(h.session.phase(), GamePhase::Over);
        assert_eq!(h.session.state().score, 2);
    }

    #[test]
    fn replay_starts_a_fresh_match() {
        let mut h = harness(2, 30);
        h.session.start_game();
        h.session.tick();
        h.session.register_hit(3);
        h.session.register_hit(3);
        assert_eq!(h.session.phase(), GamePhase::Over);

        h.session.replay_game();

        let state = h.session.state();
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.score, 0);
        assert_eq!(state.ammunition, 2);
        assert_eq!(state.time_remaining_seconds, 30);
        assert_eq!(state.finish_reason, None);
        assert!(h.session.timer_armed());
        assert!(
            h.states
                .borrow()
                .iter()
                .any(|state| state.phase == GamePhase::Idle)
        );
    }

    #[test]
    fn replay_never_publishes_an_empty_clock_outside_over() {
        let mut h = harness(3, 2);
        h.session.start_game();
        h.session.tick();
        h.session.tick();
        assert_eq!(h.session.phase(), GamePhase::Over);
        h.states.borrow_mut().clear();

        h.session.replay_game();

        let states = h.states.borrow();
        assert!(!states.is_empty());
        for state in states.iter() {
            assert!(state.phase == GamePhase::Over || state.time_remaining_seconds > 0);
            assert_eq!(state.ammunition, 3);
        }
        assert_eq!(states.first().map(|s| s.phase), Some(GamePhase::Idle));
        assert_eq!(states.first().map(|s| s.time_remaining_seconds), Some(2));
    }

    #[test]
    fn replay_after_external_game_over_shows_full_clock_while_idle() {
        let mut h = harness(3, 30);
        h.session.start_game();
        for _ in 0..5 {
            h.session.tick();
        }
        h.session.game_over(None);
        h.states.borrow_mut().clear();

        h.session.replay_game();

        let states = h.states.borrow();
        assert!(
            states
                .iter()
                .all(|state| state.time_remaining_seconds == 30)
        );
    }

    fn only_over_shows_exhaustion(states: &[SessionState]) -> bool {
        states.iter().all(|state| {
            state.phase == GamePhase::Over
                || (state.ammunition > 0 && state.time_remaining_seconds > 0)
        })
    }

    #[test]
    fn final_hit_publishes_over_without_an_empty_running_snapshot() {
        let mut h = harness(2, 60);
        h.session.start_game();
        h.session.register_hit(1);
        h.session.register_hit(1);

        let states = h.states.borrow();
        assert!(only_over_shows_exhaustion(&states));
        assert_eq!(states.last().map(|s| s.phase), Some(GamePhase::Over));
    }

    #[test]
    fn expiry_publishes_over_without_an_empty_running_snapshot() {
        let mut h = harness(5, 2);
        h.session.start_game();
        h.session.tick();
        h.session.tick();

        let states = h.states.borrow();
        assert!(only_over_shows_exhaustion(&states));
        assert_eq!(states.last().map(|s| s.phase), Some(GamePhase::Over));
    }

    #[test]
    fn external_game_over_overrides_final_score() {
        let mut h = harness(5, 60);
        h.session.start_game();
        h.session.register_hit(10);
        h.session.game_over(Some(42));

        let state = h.session.state();
        assert_eq!(state.phase, GamePhase::Over);
        assert_eq!(state.score, 42);
        assert_eq!(state.finish_reason, Some(FinishReason::External));
        assert!(!h.session.timer_armed());

        h.session.game_over(Some(99));
        assert_eq!(h.session.state().score, 42);
    }

    #[test]
    fn external_game_over_without_score_keeps_tracker_score() {
        let mut h = harness(5, 60);
        h.session.start_game();
        h.session.register_hit(6);
        h.session.pause_game();
        h.session.game_over(None);

        assert_eq!(h.session.state().score, 6);
        assert_eq!(h.session.phase(), GamePhase::Over);
    }

    #[test]
    fn zero_ammunition_ends_the_match_on_start() {
        let mut h = harness(0, 60);
        h.session.start_game();

        let state = h.session.state();
        assert_eq!(state.phase, GamePhase::Over);
        assert_eq!(state.finish_reason, Some(FinishReason::AmmunitionDepleted));
    }

    #[test]
    fn ammunition_wins_when_both_run_out_together() {
        let mut h = harness(1, 1);
        h.session.start_game();
        h.session.timer.tick();
        h.session.tracker.add_hit(8);
        h.session.process_signals();

        let state = h.session.state();
        assert_eq!(state.finish_reason, Some(FinishReason::AmmunitionDepleted));
        assert_eq!(state.score, 8);
        assert_eq!(over_count(&h.states.borrow()), 1);
    }

    #[test]
    fn availability_change_republishes_without_phase_change() {
        let mut h = harness(3, 60);
        h.session.start_game();
        let published = h.states.borrow().len();

        h.session.set_capture_available(false);

        let states = h.states.borrow();
        assert_eq!(states.len(), published + 1);
        let last = states.last().unwrap();
        assert!(!last.capture_available);
        assert_eq!(last.phase, GamePhase::Running);
    }

    #[test]
    fn presentation_hints_are_published() {
        let mut h = harness(3, 60);
        h.session.select_character(CharacterId::new("samurai"));
        h.session.update_view_size(640, 480);

        let state = h.session.state();
        assert_eq!(state.selected_character.as_str(), "samurai");
        assert_eq!(
            state.view_size,
            ViewSize {
                width: 640,
                height: 480
            }
        );
        assert_eq!(h.states.borrow().len(), 2);
    }

    #[test]
    fn dropping_the_session_stops_capture() {
        let mut h = harness(3, 60);
        h.session.start_game();
        let calls = Rc::clone(&h.calls);
        drop(h);

        assert_eq!(*calls.borrow(), vec!["start", "stop"]);
    }
}
