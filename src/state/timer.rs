use tracing::{debug, warn};

use super::notifier::{Notifier, SubscriptionId};

/// Notification emitted after each one-second decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick {
    /// Seconds left after this decrement.
    pub remaining_seconds: u32,
    /// Set on the tick that reaches zero.
    pub expired: bool,
}

/// Cancelable countdown advanced one second per [`SessionTimer::tick`].
///
/// The timer does not schedule itself; the runtime delivers ticks while
/// [`SessionTimer::is_armed`] holds. Each arm bumps [`SessionTimer::generation`]
/// so a scheduler can restart its cadence and never drive two countdowns at once.
#[derive(Debug)]
pub struct SessionTimer {
    remaining_seconds: u32,
    armed: bool,
    generation: u64,
    ticks: Notifier<TimerTick>,
}

impl SessionTimer {
    /// Create a disarmed timer holding `seconds`.
    pub fn new(seconds: u32) -> Self {
        Self {
            remaining_seconds: seconds,
            armed: false,
            generation: 0,
            ticks: Notifier::new(),
        }
    }

    /// Cancel any running countdown and start a new one from `seconds`.
    pub fn arm(&mut self, seconds: u32) {
        self.disarm();
        self.remaining_seconds = seconds;
        if seconds == 0 {
            warn!("refusing to arm session timer with zero seconds");
            return;
        }
        self.generation += 1;
        self.armed = true;
        debug!(seconds, generation = self.generation, "session timer armed");
    }

    /// Cancel the countdown, keeping the remaining seconds. Idempotent.
    pub fn disarm(&mut self) {
        if self.armed {
            debug!(
                remaining_seconds = self.remaining_seconds,
                "session timer disarmed"
            );
        }
        self.armed = false;
    }

    /// Cancel the countdown and refill it to `seconds` without arming.
    pub fn reset(&mut self, seconds: u32) {
        self.disarm();
        self.remaining_seconds = seconds;
    }

    /// Advance the countdown by one second.
    ///
    /// Returns `false` without notifying when the timer is disarmed. The timer
    /// disarms itself before publishing the expiry tick, so a handler cancelling
    /// it again is harmless and the expiry fires once.
    pub fn tick(&mut self) -> bool {
        if !self.armed {
            return false;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        let expired = self.remaining_seconds == 0;
        if expired {
            self.armed = false;
        }

        self.ticks.publish(&TimerTick {
            remaining_seconds: self.remaining_seconds,
            expired,
        });
        true
    }

    /// Seconds left on the countdown.
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    /// Whether the countdown is currently advancing.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Number of times the timer has been armed.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Register a handler for tick notifications.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&TimerTick) + 'static,
    {
        self.ticks.subscribe(handler)
    }

    /// Revoke a handler registered through [`SessionTimer::subscribe`].
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.ticks.unsubscribe(id)
    }
}
