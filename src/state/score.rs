use tracing::debug;

use super::notifier::{Notifier, SubscriptionId};

/// Change notification emitted once per mutation of a [`ScoreTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreChanged {
    /// Score after the mutation.
    pub score: u32,
    /// Ammunition left after the mutation.
    pub ammunition: u32,
}

/// Owns the current score and the remaining ammunition of a match.
#[derive(Debug)]
pub struct ScoreTracker {
    score: u32,
    ammunition: u32,
    initial_ammunition: u32,
    changes: Notifier<ScoreChanged>,
}

impl ScoreTracker {
    /// Create a tracker holding a zero score and a full magazine.
    pub fn new(initial_ammunition: u32) -> Self {
        Self {
            score: 0,
            ammunition: initial_ammunition,
            initial_ammunition,
            changes: Notifier::new(),
        }
    }

    /// Record a hit: add `points`, spend one round (never below zero), then notify once.
    pub fn add_hit(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
        self.ammunition = self.ammunition.saturating_sub(1);
        debug!(
            points,
            score = self.score,
            ammunition = self.ammunition,
            "hit recorded"
        );
        self.notify();
    }

    /// Zero the score and refill the ammunition.
    pub fn reset(&mut self) {
        self.score = 0;
        self.ammunition = self.initial_ammunition;
        self.notify();
    }

    /// Current score.
    pub fn current_score(&self) -> u32 {
        self.score
    }

    /// Rounds left.
    pub fn current_ammunition(&self) -> u32 {
        self.ammunition
    }

    /// Register a handler for score/ammunition changes.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&ScoreChanged) + 'static,
    {
        self.changes.subscribe(handler)
    }

    /// Revoke a handler registered through [`ScoreTracker::subscribe`].
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.changes.unsubscribe(id)
    }

    fn notify(&mut self) {
        let change = ScoreChanged {
            score: self.score,
            ammunition: self.ammunition,
        };
        self.changes.publish(&change);
    }
}
