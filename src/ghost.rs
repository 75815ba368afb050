use std::collections::VecDeque;

use crate::components::Pos;

/// Movement-frames between the player and the shadow.
pub const SHADOW_DELAY: usize = 10;

/// The player's past positions, replayed `delay` moves late.
///
/// Only the newest `delay` entries are kept. Together with the total move
/// count that is enough to answer `shadow()` exactly as an unbounded history
/// indexed at `len - delay` would.
#[derive(Debug, Clone)]
pub struct ShadowTrail {
    delay: usize,
    recent: VecDeque<Pos>,
    recorded: usize,
}

impl ShadowTrail {
    pub fn new(delay: usize) -> Self {
        assert!(delay > 0, "shadow delay must be positive");
        Self {
            delay,
            recent: VecDeque::with_capacity(delay),
            recorded: 0,
        }
    }

    /// Append the player's position after a frame in which they moved.
    pub fn record(&mut self, pos: Pos) {
        if self.recent.len() == self.delay {
            self.recent.pop_front();
        }
        self.recent.push_back(pos);
        self.recorded += 1;
    }

    /// Total positions recorded so far.
    pub fn len(&self) -> usize {
        self.recorded
    }

    pub fn is_empty(&self) -> bool {
        self.recorded == 0
    }

    pub fn delay(&self) -> usize {
        self.delay
    }

    /// Where the shadow stands, or `None` until more than `delay` moves exist.
    pub fn shadow(&self) -> Option<Pos> {
        if self.recorded > self.delay {
            self.recent.front().copied()
        } else {
            None
        }
    }

    pub fn catches(&self, player: Pos) -> bool {
        self.shadow() == Some(player)
    }
}
