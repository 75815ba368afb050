use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::components::{Dir, Pos};
use crate::ghost::{ShadowTrail, SHADOW_DELAY};
use crate::level::{Maze, COLS, ROWS};
use crate::orbs::{self, ORB_COUNT};
use crate::player;

pub const DARKNESS_STEP: u32 = 5;
pub const ORB_LIGHT: u32 = 50;
/// Darkness ceiling, equal to the overlay's maximum opacity.
pub const MAX_DARKNESS: u32 = 200;
pub const MUTATION_INTERVAL: Duration = Duration::from_secs(30);
pub const FLASHBACK_DURATION: Duration = Duration::from_secs(1);
pub const END_HOLD: Duration = Duration::from_secs(3);

/// Keys held during one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub flashback: bool,
}

impl FrameInput {
    pub fn held(&self, dir: Dir) -> bool {
        match dir {
            Dir::Up => self.up,
            Dir::Down => self.down,
            Dir::Left => self.left,
            Dir::Right => self.right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Escaped,
    Caught,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Playing,
    /// Full-maze reveal; the simulation is frozen until `until`.
    Flashback { until: Instant },
    /// The run is decided. The end message stays up until `until`.
    Over {
        outcome: Outcome,
        at: Instant,
        until: Instant,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Escaped,
    Caught,
}

#[derive(Debug, Clone)]
pub struct Game {
    pub maze: Maze,
    pub player: Pos,
    pub orbs: BTreeSet<Pos>,
    pub trail: ShadowTrail,
    pub score: u32,
    pub darkness: u32,
    pub phase: Phase,
    pub mutations: u32,
    started_at: Instant,
    last_mutation: Instant,
}

impl Game {
    /// Fresh playthrough on a random maze.
    pub fn new(rng: &mut impl Rng, now: Instant) -> Self {
        let maze = Maze::generate(ROWS, COLS, rng);
        let orbs = orbs::spawn(&maze, ORB_COUNT, rng);
        Self::with_layout(maze, orbs, now)
    }

    pub fn with_layout(maze: Maze, orbs: BTreeSet<Pos>, now: Instant) -> Self {
        Self {
            player: maze.start(),
            maze,
            orbs,
            trail: ShadowTrail::new(SHADOW_DELAY),
            score: 0,
            darkness: 0,
            phase: Phase::Playing,
            mutations: 0,
            started_at: now,
            last_mutation: now,
        }
    }

    pub fn status(&self) -> Status {
        match self.phase {
            Phase::Over {
                outcome: Outcome::Escaped,
                ..
            } => Status::Escaped,
            Phase::Over {
                outcome: Outcome::Caught,
                ..
            } => Status::Caught,
            Phase::Playing | Phase::Flashback { .. } => Status::Running,
        }
    }

    pub fn shadow(&self) -> Option<Pos> {
        self.trail.shadow()
    }

    /// Clock reading for display: stops at the moment the run was decided.
    fn display_time(&self, now: Instant) -> Instant {
        match self.phase {
            Phase::Over { at, .. } => at,
            _ => now,
        }
    }

    /// Play time, frozen at the moment the run was decided.
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.display_time(now).saturating_duration_since(self.started_at)
    }

    /// Time left until the next dynamic mutation is due.
    pub fn next_mutation_in(&self, now: Instant) -> Duration {
        (self.last_mutation + MUTATION_INTERVAL).saturating_duration_since(self.display_time(now))
    }

    /// True once the end message has been shown for its full duration.
    pub fn is_finished(&self, now: Instant) -> bool {
        matches!(self.phase, Phase::Over { until, .. } if now >= until)
    }

    fn move_player(&mut self, input: &FrameInput) -> bool {
        let moved = player::resolve_moves(&self.maze, &mut self.player, |dir| input.held(dir));
        if moved {
            self.score += 1;
            self.trail.record(self.player);
            self.darkness = (self.darkness + DARKNESS_STEP).min(MAX_DARKNESS);
        }
        moved
    }

    fn collect_orb(&mut self) -> bool {
        if !self.orbs.remove(&self.player) {
            return false;
        }
        self.darkness = self.darkness.saturating_sub(ORB_LIGHT);
        log::debug!(
            "orb collected at {:?}, {} left, darkness {}",
            self.player,
            self.orbs.len(),
            self.darkness
        );
        true
    }

    fn mutate_if_due(&mut self, now: Instant, rng: &mut impl Rng) {
        if now.saturating_duration_since(self.last_mutation) <= MUTATION_INTERVAL {
            return;
        }
        let flipped = self.maze.mutate(rng);
        self.last_mutation = now;
        self.mutations += 1;
        log::debug!("maze mutation #{}: flipped {:?}", self.mutations, flipped);
        if !self.maze.is_reachable(self.player, self.maze.exit()) {
            log::info!("exit is no longer reachable from {:?}", self.player);
        }
    }

    fn check_terminal(&self) -> Option<Outcome> {
        if self.trail.catches(self.player) {
            Some(Outcome::Caught)
        } else if self.player == self.maze.exit() {
            Some(Outcome::Escaped)
        } else {
            None
        }
    }
}

/// Advance the game by one frame.
pub fn tick(game: &mut Game, input: &FrameInput, now: Instant, rng: &mut impl Rng) {
    if let Phase::Flashback { until } = game.phase {
        if now >= until {
            game.phase = Phase::Playing;
        }
    }
    if game.phase != Phase::Playing {
        return;
    }

    game.move_player(input);
    game.collect_orb();
    game.mutate_if_due(now, rng);

    if let Some(outcome) = game.check_terminal() {
        game.phase = Phase::Over {
            outcome,
            at: now,
            until: now + END_HOLD,
        };
        log::info!(
            "{:?} after {}s with score {}",
            outcome,
            game.elapsed(now).as_secs(),
            game.score
        );
        return;
    }

    if input.flashback {
        game.phase = Phase::Flashback {
            until: now + FLASHBACK_DURATION,
        };
        log::debug!("flashback for {:?}", FLASHBACK_DURATION);
    }
}
