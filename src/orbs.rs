use std::collections::BTreeSet;

use rand::Rng;

use crate::components::Pos;
use crate::level::Maze;

pub const ORB_COUNT: usize = 5;

/// Pick `count` distinct walkable cells. If the maze has fewer walkable
/// cells than that, all of them are returned.
pub fn spawn(maze: &Maze, count: usize, rng: &mut impl Rng) -> BTreeSet<Pos> {
    let target = count.min(maze.walkable_cells().len());
    let mut orbs = BTreeSet::new();
    while orbs.len() < target {
        let pos = Pos::new(rng.gen_range(0..maze.rows()), rng.gen_range(0..maze.cols()));
        if maze.is_walkable(pos) {
            orbs.insert(pos);
        }
    }
    orbs
}
