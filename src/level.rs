use std::collections::VecDeque;

use rand::Rng;

use crate::components::{Dir, Pos, Tile};

/// Maze area in layout units; one tile is `TILE_SIZE` units square.
pub const MAZE_AREA_W: usize = 700;
pub const MAZE_AREA_H: usize = 600;
pub const TILE_SIZE: usize = 40;
pub const ROWS: usize = MAZE_AREA_H / TILE_SIZE;
pub const COLS: usize = MAZE_AREA_W / TILE_SIZE;

/// Cells toggled by each dynamic mutation.
pub const MUTATION_PICKS: usize = 5;

/// Walkable/blocked grid. The start and exit corners are always walkable.
#[derive(Debug, Clone)]
pub struct Maze {
    rows: usize,
    cols: usize,
    grid: Vec<Vec<Tile>>,
}

impl Maze {
    /// A fully open grid. Mainly useful for building layouts by hand.
    pub fn open(rows: usize, cols: usize) -> Self {
        assert!(rows > 0 && cols > 0, "maze needs at least one cell");
        Self {
            rows,
            cols,
            grid: vec![vec![Tile::Empty; cols]; rows],
        }
    }

    /// Random maze: `rows * cols / 3` uniform picks are walled in. Picks may
    /// land on the same cell twice, so fewer cells than that end up blocked.
    /// Solvability is not checked.
    pub fn generate(rows: usize, cols: usize, rng: &mut impl Rng) -> Self {
        let mut maze = Self::open(rows, cols);
        for _ in 0..(rows * cols) / 3 {
            let pos = maze.random_pos(rng);
            maze.grid[pos.row][pos.col] = Tile::Wall;
        }
        maze.clear_corners();
        maze
    }

    /// Flip `MUTATION_PICKS` random cells between wall and floor. Picks that
    /// land on the start or exit are spent without effect.
    pub fn mutate(&mut self, rng: &mut impl Rng) -> Vec<Pos> {
        let mut flipped = Vec::with_capacity(MUTATION_PICKS);
        for _ in 0..MUTATION_PICKS {
            let pos = self.random_pos(rng);
            if pos == self.start() || pos == self.exit() {
                continue;
            }
            let tile = &mut self.grid[pos.row][pos.col];
            *tile = match *tile {
                Tile::Empty => Tile::Wall,
                Tile::Wall => Tile::Empty,
            };
            flipped.push(pos);
        }
        self.clear_corners();
        flipped
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn start(&self) -> Pos {
        Pos::new(0, 0)
    }

    pub fn exit(&self) -> Pos {
        Pos::new(self.rows - 1, self.cols - 1)
    }

    pub fn tile(&self, pos: Pos) -> Option<Tile> {
        self.grid.get(pos.row).and_then(|row| row.get(pos.col)).copied()
    }

    pub fn is_walkable(&self, pos: Pos) -> bool {
        self.tile(pos) == Some(Tile::Empty)
    }

    /// Place or remove a wall. The start and exit cannot be walled.
    #[cfg(test)]
    pub fn set_wall(&mut self, pos: Pos, wall: bool) {
        if pos == self.start() || pos == self.exit() {
            return;
        }
        if let Some(tile) = self.grid.get_mut(pos.row).and_then(|row| row.get_mut(pos.col)) {
            *tile = if wall { Tile::Wall } else { Tile::Empty };
        }
    }

    /// The in-bounds neighbour of `pos` one step in `dir`.
    pub fn neighbor(&self, pos: Pos, dir: Dir) -> Option<Pos> {
        let (dr, dc) = dir.delta();
        let row = pos.row.checked_add_signed(dr)?;
        let col = pos.col.checked_add_signed(dc)?;
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(Pos::new(row, col))
    }

    pub fn walkable_cells(&self) -> Vec<Pos> {
        let mut cells = Vec::new();
        for row in 0..self.rows {
            for col in 0..self.cols {
                if self.grid[row][col] == Tile::Empty {
                    cells.push(Pos::new(row, col));
                }
            }
        }
        cells
    }

    pub fn wall_count(&self) -> usize {
        self.grid
            .iter()
            .flat_map(|row| row.iter())
            .filter(|&&tile| tile == Tile::Wall)
            .count()
    }

    /// Breadth-first reachability over walkable cells.
    pub fn is_reachable(&self, from: Pos, to: Pos) -> bool {
        if !self.is_walkable(from) || !self.is_walkable(to) {
            return false;
        }
        let mut seen = vec![vec![false; self.cols]; self.rows];
        let mut q = VecDeque::new();
        seen[from.row][from.col] = true;
        q.push_back(from);
        while let Some(pos) = q.pop_front() {
            if pos == to {
                return true;
            }
            for dir in Dir::ALL {
                let Some(next) = self.neighbor(pos, dir) else {
                    continue;
                };
                if seen[next.row][next.col] || !self.is_walkable(next) {
                    continue;
                }
                seen[next.row][next.col] = true;
                q.push_back(next);
            }
        }
        false
    }

    fn random_pos(&self, rng: &mut impl Rng) -> Pos {
        Pos::new(rng.gen_range(0..self.rows), rng.gen_range(0..self.cols))
    }

    fn clear_corners(&mut self) {
        let (start, exit) = (self.start(), self.exit());
        self.grid[start.row][start.col] = Tile::Empty;
        self.grid[exit.row][exit.col] = Tile::Empty;
    }
}
