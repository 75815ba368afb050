use crate::components::{Dir, Pos};
use crate::level::Maze;

/// Apply every held direction in `Dir::ALL` order, each from wherever the
/// previous step left the player. Two orthogonal keys can therefore move the
/// player diagonally in a single frame. Returns whether any step happened.
pub fn resolve_moves(maze: &Maze, pos: &mut Pos, held: impl Fn(Dir) -> bool) -> bool {
    let mut moved = false;
    for dir in Dir::ALL {
        if !held(dir) {
            continue;
        }
        if let Some(next) = maze.neighbor(*pos, dir).filter(|n| maze.is_walkable(*n)) {
            *pos = next;
            moved = true;
        }
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_and_out_of_bounds_moves_are_rejected() {
        let mut maze = Maze::open(3, 3);
        maze.set_wall(Pos::new(0, 1), true);
        let start = maze.start();
        for dir in [Dir::Up, Dir::Left, Dir::Right] {
            let mut pos = start;
            assert!(!resolve_moves(&maze, &mut pos, |d| d == dir), "{dir:?}");
            assert_eq!(pos, start);
        }

        let mut pos = start;
        assert!(resolve_moves(&maze, &mut pos, |d| d == Dir::Down));
        assert_eq!(pos, Pos::new(1, 0));
    }

    #[test]
    fn orthogonal_keys_combine_in_one_frame() {
        let maze = Maze::open(3, 3);
        let mut pos = Pos::new(0, 0);
        let moved = resolve_moves(&maze, &mut pos, |d| matches!(d, Dir::Down | Dir::Right));
        assert!(moved);
        assert_eq!(pos, Pos::new(1, 1));
    }

    #[test]
    fn opposite_keys_are_applied_in_order() {
        let maze = Maze::open(3, 3);
        let mut pos = Pos::new(1, 1);
        // Up then Down: net zero displacement but the frame still counts.
        let moved = resolve_moves(&maze, &mut pos, |d| matches!(d, Dir::Up | Dir::Down));
        assert!(moved);
        assert_eq!(pos, Pos::new(1, 1));
    }

    #[test]
    fn later_direction_sees_earlier_step() {
        let mut maze = Maze::open(3, 3);
        // Right from (1,0) is blocked, but Down first moves to (2,0) where Right is open.
        maze.set_wall(Pos::new(1, 1), true);
        let mut pos = Pos::new(1, 0);
        resolve_moves(&maze, &mut pos, |d| matches!(d, Dir::Down | Dir::Right));
        assert_eq!(pos, Pos::new(2, 1));
    }
}
