use std::io::{self, Write};
use std::time::Instant;

use crossterm::cursor::MoveTo;
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::QueueableCommand;
use unicode_width::UnicodeWidthStr;

use crate::components::{Pos, Tile};
use crate::game::{Game, Outcome, Phase, MAX_DARKNESS};

pub const TITLE: &str = "Memory Maze: Shadow Pursuit";

/// Terminal columns per maze cell.
const CELL_W: usize = 2;
const PANEL_GAP: usize = 2;
const PANEL_W: usize = 26;
/// Opacity of the white flashback veil.
const FLASHBACK_ALPHA: u8 = 180;

type Rgb = (u8, u8, u8);

const WHITE: Rgb = (255, 255, 255);
const BLACK: Rgb = (0, 0, 0);
const BLUE: Rgb = (0, 102, 204);
const RED: Rgb = (255, 0, 0);
const GREEN: Rgb = (0, 255, 0);
const YELLOW: Rgb = (255, 255, 0);
const GREY: Rgb = (100, 100, 100);
const DARK_GREY: Rgb = (30, 30, 30);
const LIGHT_ORB: Rgb = (255, 215, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Glyph {
    Blank,
    Orb,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell {
    glyph: Glyph,
    fg: Rgb,
    bg: Rgb,
}

impl Cell {
    const INVALID: Cell = Cell {
        glyph: Glyph::Invalid,
        fg: BLACK,
        bg: BLACK,
    };

    fn solid(bg: Rgb) -> Self {
        Self {
            glyph: Glyph::Blank,
            fg: bg,
            bg,
        }
    }

    fn veiled(self, over: Rgb, alpha: u8) -> Self {
        Self {
            glyph: self.glyph,
            fg: blend(self.fg, over, alpha),
            bg: blend(self.bg, over, alpha),
        }
    }
}

/// Alpha-composite `over` onto `base`.
fn blend(base: Rgb, over: Rgb, alpha: u8) -> Rgb {
    let a = u16::from(alpha);
    let mix = |b: u8, o: u8| ((u16::from(b) * (255 - a) + u16::from(o) * a) / 255) as u8;
    (mix(base.0, over.0), mix(base.1, over.1), mix(base.2, over.2))
}

fn rgb((r, g, b): Rgb) -> Color {
    Color::Rgb { r, g, b }
}

/// Diff-based terminal renderer: only cells that changed since the previous
/// frame are re-emitted.
pub struct Renderer {
    rows: usize,
    cols: usize,
    last: Vec<Cell>,
    last_hud: Vec<String>,
    last_message: Option<String>,
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
}

impl Renderer {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            last: vec![Cell::INVALID; rows * cols],
            last_hud: Vec::new(),
            last_message: None,
            needs_full: true,
            origin_x: 0,
            origin_y: 1,
        }
    }

    /// Smallest terminal (cols, rows) that fits the maze, panel and title.
    pub fn required_size(&self) -> (u16, u16) {
        let w = self.cols * CELL_W + PANEL_GAP + PANEL_W;
        let h = self.rows + 1;
        (w as u16, h as u16)
    }

    pub fn render(
        &mut self,
        out: &mut impl Write,
        game: &Game,
        now: Instant,
        term_size: (u16, u16),
    ) -> io::Result<()> {
        let (needed_w, needed_h) = self.required_size();
        let (term_w, term_h) = term_size;

        if term_w < needed_w || term_h < needed_h {
            if !self.needs_full {
                log::warn!("terminal {term_w}x{term_h} is smaller than {needed_w}x{needed_h}");
            }
            out.queue(MoveTo(0, 0))?;
            out.queue(Clear(ClearType::All))?;
            out.queue(Print(format!(
                "Terminal too small. Need at least {}x{} (cols x rows). Current: {}x{}.",
                needed_w, needed_h, term_w, term_h
            )))?;
            out.flush()?;
            self.needs_full = true;
            return Ok(());
        }

        let origin_x = (term_w - needed_w) / 2;
        let origin_y = (term_h - needed_h) / 2 + 1;
        if self.needs_full || origin_x != self.origin_x || origin_y != self.origin_y {
            self.origin_x = origin_x;
            self.origin_y = origin_y;
            self.needs_full = true;
            self.last_hud.clear();
            self.last_message = None;
            out.queue(ResetColor)?;
            out.queue(Clear(ClearType::All))?;
            out.queue(MoveTo(self.origin_x, self.origin_y - 1))?;
            out.queue(SetForegroundColor(Color::White))?;
            out.queue(Print(TITLE))?;
            out.queue(ResetColor)?;
        }

        for row in 0..self.rows {
            for col in 0..self.cols {
                let cell = cell_for(game, Pos::new(row, col));
                let idx = row * self.cols + col;
                if self.needs_full || cell != self.last[idx] {
                    self.last[idx] = cell;
                    self.draw_cell(out, row, col, cell)?;
                }
            }
        }

        self.draw_hud(out, game, now)?;
        self.draw_message(out, game)?;
        self.needs_full = false;

        out.flush()
    }

    fn draw_cell(&self, out: &mut impl Write, row: usize, col: usize, cell: Cell) -> io::Result<()> {
        let text = match cell.glyph {
            Glyph::Blank | Glyph::Invalid => "",
            Glyph::Orb => "●",
        };
        let x = self.origin_x + (col * CELL_W) as u16;
        let y = self.origin_y + row as u16;
        out.queue(MoveTo(x, y))?;
        out.queue(SetForegroundColor(rgb(cell.fg)))?;
        out.queue(SetBackgroundColor(rgb(cell.bg)))?;
        out.queue(Print(text))?;
        let w = UnicodeWidthStr::width(text);
        for _ in w..CELL_W {
            out.queue(Print(' '))?;
        }
        out.queue(ResetColor)?;
        Ok(())
    }

    fn draw_hud(&mut self, out: &mut impl Write, game: &Game, now: Instant) -> io::Result<()> {
        let lines = hud_lines(game, now);
        let x = self.origin_x + (self.cols * CELL_W + PANEL_GAP) as u16;
        for (i, (text, color)) in lines.iter().enumerate() {
            if self.last_hud.get(i) == Some(text) {
                continue;
            }
            out.queue(MoveTo(x, self.origin_y + (i * 2 + 1) as u16))?;
            out.queue(SetForegroundColor(rgb(*color)))?;
            out.queue(Print(format!("{text:<width$}", width = PANEL_W)))?;
            out.queue(ResetColor)?;
        }
        self.last_hud = lines.into_iter().map(|(text, _)| text).collect();
        Ok(())
    }

    fn draw_message(&mut self, out: &mut impl Write, game: &Game) -> io::Result<()> {
        let Some((text, color)) = end_message(game) else {
            return Ok(());
        };
        if self.last_message.as_deref() == Some(text.as_str()) {
            return Ok(());
        }
        let maze_w = self.cols * CELL_W;
        let text_w = UnicodeWidthStr::width(text.as_str()).min(maze_w);
        let x = self.origin_x + ((maze_w - text_w) / 2) as u16;
        let row = self.rows / 2;
        out.queue(MoveTo(x, self.origin_y + row as u16))?;
        out.queue(SetForegroundColor(rgb(color)))?;
        out.queue(SetBackgroundColor(rgb(BLACK)))?;
        out.queue(Print(&text))?;
        out.queue(ResetColor)?;
        // The game is frozen while the banner is up, so the cell pass leaves
        // this row alone until the next full redraw.
        self.last_message = Some(text);
        Ok(())
    }
}

fn cell_for(game: &Game, pos: Pos) -> Cell {
    let maze = &game.maze;
    let wall = maze.tile(pos) == Some(Tile::Wall);

    if let Phase::Flashback { .. } = game.phase {
        return if wall {
            Cell::solid(GREY)
        } else {
            Cell::solid(DARK_GREY).veiled(WHITE, FLASHBACK_ALPHA)
        };
    }

    let mut cell = if wall {
        Cell::solid(GREY)
    } else {
        Cell::solid(DARK_GREY)
    };
    if pos == maze.exit() {
        cell = Cell::solid(GREEN);
    }
    if game.orbs.contains(&pos) {
        cell = Cell {
            glyph: Glyph::Orb,
            fg: LIGHT_ORB,
            bg: cell.bg,
        };
    }
    if pos == game.player {
        cell = Cell::solid(BLUE);
    }
    if game.shadow() == Some(pos) {
        cell = Cell::solid(RED);
    }
    cell.veiled(BLACK, darkness_alpha(game.darkness))
}

fn darkness_alpha(darkness: u32) -> u8 {
    darkness.min(MAX_DARKNESS) as u8
}

fn hud_lines(game: &Game, now: Instant) -> Vec<(String, Rgb)> {
    vec![
        (format!("Score: {}", game.score), WHITE),
        (format!("Time: {}s", game.elapsed(now).as_secs()), WHITE),
        (format!("Orbs: {}", game.orbs.len()), LIGHT_ORB),
        (format!("Shadow: {}", shadow_status(game)), RED),
        (
            format!("Maze shifts in: {}s", game.next_mutation_in(now).as_secs()),
            GREY,
        ),
        ("Press 'f' for Flashback".to_string(), YELLOW),
        ("q to quit".to_string(), GREY),
    ]
}

fn shadow_status(game: &Game) -> String {
    let trail = &game.trail;
    if game.shadow().is_some() {
        "hunting".to_string()
    } else if trail.is_empty() {
        "asleep".to_string()
    } else {
        format!("wakes in {} moves", trail.delay() + 1 - trail.len())
    }
}

fn end_message(game: &Game) -> Option<(String, Rgb)> {
    match game.phase {
        Phase::Over {
            outcome: Outcome::Caught,
            ..
        } => Some(("Caught by the Shadow!".to_string(), RED)),
        Phase::Over {
            outcome: Outcome::Escaped,
            ..
        } => Some((format!("You Escaped! Score: {}", game.score), GREEN)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Maze;
    use std::collections::BTreeSet;
    use std::time::Duration;

    fn game() -> Game {
        let mut maze = Maze::open(4, 5);
        maze.set_wall(Pos::new(1, 1), true);
        let orbs: BTreeSet<_> = [Pos::new(2, 2)].into_iter().collect();
        Game::with_layout(maze, orbs, Instant::now())
    }

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(GREY, BLACK, 0), GREY);
        assert_eq!(blend(GREY, WHITE, 255), WHITE);
        assert_eq!(blend((200, 100, 0), BLACK, 200), (43, 21, 0));
    }

    #[test]
    fn darkness_dims_the_maze() {
        let mut g = game();
        let lit = cell_for(&g, Pos::new(1, 1));
        assert_eq!(lit, Cell::solid(GREY));

        g.darkness = MAX_DARKNESS;
        let dark = cell_for(&g, Pos::new(1, 1));
        assert_eq!(dark.bg, blend(GREY, BLACK, 200));
        assert!(dark.bg.0 < lit.bg.0);
    }

    #[test]
    fn entities_are_drawn_over_the_floor() {
        let mut g = game();
        assert_eq!(cell_for(&g, g.maze.start()).bg, BLUE);
        assert_eq!(cell_for(&g, g.maze.exit()).bg, GREEN);
        assert_eq!(cell_for(&g, Pos::new(2, 2)).glyph, Glyph::Orb);

        for _ in 0..=g.trail.delay() {
            g.trail.record(Pos::new(3, 0));
        }
        assert_eq!(cell_for(&g, Pos::new(3, 0)).bg, RED);
    }

    #[test]
    fn flashback_shows_walls_only() {
        let mut g = game();
        g.darkness = MAX_DARKNESS;
        g.phase = Phase::Flashback {
            until: Instant::now() + Duration::from_secs(1),
        };
        let floor = Cell::solid(DARK_GREY).veiled(WHITE, FLASHBACK_ALPHA);
        assert_eq!(cell_for(&g, g.player), floor);
        assert_eq!(cell_for(&g, Pos::new(2, 2)), floor);
        assert_eq!(cell_for(&g, g.maze.exit()), floor);
        assert_eq!(cell_for(&g, Pos::new(1, 1)), Cell::solid(GREY));
    }

    #[test]
    fn end_messages() {
        let mut g = game();
        assert!(end_message(&g).is_none());
        let now = Instant::now();
        g.score = 12;
        g.phase = Phase::Over {
            outcome: Outcome::Escaped,
            at: now,
            until: now,
        };
        assert_eq!(end_message(&g).unwrap().0, "You Escaped! Score: 12");
    }

    #[test]
    fn shadow_status_counts_down() {
        let mut g = game();
        assert_eq!(shadow_status(&g), "asleep");
        g.trail.record(Pos::new(3, 0));
        assert_eq!(shadow_status(&g), "wakes in 10 moves");
        for _ in 0..10 {
            g.trail.record(Pos::new(3, 0));
        }
        assert_eq!(shadow_status(&g), "hunting");
    }

    fn caught(mut g: Game) -> Game {
        let now = Instant::now();
        g.phase = Phase::Over {
            outcome: Outcome::Caught,
            at: now,
            until: now + Duration::from_secs(3),
        };
        g
    }

    #[test]
    fn end_banner_is_not_painted_over() {
        let g = caught(game());
        let mut renderer = Renderer::new(4, 5);
        let now = Instant::now();
        let banner = "Caught by the Shadow!";
        // 80x24 puts the maze origin at row 10; the banner sits on maze row 2.
        let banner_row = "\x1b[13;";

        let mut first = Vec::new();
        renderer.render(&mut first, &g, now, (80, 24)).unwrap();
        assert!(String::from_utf8_lossy(&first).contains(banner));

        for _ in 0..3 {
            let mut next = Vec::new();
            renderer.render(&mut next, &g, now, (80, 24)).unwrap();
            assert!(!String::from_utf8_lossy(&next).contains(banner_row));
        }
    }

    #[test]
    fn full_redraw_puts_banner_back_on_top() {
        let g = caught(game());
        let mut renderer = Renderer::new(4, 5);
        let now = Instant::now();
        renderer.render(&mut Vec::new(), &g, now, (80, 24)).unwrap();

        let mut out = Vec::new();
        renderer.render(&mut out, &g, now, (100, 30)).unwrap();
        let text = String::from_utf8_lossy(&out);
        // 100x30 moves the origin to row 13, so the banner row is 15.
        let last_move = text.rfind("\x1b[16;").unwrap();
        assert!(text[last_move..].contains("Caught by the Shadow!"));
    }

    #[test]
    fn small_terminal_gets_a_notice() {
        let g = game();
        let mut renderer = Renderer::new(4, 5);
        let mut out = Vec::new();
        renderer.render(&mut out, &g, Instant::now(), (10, 3)).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("Terminal too small"));
    }

    #[test]
    fn second_frame_only_redraws_changes() {
        let g = game();
        let mut renderer = Renderer::new(4, 5);
        let now = Instant::now();
        let size = (80, 24);

        let mut first = Vec::new();
        renderer.render(&mut first, &g, now, size).unwrap();
        let mut second = Vec::new();
        renderer.render(&mut second, &g, now, size).unwrap();
        assert!(String::from_utf8_lossy(&first).contains(TITLE));
        assert!(second.len() < first.len() / 4);
    }
}
