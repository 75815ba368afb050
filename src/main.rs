mod components;
mod config;
mod error;
mod game;
mod ghost;
mod input;
mod level;
mod orbs;
mod player;
mod render;

use std::io::{self, Stdout, Write};
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, Show};
use crossterm::event::{
    self, Event, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen, SetTitle};
use crossterm::ExecutableCommand;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Settings;
use crate::error::Result;
use crate::game::Game;
use crate::input::KeyState;
use crate::level::{COLS, ROWS};
use crate::render::{Renderer, TITLE};

const TICKS_PER_SECOND: u64 = 15;

fn main() -> ExitCode {
    match start() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("memory-maze: {err}");
            ExitCode::FAILURE
        }
    }
}

fn start() -> Result<()> {
    let settings = Settings::from_env()?;
    settings.init_logging()?;

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    let mut reports_release = false;
    let result = match enter_screen(&mut stdout) {
        Ok(()) => {
            reports_release = enable_key_release_events(&mut stdout);
            run(&mut stdout, &settings, reports_release)
        }
        Err(err) => Err(err.into()),
    };

    // Teardown runs in full even when a step fails; the game's own error wins.
    let restored = restore_screen(&mut stdout, reports_release);
    let raw = terminal::disable_raw_mode();
    result?;
    restored?;
    raw?;
    Ok(())
}

fn enter_screen(out: &mut impl Write) -> io::Result<()> {
    out.execute(EnterAlternateScreen)?;
    out.execute(Hide)?;
    out.execute(SetTitle(TITLE))?;
    Ok(())
}

/// Undo `enter_screen`, attempting every step and reporting the first failure.
fn restore_screen(out: &mut impl Write, reports_release: bool) -> io::Result<()> {
    let pop = if reports_release {
        out.execute(PopKeyboardEnhancementFlags).map(drop)
    } else {
        Ok(())
    };
    let show = out.execute(Show).map(drop);
    let leave = out.execute(LeaveAlternateScreen).map(drop);
    pop.and(show).and(leave)
}

/// Ask for key-release events where the terminal can deliver them.
fn enable_key_release_events(stdout: &mut Stdout) -> bool {
    if !matches!(terminal::supports_keyboard_enhancement(), Ok(true)) {
        log::info!("terminal does not report key releases, using press latching");
        return false;
    }
    let flags = KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
        | KeyboardEnhancementFlags::REPORT_EVENT_TYPES;
    match stdout.execute(PushKeyboardEnhancementFlags(flags)) {
        Ok(_) => true,
        Err(err) => {
            log::warn!("could not enable key release events: {err}");
            false
        }
    }
}

fn run(stdout: &mut Stdout, settings: &Settings, reports_release: bool) -> Result<()> {
    let seed = settings.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let mut rng = StdRng::seed_from_u64(seed);
    let mut game = Game::new(&mut rng, Instant::now());
    log::info!(
        "new game: seed {seed}, {}x{} maze, {} walls, exit reachable: {}",
        ROWS,
        COLS,
        game.maze.wall_count(),
        game.maze.is_reachable(game.maze.start(), game.maze.exit())
    );

    let mut keys = KeyState::new(reports_release);
    let mut renderer = Renderer::new(ROWS, COLS);
    let frame_time = Duration::from_micros(1_000_000 / TICKS_PER_SECOND);

    loop {
        let frame_start = Instant::now();
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                keys.handle(&key);
            }
        }
        if keys.quit_requested() {
            log::info!("quit with score {}", game.score);
            return Ok(());
        }

        let now = Instant::now();
        game::tick(&mut game, &keys.frame_input(), now, &mut rng);
        renderer.render(stdout, &game, now, terminal::size()?)?;
        if game.is_finished(now) {
            log::debug!("closing after {:?}", game.status());
            return Ok(());
        }

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            thread::sleep(frame_time - elapsed);
        }
    }
}
