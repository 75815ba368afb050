use std::collections::HashSet;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::game::FrameInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameKey {
    Up,
    Down,
    Left,
    Right,
    Flashback,
    Quit,
}

impl GameKey {
    pub fn from_event(key: &KeyEvent) -> Option<Self> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => Some(GameKey::Quit),
                _ => None,
            };
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('k') => Some(GameKey::Up),
            KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('j') => Some(GameKey::Down),
            KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('h') => Some(GameKey::Left),
            KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('l') => Some(GameKey::Right),
            KeyCode::Char('f') => Some(GameKey::Flashback),
            KeyCode::Char('q') | KeyCode::Esc => Some(GameKey::Quit),
            _ => None,
        }
    }
}

/// Turns terminal key events into a per-frame "keys held" snapshot.
///
/// Terminals that report key releases give exact held state. Everywhere else
/// a key counts as held for the next frame after each press or auto-repeat.
/// In both modes a tap between two frames is latched so it is never lost.
#[derive(Debug)]
pub struct KeyState {
    reports_release: bool,
    down: HashSet<GameKey>,
    latched: HashSet<GameKey>,
    quit: bool,
}

impl KeyState {
    pub fn new(reports_release: bool) -> Self {
        Self {
            reports_release,
            down: HashSet::new(),
            latched: HashSet::new(),
            quit: false,
        }
    }

    pub fn handle(&mut self, key: &KeyEvent) {
        let Some(game_key) = GameKey::from_event(key) else {
            return;
        };
        match key.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                if game_key == GameKey::Quit {
                    self.quit = true;
                }
                self.latched.insert(game_key);
                if self.reports_release {
                    self.down.insert(game_key);
                }
            }
            KeyEventKind::Release => {
                self.down.remove(&game_key);
            }
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// Snapshot for the coming frame. Clears the latched taps.
    pub fn frame_input(&mut self) -> FrameInput {
        let held = |k: GameKey| self.down.contains(&k) || self.latched.contains(&k);
        let input = FrameInput {
            up: held(GameKey::Up),
            down: held(GameKey::Down),
            left: held(GameKey::Left),
            right: held(GameKey::Right),
            flashback: held(GameKey::Flashback),
        };
        self.latched.clear();
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn event(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn maps_keys() {
        let press = |code| GameKey::from_event(&event(code, KeyEventKind::Press));
        assert_eq!(press(KeyCode::Up), Some(GameKey::Up));
        assert_eq!(press(KeyCode::Char('h')), Some(GameKey::Left));
        assert_eq!(press(KeyCode::Char('d')), Some(GameKey::Right));
        assert_eq!(press(KeyCode::Char('f')), Some(GameKey::Flashback));
        assert_eq!(press(KeyCode::Esc), Some(GameKey::Quit));
        assert_eq!(press(KeyCode::Char('x')), None);

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(GameKey::from_event(&ctrl_c), Some(GameKey::Quit));
    }

    #[test]
    fn press_without_release_lasts_one_frame() {
        let mut keys = KeyState::new(false);
        keys.handle(&event(KeyCode::Right, KeyEventKind::Press));
        assert!(keys.frame_input().right);
        assert!(!keys.frame_input().right);
    }

    #[test]
    fn release_reporting_keeps_key_down() {
        let mut keys = KeyState::new(true);
        keys.handle(&event(KeyCode::Up, KeyEventKind::Press));
        keys.handle(&event(KeyCode::Left, KeyEventKind::Press));
        let input = keys.frame_input();
        assert!(input.up && input.left);
        assert!(keys.frame_input().up);

        keys.handle(&event(KeyCode::Up, KeyEventKind::Release));
        let input = keys.frame_input();
        assert!(!input.up);
        assert!(input.left);
    }

    #[test]
    fn tap_between_frames_is_not_lost() {
        let mut keys = KeyState::new(true);
        keys.handle(&event(KeyCode::Char('f'), KeyEventKind::Press));
        keys.handle(&event(KeyCode::Char('f'), KeyEventKind::Release));
        assert!(keys.frame_input().flashback);
        assert!(!keys.frame_input().flashback);
    }

    #[test]
    fn quit_is_sticky() {
        let mut keys = KeyState::new(false);
        assert!(!keys.quit_requested());
        keys.handle(&event(KeyCode::Char('q'), KeyEventKind::Press));
        keys.frame_input();
        assert!(keys.quit_requested());
    }
}
