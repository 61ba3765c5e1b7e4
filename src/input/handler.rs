use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::game::{Action, Direction, GameMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    GameAction(Action),
    SelectMode(GameMode),
    Restart,
    Quit,
    None,
}

pub struct InputHandler;

impl InputHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle_key_event(&self, key: KeyEvent) -> KeyAction {
        // Handle Ctrl+C
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyAction::Quit;
        }

        match key.code {
            // Movement - Arrow keys
            KeyCode::Up => KeyAction::GameAction(Action::Move(Direction::Up)),
            KeyCode::Down => KeyAction::GameAction(Action::Move(Direction::Down)),
            KeyCode::Left => KeyAction::GameAction(Action::Move(Direction::Left)),
            KeyCode::Right => KeyAction::GameAction(Action::Move(Direction::Right)),

            // Movement - WASD
            KeyCode::Char('w') | KeyCode::Char('W') => {
                KeyAction::GameAction(Action::Move(Direction::Up))
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                KeyAction::GameAction(Action::Move(Direction::Down))
            }
            KeyCode::Char('a') | KeyCode::Char('A') => {
                KeyAction::GameAction(Action::Move(Direction::Left))
            }
            KeyCode::Char('d') | KeyCode::Char('D') => {
                KeyAction::GameAction(Action::Move(Direction::Right))
            }

            // Pause
            KeyCode::Char(' ') | KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::Esc => {
                KeyAction::GameAction(Action::TogglePause)
            }

            // Mode selection, in menu order
            KeyCode::Char(c @ '1'..='4') => {
                let index = (c as usize) - ('1' as usize);
                KeyAction::SelectMode(GameMode::ALL[index])
            }

            // Controls
            KeyCode::Char('q') | KeyCode::Char('Q') => KeyAction::Quit,
            KeyCode::Char('r') | KeyCode::Char('R') => KeyAction::Restart,

            _ => KeyAction::None,
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(handler: &InputHandler, code: KeyCode) -> KeyAction {
        handler.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_arrow_keys() {
        let handler = InputHandler::new();

        assert_eq!(
            press(&handler, KeyCode::Up),
            KeyAction::GameAction(Action::Move(Direction::Up))
        );
        assert_eq!(
            press(&handler, KeyCode::Down),
            KeyAction::GameAction(Action::Move(Direction::Down))
        );
        assert_eq!(
            press(&handler, KeyCode::Left),
            KeyAction::GameAction(Action::Move(Direction::Left))
        );
        assert_eq!(
            press(&handler, KeyCode::Right),
            KeyAction::GameAction(Action::Move(Direction::Right))
        );
    }

    #[test]
    fn test_wasd_keys() {
        let handler = InputHandler::new();

        assert_eq!(
            press(&handler, KeyCode::Char('w')),
            KeyAction::GameAction(Action::Move(Direction::Up))
        );
        assert_eq!(
            press(&handler, KeyCode::Char('a')),
            KeyAction::GameAction(Action::Move(Direction::Left))
        );
        assert_eq!(
            press(&handler, KeyCode::Char('s')),
            KeyAction::GameAction(Action::Move(Direction::Down))
        );
        assert_eq!(
            press(&handler, KeyCode::Char('d')),
            KeyAction::GameAction(Action::Move(Direction::Right))
        );
    }

    #[test]
    fn test_wasd_uppercase() {
        let handler = InputHandler::new();

        let w_upper = KeyEvent::new(KeyCode::Char('W'), KeyModifiers::SHIFT);
        assert_eq!(
            handler.handle_key_event(w_upper),
            KeyAction::GameAction(Action::Move(Direction::Up))
        );
    }

    #[test]
    fn test_pause_keys() {
        let handler = InputHandler::new();
        let pause = KeyAction::GameAction(Action::TogglePause);

        assert_eq!(press(&handler, KeyCode::Char(' ')), pause);
        assert_eq!(press(&handler, KeyCode::Char('p')), pause);
        assert_eq!(press(&handler, KeyCode::Char('P')), pause);
        assert_eq!(press(&handler, KeyCode::Esc), pause);
    }

    #[test]
    fn test_mode_keys() {
        let handler = InputHandler::new();

        assert_eq!(
            press(&handler, KeyCode::Char('1')),
            KeyAction::SelectMode(GameMode::Classic)
        );
        assert_eq!(
            press(&handler, KeyCode::Char('2')),
            KeyAction::SelectMode(GameMode::Maze)
        );
        assert_eq!(
            press(&handler, KeyCode::Char('3')),
            KeyAction::SelectMode(GameMode::TimeTrial)
        );
        assert_eq!(
            press(&handler, KeyCode::Char('4')),
            KeyAction::SelectMode(GameMode::Battle)
        );
        assert_eq!(press(&handler, KeyCode::Char('5')), KeyAction::None);
    }

    #[test]
    fn test_quit_keys() {
        let handler = InputHandler::new();

        assert_eq!(press(&handler, KeyCode::Char('q')), KeyAction::Quit);

        let q_upper = KeyEvent::new(KeyCode::Char('Q'), KeyModifiers::SHIFT);
        assert_eq!(handler.handle_key_event(q_upper), KeyAction::Quit);
    }

    #[test]
    fn test_restart_key() {
        let handler = InputHandler::new();

        assert_eq!(press(&handler, KeyCode::Char('r')), KeyAction::Restart);

        let r_upper = KeyEvent::new(KeyCode::Char('R'), KeyModifiers::SHIFT);
        assert_eq!(handler.handle_key_event(r_upper), KeyAction::Restart);
    }

    #[test]
    fn test_unknown_key() {
        let handler = InputHandler::new();
        assert_eq!(press(&handler, KeyCode::Char('x')), KeyAction::None);
    }

    #[test]
    fn test_ctrl_c() {
        let handler = InputHandler::new();

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handler.handle_key_event(ctrl_c), KeyAction::Quit);
    }
}
