//! Translation of raw terminal events into session actions.
//!
//! Pure: no terminal state is touched here, which keeps the full keyboard
//! surface unit-testable.

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use colander_core::selection::Direction;

use crate::session::types::Action;

/// Maps one terminal event to at most one action.
///
/// Unmapped events (focus changes, paste, key releases, mouse movement) are
/// dropped.
#[must_use]
pub fn translate_event(event: &Event) -> Option<Action> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => translate_key(key),
        Event::Mouse(mouse) => translate_mouse(mouse),
        Event::Resize(width, height) => Some(Action::Resize {
            width: *width,
            height: *height,
        }),
        _ => None,
    }
}

fn translate_key(key: &KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::Cancel),
        KeyCode::Enter => Some(Action::Finalize),
        KeyCode::Tab | KeyCode::BackTab => Some(Action::SwitchAxis),
        KeyCode::Up => Some(Action::Move(Direction::Up)),
        KeyCode::Down => Some(Action::Move(Direction::Down)),
        KeyCode::Left => Some(Action::Move(Direction::Left)),
        KeyCode::Right => Some(Action::Move(Direction::Right)),
        KeyCode::Backspace => Some(Action::QueryBackspace),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::Cancel)
        }
        KeyCode::Char(character) if key.modifiers.contains(KeyModifiers::ALT) => {
            translate_alt_char(character)
        }
        KeyCode::Char(' ') => Some(Action::ToggleFocused),
        KeyCode::Char(character) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::QueryChar(character))
        }
        _ => None,
    }
}

fn translate_alt_char(character: char) -> Option<Action> {
    match character {
        'e' => Some(Action::CycleMode),
        'i' => Some(Action::ToggleCase),
        'h' => Some(Action::Move(Direction::Left)),
        'j' => Some(Action::Move(Direction::Down)),
        'k' => Some(Action::Move(Direction::Up)),
        'l' => Some(Action::Move(Direction::Right)),
        'a' => Some(Action::SelectAllFocused),
        'c' => Some(Action::ClearFocused),
        'r' => Some(Action::Rerun),
        '1'..='9' => Some(Action::ToggleColumnNumber(
            character.to_digit(10).unwrap_or(0) as usize,
        )),
        _ => None,
    }
}

fn translate_mouse(mouse: &MouseEvent) -> Option<Action> {
    match mouse.kind {
        MouseEventKind::Up(MouseButton::Left) => Some(Action::Click {
            column: mouse.column,
            row: mouse.row,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn test_terminal_keys() {
        assert_eq!(
            translate_event(&key(KeyCode::Esc, KeyModifiers::NONE)),
            Some(Action::Cancel)
        );
        assert_eq!(
            translate_event(&key(KeyCode::Enter, KeyModifiers::NONE)),
            Some(Action::Finalize)
        );
        assert_eq!(
            translate_event(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Action::Cancel)
        );
    }

    #[test]
    fn test_alt_toggles() {
        assert_eq!(
            translate_event(&key(KeyCode::Char('e'), KeyModifiers::ALT)),
            Some(Action::CycleMode)
        );
        assert_eq!(
            translate_event(&key(KeyCode::Char('i'), KeyModifiers::ALT)),
            Some(Action::ToggleCase)
        );
        assert_eq!(
            translate_event(&key(KeyCode::Char('r'), KeyModifiers::ALT)),
            Some(Action::Rerun)
        );
    }

    #[test]
    fn test_navigation_keys() {
        assert_eq!(
            translate_event(&key(KeyCode::Up, KeyModifiers::NONE)),
            Some(Action::Move(Direction::Up))
        );
        assert_eq!(
            translate_event(&key(KeyCode::Char('j'), KeyModifiers::ALT)),
            Some(Action::Move(Direction::Down))
        );
        assert_eq!(
            translate_event(&key(KeyCode::Char('h'), KeyModifiers::ALT)),
            Some(Action::Move(Direction::Left))
        );
        assert_eq!(
            translate_event(&key(KeyCode::Tab, KeyModifiers::NONE)),
            Some(Action::SwitchAxis)
        );
        assert_eq!(
            translate_event(&key(KeyCode::BackTab, KeyModifiers::SHIFT)),
            Some(Action::SwitchAxis)
        );
    }

    #[test]
    fn test_alt_digits_toggle_numbered_columns() {
        assert_eq!(
            translate_event(&key(KeyCode::Char('1'), KeyModifiers::ALT)),
            Some(Action::ToggleColumnNumber(1))
        );
        assert_eq!(
            translate_event(&key(KeyCode::Char('9'), KeyModifiers::ALT)),
            Some(Action::ToggleColumnNumber(9))
        );
        // Alt-0 is not part of the surface.
        assert_eq!(
            translate_event(&key(KeyCode::Char('0'), KeyModifiers::ALT)),
            None
        );
    }

    #[test]
    fn test_plain_characters_edit_the_query() {
        assert_eq!(
            translate_event(&key(KeyCode::Char('a'), KeyModifiers::NONE)),
            Some(Action::QueryChar('a'))
        );
        assert_eq!(
            translate_event(&key(KeyCode::Char('A'), KeyModifiers::SHIFT)),
            Some(Action::QueryChar('A'))
        );
        assert_eq!(
            translate_event(&key(KeyCode::Backspace, KeyModifiers::NONE)),
            Some(Action::QueryBackspace)
        );
    }

    #[test]
    fn test_space_toggles_selection() {
        assert_eq!(
            translate_event(&key(KeyCode::Char(' '), KeyModifiers::NONE)),
            Some(Action::ToggleFocused)
        );
    }

    #[test]
    fn test_left_click_is_reported_with_position() {
        let event = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Up(MouseButton::Left),
            column: 12,
            row: 3,
            modifiers: KeyModifiers::NONE,
        });

        assert_eq!(
            translate_event(&event),
            Some(Action::Click { column: 12, row: 3 })
        );
    }

    #[test]
    fn test_mouse_movement_is_ignored() {
        let event = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Moved,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        });

        assert_eq!(translate_event(&event), None);
    }

    #[test]
    fn test_resize_updates_viewport() {
        assert_eq!(
            translate_event(&Event::Resize(120, 40)),
            Some(Action::Resize {
                width: 120,
                height: 40
            })
        );
    }
}
