//! Key mapping for the game window
//!
//! Converts crossterm key and mouse events to UI actions.

use bitflags::bitflags;
use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use super::layout::{Button, Layout};

/// Rows moved per mouse wheel notch
const WHEEL_ROWS: usize = 3;

bitflags! {
    /// Modifier keys
    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
    }
}

impl From<KeyModifiers> for Modifiers {
    fn from(mods: KeyModifiers) -> Self {
        let mut result = Modifiers::empty();
        if mods.contains(KeyModifiers::SHIFT) {
            result |= Modifiers::SHIFT;
        }
        if mods.contains(KeyModifiers::CONTROL) {
            result |= Modifiers::CTRL;
        }
        if mods.contains(KeyModifiers::ALT) {
            result |= Modifiers::ALT;
        }
        result
    }
}

/// Something the user asked the window to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    // Input field editing
    Insert(char),
    Backspace,
    Delete,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,

    // Controls
    Submit,
    Start,
    Clear,
    Quit,

    // Transcript scrolling
    ScrollUp(usize),
    ScrollDown(usize),
    ScrollPageUp,
    ScrollPageDown,
    ScrollBottom,
}

impl From<Button> for UiAction {
    fn from(button: Button) -> Self {
        match button {
            Button::Start => UiAction::Start,
            Button::Clear => UiAction::Clear,
            Button::Send => UiAction::Submit,
        }
    }
}

/// Key mapper for converting input events to actions
pub struct KeyMapper;

impl KeyMapper {
    /// Map a crossterm KeyEvent to an action
    pub fn map_key(event: &KeyEvent) -> Option<UiAction> {
        // Windows reports releases too
        if event.kind == KeyEventKind::Release {
            return None;
        }

        let mods = Modifiers::from(event.modifiers);

        match event.code {
            KeyCode::Char(ch) if mods.contains(Modifiers::CTRL) => Self::map_ctrl(ch),
            KeyCode::Char(_) if mods.contains(Modifiers::ALT) => None,
            KeyCode::Char(ch) => Some(UiAction::Insert(ch)),

            KeyCode::Enter => Some(UiAction::Submit),
            KeyCode::Esc => Some(UiAction::Quit),

            // Editing
            KeyCode::Backspace => Some(UiAction::Backspace),
            KeyCode::Delete => Some(UiAction::Delete),
            KeyCode::Left => Some(UiAction::CursorLeft),
            KeyCode::Right => Some(UiAction::CursorRight),
            KeyCode::Home => Some(UiAction::CursorHome),
            KeyCode::End if mods.contains(Modifiers::CTRL) => Some(UiAction::ScrollBottom),
            KeyCode::End => Some(UiAction::CursorEnd),

            // Scrolling
            KeyCode::Up if mods.contains(Modifiers::SHIFT) => Some(UiAction::ScrollUp(1)),
            KeyCode::Down if mods.contains(Modifiers::SHIFT) => Some(UiAction::ScrollDown(1)),
            KeyCode::PageUp => Some(UiAction::ScrollPageUp),
            KeyCode::PageDown => Some(UiAction::ScrollPageDown),

            // Function keys
            KeyCode::F(5) => Some(UiAction::Start),
            KeyCode::F(6) => Some(UiAction::Clear),

            _ => None,
        }
    }

    /// Ctrl + character shortcuts
    fn map_ctrl(ch: char) -> Option<UiAction> {
        match ch.to_ascii_lowercase() {
            'r' => Some(UiAction::Start),
            'l' => Some(UiAction::Clear),
            'q' | 'c' => Some(UiAction::Quit),
            _ => None,
        }
    }

    /// Map a mouse event using the current layout
    pub fn map_mouse(event: &MouseEvent, layout: &Layout) -> Option<UiAction> {
        match event.kind {
            MouseEventKind::ScrollUp => Some(UiAction::ScrollUp(WHEEL_ROWS)),
            MouseEventKind::ScrollDown => Some(UiAction::ScrollDown(WHEEL_ROWS)),
            MouseEventKind::Down(MouseButton::Left) => layout
                .button_at(event.column, event.row)
                .map(UiAction::from),
            _ => None,
        }
    }
}
