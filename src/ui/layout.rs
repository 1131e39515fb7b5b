//! Screen layout and hit testing
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ transcript                           │
//! │                                      │
//! ├──────────────────────────────────────┤
//! │ input field                  [Enter] │
//! │ [Start / Restart Game] [Clear]       │
//! │ status bar                           │
//! └──────────────────────────────────────┘
//! ```

use unicode_width::UnicodeWidthStr;

/// A screen rectangle in cells
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, col: u16, row: u16) -> bool {
        col >= self.x
            && row >= self.y
            && col < self.x.saturating_add(self.width)
            && row < self.y.saturating_add(self.height)
    }
}

/// Clickable controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Start,
    Clear,
    Send,
}

impl Button {
    pub fn label(self) -> &'static str {
        match self {
            Button::Start => " Start / Restart Game ",
            Button::Clear => " Clear ",
            Button::Send => " Enter ",
        }
    }

    fn width(self) -> u16 {
        self.label().width() as u16
    }
}

/// Computed positions of every screen element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    pub transcript: Rect,
    /// Horizontal rule between transcript and input
    pub separator: Option<Rect>,
    pub input: Rect,
    pub buttons: Vec<(Button, Rect)>,
    pub status: Option<Rect>,
}

impl Layout {
    pub fn compute(cols: u16, rows: u16, show_status: bool) -> Self {
        let status_height = u16::from(show_status);
        // separator + input row + button row + status
        let chrome = 3 + status_height;

        let transcript_height = rows.saturating_sub(chrome);
        let separator_y = transcript_height;
        let input_y = separator_y + 1;
        let buttons_y = input_y + 1;

        let send = Button::Send.width().min(cols);
        let input = Rect::new(0, input_y, cols.saturating_sub(send + 1), 1);
        let send_rect = Rect::new(cols.saturating_sub(send), input_y, send, 1);

        let start = Button::Start.width();
        let start_rect = Rect::new(0, buttons_y, start.min(cols), 1);
        let clear_x = start + 1;
        let clear_rect = Rect::new(
            clear_x.min(cols),
            buttons_y,
            Button::Clear.width().min(cols.saturating_sub(clear_x)),
            1,
        );

        Self {
            transcript: Rect::new(0, 0, cols, transcript_height),
            separator: (rows >= chrome).then(|| Rect::new(0, separator_y, cols, 1)),
            input,
            buttons: vec![
                (Button::Send, send_rect),
                (Button::Start, start_rect),
                (Button::Clear, clear_rect),
            ],
            status: show_status.then(|| Rect::new(0, buttons_y + 1, cols, 1)),
        }
    }

    /// Button under a screen position
    pub fn button_at(&self, col: u16, row: u16) -> Option<Button> {
        self.buttons
            .iter()
            .find(|(_, rect)| rect.contains(col, row))
            .map(|(button, _)| *button)
    }

    pub fn button_rect(&self, button: Button) -> Option<Rect> {
        self.buttons
            .iter()
            .find(|(b, _)| *b == button)
            .map(|(_, rect)| *rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains() {
        let r = Rect::new(2, 3, 4, 1);
        assert!(r.contains(2, 3));
        assert!(r.contains(5, 3));
        assert!(!r.contains(6, 3));
        assert!(!r.contains(2, 4));
        assert!(!Rect::default().contains(0, 0));
    }

    #[test]
    fn test_compute_with_status() {
        let layout = Layout::compute(80, 24, true);

        assert_eq!(layout.transcript, Rect::new(0, 0, 80, 20));
        assert_eq!(layout.separator, Some(Rect::new(0, 20, 80, 1)));
        assert_eq!(layout.input, Rect::new(0, 21, 72, 1));
        assert_eq!(layout.button_rect(Button::Send), Some(Rect::new(73, 21, 7, 1)));
        assert_eq!(layout.button_rect(Button::Start), Some(Rect::new(0, 22, 22, 1)));
        assert_eq!(layout.button_rect(Button::Clear), Some(Rect::new(23, 22, 7, 1)));
        assert_eq!(layout.status, Some(Rect::new(0, 23, 80, 1)));
    }

    #[test]
    fn test_compute_without_status() {
        let layout = Layout::compute(80, 24, false);
        assert_eq!(layout.transcript.height, 21);
        assert_eq!(layout.status, None);
    }

    #[test]
    fn test_button_hit_testing() {
        let layout = Layout::compute(80, 24, true);

        assert_eq!(layout.button_at(0, 22), Some(Button::Start));
        assert_eq!(layout.button_at(21, 22), Some(Button::Start));
        assert_eq!(layout.button_at(22, 22), None);
        assert_eq!(layout.button_at(25, 22), Some(Button::Clear));
        assert_eq!(layout.button_at(79, 21), Some(Button::Send));
        assert_eq!(layout.button_at(10, 5), None);
    }

    #[test]
    fn test_tiny_terminal_does_not_panic() {
        let layout = Layout::compute(3, 2, true);
        assert_eq!(layout.transcript.height, 0);
        assert_eq!(layout.separator, None);
        let _ = layout.button_at(1, 1);
    }
}
