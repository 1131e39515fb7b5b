//! Single-line input field

use unicode_width::UnicodeWidthChar;

/// Line editor backing the input row
#[derive(Debug, Default)]
pub struct InputField {
    chars: Vec<char>,
    /// Cursor position in chars
    cursor: usize,
    /// First visible char
    offset: usize,
}

impl InputField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    #[cfg(test)]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn insert(&mut self, ch: char) {
        if ch.is_control() {
            return;
        }
        self.chars.insert(self.cursor, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.chars.remove(self.cursor);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.chars.len() {
            self.chars.remove(self.cursor);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.chars.len());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.chars.len();
    }

    /// Take the text out, leaving the field empty
    pub fn take(&mut self) -> String {
        let text = self.text();
        self.chars.clear();
        self.cursor = 0;
        self.offset = 0;
        text
    }

    /// Visible slice for a field `width` columns wide and the cursor column
    /// within it. Scrolls horizontally to keep the cursor in view.
    pub fn view(&mut self, width: usize) -> (String, usize) {
        let width = width.max(1);
        let char_width = |c: &char| c.width().unwrap_or(0);

        if self.cursor < self.offset {
            self.offset = self.cursor;
        }
        // The cursor itself needs one column
        while self.chars[self.offset..self.cursor].iter().map(char_width).sum::<usize>() + 1 > width
            && self.offset < self.cursor
        {
            self.offset += 1;
        }

        let mut visible = String::new();
        let mut used = 0;
        for ch in &self.chars[self.offset..] {
            let w = char_width(ch);
            if used + w > width {
                break;
            }
            visible.push(*ch);
            used += w;
        }

        let cursor_col = self.chars[self.offset..self.cursor].iter().map(char_width).sum();
        (visible, cursor_col)
    }
}
