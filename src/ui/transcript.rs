//! Scrollback transcript
//!
//! The display surface the output bridge writes into. Text is kept as
//! logical lines of styled spans and word-wrapped to the view width when
//! rendered.

use std::collections::VecDeque;

use unicode_width::UnicodeWidthChar;

use crate::core::ansi::StyleTag;
use crate::core::bridge::Surface;

const TAB_WIDTH: usize = 8;

/// A run of text sharing one style tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub tag: StyleTag,
}

/// One logical line (no newlines inside)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    pub spans: Vec<Span>,
    /// Display width so far, used for tab stops
    width: usize,
}

impl Line {
    fn push(&mut self, text: &str, tag: StyleTag) {
        if text.is_empty() {
            return;
        }

        let mut expanded = String::with_capacity(text.len());
        for ch in text.chars() {
            match ch {
                '\t' => {
                    let pad = TAB_WIDTH - self.width % TAB_WIDTH;
                    expanded.extend(std::iter::repeat(' ').take(pad));
                    self.width += pad;
                }
                '\r' => {}
                '\x1b' => {
                    expanded.push_str("^[");
                    self.width += 2;
                }
                c if c.is_control() => {}
                c => {
                    expanded.push(c);
                    self.width += c.width().unwrap_or(0);
                }
            }
        }

        match self.spans.last_mut() {
            Some(last) if last.tag == tag => last.text.push_str(&expanded),
            _ if expanded.is_empty() => {}
            _ => self.spans.push(Span { text: expanded, tag }),
        }
    }

    #[cfg(test)]
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Styled scrollback with a bottom-anchored scroll offset
pub struct Transcript {
    lines: VecDeque<Line>,
    max_lines: usize,
    /// Rows scrolled up from the bottom (0 = following output)
    scroll: usize,
    /// Size of the area the transcript is drawn into
    view: (usize, usize),
}

impl Transcript {
    pub fn new(max_lines: usize) -> Self {
        let mut lines = VecDeque::new();
        lines.push_back(Line::default());
        Self {
            lines,
            max_lines: max_lines.max(1),
            scroll: 0,
            view: (80, 24),
        }
    }

    /// Append text under `tag`; `\n` starts a new line
    pub fn append(&mut self, text: &str, tag: StyleTag) {
        let mut parts = text.split('\n');
        if let Some(first) = parts.next() {
            self.current_line().push(first, tag);
        }
        for part in parts {
            let mut line = Line::default();
            line.push(part, tag);
            self.lines.push_back(line);
        }

        while self.lines.len() > self.max_lines {
            self.lines.pop_front();
        }
    }

    fn current_line(&mut self) -> &mut Line {
        if self.lines.is_empty() {
            self.lines.push_back(Line::default());
        }
        let last = self.lines.len() - 1;
        &mut self.lines[last]
    }

    /// Remove all text
    pub fn clear(&mut self) {
        self.lines.clear();
        self.lines.push_back(Line::default());
        self.scroll = 0;
    }

    #[cfg(test)]
    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter()
    }

    #[cfg(test)]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Set the size of the drawing area
    pub fn set_view(&mut self, width: usize, height: usize) {
        self.view = (width.max(1), height);
        self.clamp_scroll();
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll
    }

    pub fn is_scrolled(&self) -> bool {
        self.scroll > 0
    }

    pub fn scroll_up(&mut self, rows: usize) {
        self.scroll = self.scroll.saturating_add(rows);
        self.clamp_scroll();
    }

    pub fn scroll_down(&mut self, rows: usize) {
        self.scroll = self.scroll.saturating_sub(rows);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = 0;
    }

    pub fn page_rows(&self) -> usize {
        self.view.1.saturating_sub(1).max(1)
    }

    fn clamp_scroll(&mut self) {
        let (width, height) = self.view;
        let total: usize = self.lines.iter().map(|l| wrap_line(l, width).len()).sum();
        self.scroll = self.scroll.min(total.saturating_sub(height));
    }

    /// Rows currently in view, top to bottom
    pub fn visible_rows(&self) -> Vec<Vec<Span>> {
        let (width, height) = self.view;
        let wanted = height + self.scroll;

        // Wrap from the bottom up until enough rows are collected
        let mut rows: Vec<Vec<Span>> = Vec::new();
        for line in self.lines.iter().rev() {
            let mut wrapped = wrap_line(line, width);
            wrapped.reverse();
            rows.extend(wrapped);
            if rows.len() >= wanted {
                break;
            }
        }

        let start = self.scroll.min(rows.len());
        let end = wanted.min(rows.len());
        let mut visible: Vec<Vec<Span>> = rows[start..end].to_vec();
        visible.reverse();
        visible
    }

    /// Plain text of all lines joined with `\n`
    #[cfg(test)]
    pub fn plain_text(&self) -> String {
        self.lines
            .iter()
            .map(Line::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Surface for Transcript {
    fn insert(&mut self, text: &str, tag: StyleTag) {
        self.append(text, tag);
    }

    fn see_end(&mut self) {
        self.scroll_to_bottom();
    }
}

/// Word-wrap one logical line into display rows of at most `width` columns
pub fn wrap_line(line: &Line, width: usize) -> Vec<Vec<Span>> {
    let width = width.max(1);
    let cells: Vec<(char, StyleTag, usize)> = line
        .spans
        .iter()
        .flat_map(|s| s.text.chars().map(move |c| (c, s.tag, c.width().unwrap_or(0))))
        .collect();

    let mut rows = Vec::new();
    let mut start = 0;
    let mut col = 0;
    // Index just past the last space in the current row
    let mut brk: Option<usize> = None;
    let mut i = 0;

    while i < cells.len() {
        let (ch, _, w) = cells[i];
        if col + w > width && i > start {
            let end = match brk {
                Some(b) if b > start => b,
                _ => i,
            };
            rows.push(to_spans(&cells[start..end]));

            start = end;
            while start < cells.len() && cells[start].0 == ' ' {
                start += 1;
            }
            col = 0;
            brk = None;
            i = start;
            continue;
        }

        col += w;
        i += 1;
        if ch == ' ' {
            brk = Some(i);
        }
    }

    if start < cells.len() || rows.is_empty() {
        rows.push(to_spans(&cells[start..]));
    }
    rows
}

fn to_spans(cells: &[(char, StyleTag, usize)]) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();
    for &(ch, tag, _) in cells {
        match spans.last_mut() {
            Some(last) if last.tag == tag => last.text.push(ch),
            _ => spans.push(Span {
                text: ch.to_string(),
                tag,
            }),
        }
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_text(row: &[Span]) -> String {
        row.iter().map(|s| s.text.as_str()).collect()
    }

    fn line(text: &str) -> Line {
        let mut line = Line::default();
        line.push(text, StyleTag::None);
        line
    }

    #[test]
    fn test_append_splits_lines() {
        let mut t = Transcript::new(100);
        t.append("Hello", StyleTag::None);
        t.append(" world\nsecond", StyleTag::None);
        t.append("\n", StyleTag::None);

        assert_eq!(t.plain_text(), "Hello world\nsecond\n");
        assert_eq!(t.line_count(), 3);
    }

    #[test]
    fn test_same_tag_spans_merge() {
        let mut t = Transcript::new(100);
        t.append("[Current", StyleTag::BoldYellow);
        t.append(" Score]", StyleTag::BoldYellow);
        t.append(" plain", StyleTag::None);

        let first = t.lines().next().unwrap();
        assert_eq!(first.spans.len(), 2);
        assert_eq!(first.spans[0].text, "[Current Score]");
        assert_eq!(first.spans[0].tag, StyleTag::BoldYellow);
    }

    #[test]
    fn test_tabs_expand_to_stops() {
        let mut t = Transcript::new(100);
        t.append("\t[Score]", StyleTag::None);
        t.append("\nab\tc", StyleTag::None);

        assert_eq!(t.plain_text(), "        [Score]\nab      c");
    }

    #[test]
    fn test_carriage_return_dropped() {
        let mut t = Transcript::new(100);
        t.append("one\r\ntwo", StyleTag::None);
        assert_eq!(t.plain_text(), "one\ntwo");
    }

    #[test]
    fn test_escape_shown_in_caret_notation() {
        let mut t = Transcript::new(100);
        t.append("end\x1b[0", StyleTag::None);
        t.append("\tx", StyleTag::None);
        assert_eq!(t.plain_text(), "end^[[0 x");
    }

    #[test]
    fn test_scrollback_cap() {
        let mut t = Transcript::new(3);
        for i in 0..10 {
            t.append(&format!("{i}\n"), StyleTag::None);
        }
        assert_eq!(t.line_count(), 3);
        assert_eq!(t.plain_text(), "8\n9\n");
    }

    #[test]
    fn test_clear() {
        let mut t = Transcript::new(100);
        t.append("text\nmore", StyleTag::BoldRed);
        t.clear();
        assert_eq!(t.plain_text(), "");
        assert_eq!(t.line_count(), 1);
    }

    #[test]
    fn test_word_wrap() {
        let rows = wrap_line(&line("the quick brown fox"), 10);
        let texts: Vec<String> = rows.iter().map(|r| row_text(r)).collect();
        assert_eq!(texts, vec!["the quick ", "brown fox"]);
    }

    #[test]
    fn test_long_word_hard_wraps() {
        let rows = wrap_line(&line("abcdefghij"), 4);
        let texts: Vec<String> = rows.iter().map(|r| row_text(r)).collect();
        assert_eq!(texts, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wide_chars_wrap_by_width() {
        let rows = wrap_line(&line("日本語テキスト"), 6);
        let texts: Vec<String> = rows.iter().map(|r| row_text(r)).collect();
        assert_eq!(texts, vec!["日本語", "テキス", "ト"]);
    }

    #[test]
    fn test_wrap_keeps_tags() {
        let mut l = Line::default();
        l.push("aaaa ", StyleTag::None);
        l.push("bbbb", StyleTag::BoldCyan);
        let rows = wrap_line(&l, 6);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec![Span { text: "bbbb".to_string(), tag: StyleTag::BoldCyan }]);
    }

    #[test]
    fn test_empty_line_is_one_row() {
        assert_eq!(wrap_line(&Line::default(), 10), vec![Vec::<Span>::new()]);
    }

    #[test]
    fn test_visible_rows_follow_bottom() {
        let mut t = Transcript::new(100);
        t.set_view(20, 2);
        t.append("one\ntwo\nthree", StyleTag::None);

        let rows: Vec<String> = t.visible_rows().iter().map(|r| row_text(r)).collect();
        assert_eq!(rows, vec!["two", "three"]);
    }

    #[test]
    fn test_scroll_up_is_clamped() {
        let mut t = Transcript::new(100);
        t.set_view(20, 2);
        t.append("one\ntwo\nthree", StyleTag::None);

        t.scroll_up(10);
        assert_eq!(t.scroll_offset(), 1);
        let rows: Vec<String> = t.visible_rows().iter().map(|r| row_text(r)).collect();
        assert_eq!(rows, vec!["one", "two"]);

        t.scroll_down(5);
        assert!(!t.is_scrolled());
    }

    #[test]
    fn test_see_end_snaps_to_bottom() {
        let mut t = Transcript::new(100);
        t.set_view(20, 1);
        t.append("a\nb\nc", StyleTag::None);
        t.scroll_up(2);
        assert!(t.is_scrolled());

        t.insert("d", StyleTag::None);
        t.see_end();
        assert_eq!(t.scroll_offset(), 0);
    }
}
