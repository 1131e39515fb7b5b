//! SGR escape sequence scanner
//!
//! Splits a chunk of output into plain text runs and escape sequences.
//! Only `ESC [ ... m` (SGR) sequences change the style, and only the four
//! bold colour combinations listed in [`EscapeCode::action`] map to a
//! [`StyleTag`]. Every other well-formed CSI sequence is swallowed.

/// Escape introducer
pub const ESC: u8 = 0x1B;

/// Longest unterminated sequence kept back waiting for more input.
///
/// Anything longer cannot be one of the sequences we understand and is
/// shown verbatim instead.
pub const MAX_PENDING_ESCAPE: usize = 32;

// SGR parameters
const SGR_RESET: u16 = 0;
const SGR_BOLD: u16 = 1;
const SGR_FG_RED: u16 = 31;
const SGR_FG_YELLOW: u16 = 33;
const SGR_FG_MAGENTA: u16 = 35;
const SGR_FG_CYAN: u16 = 36;

/// Bold + colour combinations, in lookup priority order
const STYLE_TABLE: [(u16, StyleTag); 4] = [
    (SGR_FG_YELLOW, StyleTag::BoldYellow),
    (SGR_FG_CYAN, StyleTag::BoldCyan),
    (SGR_FG_RED, StyleTag::BoldRed),
    (SGR_FG_MAGENTA, StyleTag::BoldMagenta),
];

/// Named style attached to a span of displayed text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StyleTag {
    #[default]
    None,
    BoldYellow,
    BoldCyan,
    BoldRed,
    BoldMagenta,
}

impl StyleTag {
    pub fn name(self) -> &'static str {
        match self {
            StyleTag::None => "none",
            StyleTag::BoldYellow => "bold-yellow",
            StyleTag::BoldCyan => "bold-cyan",
            StyleTag::BoldRed => "bold-red",
            StyleTag::BoldMagenta => "bold-magenta",
        }
    }

    pub fn is_bold(self) -> bool {
        self != StyleTag::None
    }
}

/// What an SGR sequence does to the current style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SgrAction {
    /// Back to [`StyleTag::None`]
    Reset,
    /// Switch to the given tag
    Set(StyleTag),
    /// Not one of ours; keep the current tag
    Ignore,
}

/// Parameters of a single SGR sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeCode {
    params: Vec<u16>,
    /// Private marker (`?`, `<`, `=`, `>`) present
    private: bool,
}

impl EscapeCode {
    /// Parse the bytes between `ESC [` and the final byte.
    ///
    /// Parameters are separated by `;` or `:`. An empty parameter counts as 0.
    pub fn parse(raw: &str) -> Self {
        let mut params = Vec::with_capacity(4);
        let mut private = false;
        let mut current: Option<u16> = None;

        for byte in raw.bytes() {
            match byte {
                b'0'..=b'9' => {
                    let digit = (byte - b'0') as u16;
                    current = Some(current.unwrap_or(0).saturating_mul(10).saturating_add(digit));
                }
                b';' | b':' => {
                    params.push(current.take().unwrap_or(0));
                }
                _ => private = true,
            }
        }
        params.push(current.unwrap_or(0));

        Self { params, private }
    }

    #[cfg(test)]
    pub fn params(&self) -> &[u16] {
        &self.params
    }

    /// Resolve the parameter set against the style table
    pub fn action(&self) -> SgrAction {
        if self.private {
            return SgrAction::Ignore;
        }
        if self.params.contains(&SGR_RESET) {
            return SgrAction::Reset;
        }
        if !self.params.contains(&SGR_BOLD) {
            return SgrAction::Ignore;
        }
        STYLE_TABLE
            .iter()
            .find(|(colour, _)| self.params.contains(colour))
            .map(|&(_, tag)| SgrAction::Set(tag))
            .unwrap_or(SgrAction::Ignore)
    }

    /// Tag in effect after applying this code on top of `current`
    pub fn apply(&self, current: StyleTag) -> StyleTag {
        match self.action() {
            SgrAction::Reset => StyleTag::None,
            SgrAction::Set(tag) => tag,
            SgrAction::Ignore => current,
        }
    }
}

/// A piece of scanned output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Plain text, shown as-is (may include a malformed sequence prefix)
    Text(&'a str),
    /// A complete SGR sequence
    Sgr(EscapeCode),
    /// A complete non-SGR CSI sequence, identified by its final byte
    Control(char),
    /// Trailing sequence with no final byte yet; always the last token
    Incomplete(&'a str),
}

/// Iterator over the tokens of a chunk
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

/// Scan `input` into tokens
pub fn scan(input: &str) -> Scanner<'_> {
    Scanner { input, pos: 0 }
}

impl<'a> Scanner<'a> {
    /// `rest` starts with ESC
    fn escape(&mut self, rest: &'a str) -> Token<'a> {
        let bytes = rest.as_bytes();

        match bytes.get(1) {
            None => {
                self.pos = self.input.len();
                return Token::Incomplete(rest);
            }
            Some(b'[') => {}
            Some(_) => {
                // Not a CSI introducer; the ESC is just a character
                self.pos += 1;
                return Token::Text(&rest[..1]);
            }
        }

        for (i, &byte) in bytes.iter().enumerate().skip(2) {
            match byte {
                // Parameter bytes
                0x30..=0x3F => continue,
                b'm' => {
                    self.pos += i + 1;
                    return Token::Sgr(EscapeCode::parse(&rest[2..i]));
                }
                0x40..=0x7E => {
                    self.pos += i + 1;
                    return Token::Control(byte as char);
                }
                _ => {
                    // Malformed: everything before the offending byte is text.
                    // Bytes so far are ASCII, so `i` is a char boundary.
                    self.pos += i;
                    return Token::Text(&rest[..i]);
                }
            }
        }

        self.pos = self.input.len();
        Token::Incomplete(rest)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let rest = &self.input[self.pos..];
        if rest.is_empty() {
            return None;
        }

        match rest.bytes().position(|b| b == ESC) {
            Some(0) => Some(self.escape(rest)),
            Some(at) => {
                self.pos += at;
                Some(Token::Text(&rest[..at]))
            }
            None => {
                self.pos = self.input.len();
                Some(Token::Text(rest))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token<'_>> {
        scan(input).collect()
    }

    #[test]
    fn test_style_table() {
        let cases = [
            ("1;33", StyleTag::BoldYellow),
            ("1;36", StyleTag::BoldCyan),
            ("1;31", StyleTag::BoldRed),
            ("1;35", StyleTag::BoldMagenta),
            ("33;1", StyleTag::BoldYellow),
            ("1:35", StyleTag::BoldMagenta),
        ];
        for (raw, tag) in cases {
            assert_eq!(EscapeCode::parse(raw).action(), SgrAction::Set(tag), "{raw}");
        }
    }

    #[test]
    fn test_reset_wins() {
        assert_eq!(EscapeCode::parse("0").action(), SgrAction::Reset);
        assert_eq!(EscapeCode::parse("").action(), SgrAction::Reset);
        assert_eq!(EscapeCode::parse("1;33;0").action(), SgrAction::Reset);
        for tag in [StyleTag::BoldYellow, StyleTag::BoldRed, StyleTag::None] {
            assert_eq!(EscapeCode::parse("0").apply(tag), StyleTag::None);
        }
    }

    #[test]
    fn test_unrecognized_keeps_tag() {
        // bold green, plain yellow, background white
        for raw in ["1;32", "33", "47", "1", "1;34", "?1;33"] {
            let code = EscapeCode::parse(raw);
            assert_eq!(code.apply(StyleTag::BoldCyan), StyleTag::BoldCyan, "{raw}");
        }
    }

    #[test]
    fn test_color_priority() {
        assert_eq!(
            EscapeCode::parse("1;31;33").apply(StyleTag::None),
            StyleTag::BoldYellow
        );
    }

    #[test]
    fn test_param_overflow_saturates() {
        let code = EscapeCode::parse("99999999;1");
        assert_eq!(code.params(), &[u16::MAX, 1]);
    }

    #[test]
    fn test_scan_text_and_sgr() {
        assert_eq!(
            tokens("a\x1b[1;33mb\x1b[0m"),
            vec![
                Token::Text("a"),
                Token::Sgr(EscapeCode::parse("1;33")),
                Token::Text("b"),
                Token::Sgr(EscapeCode::parse("0")),
            ]
        );
    }

    #[test]
    fn test_scan_non_sgr_csi() {
        assert_eq!(
            tokens("x\x1b[2Ky\x1b[?25h"),
            vec![
                Token::Text("x"),
                Token::Control('K'),
                Token::Text("y"),
                Token::Control('h'),
            ]
        );
    }

    #[test]
    fn test_scan_incomplete_tail() {
        assert_eq!(
            tokens("hi\x1b[1;3"),
            vec![Token::Text("hi"), Token::Incomplete("\x1b[1;3")]
        );
        assert_eq!(tokens("\x1b"), vec![Token::Incomplete("\x1b")]);
        assert_eq!(tokens("\x1b["), vec![Token::Incomplete("\x1b[")]);
    }

    #[test]
    fn test_scan_malformed_is_text() {
        assert_eq!(
            tokens("\x1b[1 bold"),
            vec![Token::Text("\x1b[1"), Token::Text(" bold")]
        );
        assert_eq!(
            tokens("\x1b[é"),
            vec![Token::Text("\x1b["), Token::Text("é")]
        );
    }

    #[test]
    fn test_scan_lone_escape() {
        assert_eq!(
            tokens("a\x1bXb"),
            vec![Token::Text("a"), Token::Text("\x1b"), Token::Text("Xb")]
        );
    }

    #[test]
    fn test_scan_utf8_text() {
        assert_eq!(
            tokens("█▓▒░\x1b[0m日本"),
            vec![
                Token::Text("█▓▒░"),
                Token::Sgr(EscapeCode::parse("0")),
                Token::Text("日本"),
            ]
        );
    }
}
