//! Terminal renderer using crossterm
//!
//! Draws the application state to the console.

use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{
        Attribute, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal::{
        self, Clear, ClearType, DisableLineWrap, EnableLineWrap, EnterAlternateScreen,
        LeaveAlternateScreen, SetTitle,
    },
};
use tracing::debug;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::layout::{Button, Rect};
use super::transcript::Span;
use crate::app::{App, Controls};
use crate::config::Color;

const STATUS_HINTS: &str = "F5 start  F6 clear  Enter send  PgUp/PgDn scroll  Esc quit";

/// Terminal renderer
pub struct Renderer {
    /// Whether the terminal has been initialized
    initialized: bool,
    /// Current terminal size
    size: (u16, u16),
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            initialized: false,
            size: (0, 0),
        }
    }

    /// Initialize the terminal for rendering
    pub fn init(&mut self, title: &str) -> io::Result<()> {
        debug!("Entering raw mode");
        terminal::enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableMouseCapture,
            DisableLineWrap,
            SetTitle(title),
            Clear(ClearType::All),
            MoveTo(0, 0)
        )?;

        stdout.flush()?;
        self.size = terminal::size()?;
        self.initialized = true;
        debug!("Renderer initialized at {}x{}", self.size.0, self.size.1);
        Ok(())
    }

    /// Cleanup the terminal
    pub fn cleanup(&mut self) -> io::Result<()> {
        if !self.initialized {
            return Ok(());
        }
        self.initialized = false;

        let mut stdout = io::stdout();
        let _ = execute!(
            stdout,
            ResetColor,
            SetAttribute(Attribute::Reset),
            Show,
            EnableLineWrap,
            DisableMouseCapture,
            LeaveAlternateScreen
        );
        let _ = stdout.flush();

        // Disable raw mode - this is the most important part
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.size = (cols, rows);
    }

    /// Draw a full frame
    pub fn render(&mut self, app: &mut App) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = io::BufWriter::with_capacity(65536, stdout.lock());

        // Begin synchronized update (reduces flicker)
        write!(out, "\x1b[?2026h")?;
        queue!(out, Hide)?;

        self.draw_transcript(&mut out, app)?;
        self.draw_separator(&mut out, app)?;
        let cursor = self.draw_input(&mut out, app)?;
        self.draw_buttons(&mut out, app)?;
        self.draw_status(&mut out, app)?;

        if let Some((col, row)) = cursor {
            queue!(out, MoveTo(col, row), Show)?;
        }

        queue!(out, ResetColor, SetAttribute(Attribute::Reset))?;

        // End synchronized update
        write!(out, "\x1b[?2026l")?;
        out.flush()
    }

    fn visible(&self, rect: Rect) -> bool {
        rect.width > 0 && rect.height > 0 && rect.y < self.size.1
    }

    fn draw_transcript<W: Write>(&self, out: &mut W, app: &App) -> io::Result<()> {
        let area = app.layout.transcript;
        if !self.visible(area) {
            return Ok(());
        }

        let scheme = &app.scheme;
        let rows = app.transcript.visible_rows();

        for y in 0..area.height {
            queue!(
                out,
                MoveTo(area.x, area.y + y),
                SetBackgroundColor(scheme.text_bg.to_crossterm())
            )?;
            let used = match rows.get(y as usize) {
                Some(row) => self.draw_spans(out, app, row, area.width as usize)?,
                None => 0,
            };
            pad(out, area.width as usize - used.min(area.width as usize))?;
        }

        // Show scroll indicator if scrolled
        if app.transcript.is_scrolled() {
            let indicator = format!("[↑ {} rows]", app.transcript.scroll_offset());
            let width = indicator.width() as u16;
            if width <= area.width {
                queue!(
                    out,
                    MoveTo(area.x + area.width - width, area.y),
                    SetBackgroundColor(scheme.status_bar_bg.to_crossterm()),
                    SetForegroundColor(scheme.status_bar_fg.to_crossterm()),
                    Print(indicator)
                )?;
            }
        }
        Ok(())
    }

    /// Write styled spans clipped to `width`; returns columns used
    fn draw_spans<W: Write>(
        &self,
        out: &mut W,
        app: &App,
        spans: &[Span],
        width: usize,
    ) -> io::Result<usize> {
        let mut used = 0;
        for span in spans {
            let color = app.scheme.tag_color(span.tag);
            let weight = if span.tag.is_bold() {
                Attribute::Bold
            } else {
                Attribute::NormalIntensity
            };
            queue!(out, SetForegroundColor(color.to_crossterm()), SetAttribute(weight))?;

            let mut text = String::with_capacity(span.text.len());
            for ch in span.text.chars() {
                let w = ch.width().unwrap_or(0);
                if used + w > width {
                    break;
                }
                text.push(ch);
                used += w;
            }
            queue!(out, Print(text))?;
            if used >= width {
                break;
            }
        }
        queue!(out, SetAttribute(Attribute::NormalIntensity))?;
        Ok(used)
    }

    fn draw_separator<W: Write>(&self, out: &mut W, app: &App) -> io::Result<()> {
        let Some(area) = app.layout.separator else {
            return Ok(());
        };
        if !self.visible(area) {
            return Ok(());
        }
        queue!(
            out,
            MoveTo(area.x, area.y),
            SetBackgroundColor(app.scheme.text_bg.to_crossterm()),
            SetForegroundColor(app.scheme.button_disabled_fg.to_crossterm()),
            Print("─".repeat(area.width as usize))
        )
    }

    /// Returns the screen position of the text cursor
    fn draw_input<W: Write>(&self, out: &mut W, app: &mut App) -> io::Result<Option<(u16, u16)>> {
        let area = app.layout.input;
        if !self.visible(area) {
            return Ok(None);
        }

        let (text, cursor_col) = app.input.view(area.width as usize);
        queue!(
            out,
            MoveTo(area.x, area.y),
            SetBackgroundColor(app.scheme.input_bg.to_crossterm()),
            SetForegroundColor(app.scheme.input_fg.to_crossterm()),
            Print(&text)
        )?;
        pad(out, (area.width as usize).saturating_sub(text.width()))?;

        // Gap between the field and the Enter button
        queue!(out, SetBackgroundColor(app.scheme.text_bg.to_crossterm()), Print(" "))?;

        Ok(Some((area.x + cursor_col as u16, area.y)))
    }

    fn draw_buttons<W: Write>(&self, out: &mut W, app: &App) -> io::Result<()> {
        let scheme = &app.scheme;
        let controls = app.controls();

        // Button row background
        if let Some(rect) = app.layout.button_rect(Button::Start) {
            if self.visible(Rect::new(0, rect.y, 1, 1)) {
                queue!(
                    out,
                    MoveTo(0, rect.y),
                    SetBackgroundColor(scheme.text_bg.to_crossterm())
                )?;
                pad(out, app.layout.transcript.width as usize)?;
            }
        }

        for (button, rect) in &app.layout.buttons {
            if !self.visible(*rect) {
                continue;
            }
            let enabled = match button {
                Button::Start => controls.contains(Controls::START),
                Button::Clear => controls.contains(Controls::CLEAR),
                Button::Send => controls.contains(Controls::SEND),
            };
            let fg: Color = if enabled {
                scheme.button_fg
            } else {
                scheme.button_disabled_fg
            };
            let label: String = button.label().chars().take(rect.width as usize).collect();
            queue!(
                out,
                MoveTo(rect.x, rect.y),
                SetBackgroundColor(scheme.button_bg.to_crossterm()),
                SetForegroundColor(fg.to_crossterm()),
                Print(label)
            )?;
        }
        Ok(())
    }

    fn draw_status<W: Write>(&self, out: &mut W, app: &App) -> io::Result<()> {
        let Some(area) = app.layout.status else {
            return Ok(());
        };
        if !self.visible(area) {
            return Ok(());
        }

        let line = format!(" {} │ {}", app.phase().label(), STATUS_HINTS);
        let clipped: String = line.chars().take(area.width as usize).collect();
        queue!(
            out,
            MoveTo(area.x, area.y),
            SetBackgroundColor(app.scheme.status_bar_bg.to_crossterm()),
            SetForegroundColor(app.scheme.status_bar_fg.to_crossterm()),
            Print(&clipped)
        )?;
        pad(out, (area.width as usize).saturating_sub(clipped.width()))
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

fn pad<W: Write>(out: &mut W, n: usize) -> io::Result<()> {
    if n > 0 {
        queue!(out, Print(" ".repeat(n)))?;
    }
    Ok(())
}
