//! Output bridge
//!
//! Carries text containing SGR escapes from whichever thread produces it to
//! the display surface owned by the UI thread.
//!
//! The bridge is split in two halves:
//!
//! - [`OutputWriter`]: cheap to clone, usable from any thread. Appends to
//!   the shared pending buffer and wakes the UI loop with
//!   [`HostEvent::Output`].
//! - [`OutputBridge`]: owned by the UI loop. Drains the pending buffer,
//!   tracks the current [`StyleTag`], and inserts styled runs into a
//!   [`Surface`].
//!
//! An escape sequence cut off at the end of a drain is held back and
//! completed by the next write instead of being shown raw.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, trace};

use super::ansi::{self, StyleTag, Token, MAX_PENDING_ESCAPE};
use super::event::HostEvent;

/// Something styled text can be appended to
pub trait Surface {
    /// Append `text` at the end, styled with `tag`
    fn insert(&mut self, text: &str, tag: StyleTag);
    /// Scroll so the end of the content is visible
    fn see_end(&mut self);
}

/// Destination for story output
pub trait OutputSink {
    fn write(&self, chunk: &str);
}

/// Raw text not yet parsed
struct Pending {
    buffer: Mutex<String>,
    /// A drain has been requested and not yet started
    scheduled: AtomicBool,
}

impl Pending {
    fn lock(&self) -> MutexGuard<'_, String> {
        // A panicking writer can't leave a String half-appended
        self.buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Producer half of the bridge
#[derive(Clone)]
pub struct OutputWriter {
    pending: Arc<Pending>,
    events: Sender<HostEvent>,
}

impl OutputSink for OutputWriter {
    fn write(&self, chunk: &str) {
        if chunk.is_empty() {
            return;
        }

        self.pending.lock().push_str(chunk);

        if !self.pending.scheduled.swap(true, Ordering::AcqRel) {
            // UI gone means nobody will ever display this; that's fine
            let _ = self.events.send(HostEvent::Output);
        }
    }
}

/// Consumer half of the bridge, owned by the UI loop
pub struct OutputBridge {
    pending: Arc<Pending>,
    current: StyleTag,
    /// Unterminated escape sequence left over from the last drain
    carry: String,
}

/// Create a connected writer/bridge pair
pub fn output_bridge(events: Sender<HostEvent>) -> (OutputWriter, OutputBridge) {
    let pending = Arc::new(Pending {
        buffer: Mutex::new(String::new()),
        scheduled: AtomicBool::new(false),
    });

    let writer = OutputWriter {
        pending: pending.clone(),
        events,
    };
    let bridge = OutputBridge {
        pending,
        current: StyleTag::None,
        carry: String::new(),
    };
    (writer, bridge)
}

impl OutputBridge {
    /// Style applied to the next inserted text
    #[cfg(test)]
    pub fn current_tag(&self) -> StyleTag {
        self.current
    }

    /// Whether a partial escape sequence is being held back
    #[cfg(test)]
    pub fn has_carry(&self) -> bool {
        !self.carry.is_empty()
    }

    /// Parse everything written so far into `surface`
    pub fn drain<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        // Clear the flag before taking the buffer so a write racing with us
        // either lands in this batch or schedules another drain.
        self.pending.scheduled.store(false, Ordering::Release);
        let taken = std::mem::take(&mut *self.pending.lock());
        if taken.is_empty() {
            return;
        }

        let text = if self.carry.is_empty() {
            taken
        } else {
            let mut joined = std::mem::take(&mut self.carry);
            joined.push_str(&taken);
            joined
        };

        self.parse(&text, surface);
    }

    /// Show any held-back partial sequence as text.
    ///
    /// The ESC byte itself is drawn by the surface; the transcript shows it
    /// as `^[`.
    pub fn flush_carry<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        if self.carry.is_empty() {
            return;
        }
        let carry = std::mem::take(&mut self.carry);
        debug!("Flushing unterminated escape sequence: {:?}", carry);
        self.insert(surface, &carry);
    }

    /// Forget the current style and any held-back sequence
    pub fn reset(&mut self) {
        self.current = StyleTag::None;
        self.carry.clear();
    }

    fn parse<S: Surface + ?Sized>(&mut self, text: &str, surface: &mut S) {
        for token in ansi::scan(text) {
            match token {
                Token::Text(run) => self.insert(surface, run),
                Token::Sgr(code) => {
                    self.current = code.apply(self.current);
                }
                Token::Control(final_byte) => {
                    trace!("Ignoring CSI sequence ending in {:?}", final_byte);
                }
                Token::Incomplete(partial) => {
                    if partial.len() > MAX_PENDING_ESCAPE {
                        debug!("Escape sequence too long, showing as text");
                        self.insert(surface, partial);
                    } else {
                        self.carry.push_str(partial);
                    }
                }
            }
        }
    }

    fn insert<S: Surface + ?Sized>(&self, surface: &mut S, text: &str) {
        if text.is_empty() {
            return;
        }
        surface.insert(text, self.current);
        surface.see_end();
    }
}
