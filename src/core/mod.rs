//! Core output/input plumbing between the story worker and the UI.
//!
//! - **ansi**: SGR escape sequence scanner and style tag mapping
//! - **bridge**: thread-safe output buffer drained onto a display surface
//! - **prompt**: blocking line input fed from the UI input field
//! - **event**: wake-up events sent to the UI loop
//! - **session**: single worker thread host for the story
//!
//! # Architecture
//!
//! ```text
//! worker thread                     UI thread
//! ─────────────                     ─────────
//! OutputWriter ──► Pending ──Output──► OutputBridge ──► Surface
//! PromptReader ◄── InputQueue ◄────── Submitter ◄── input field
//! ```

pub mod ansi;
pub mod bridge;
pub mod event;
pub mod prompt;
pub mod session;
