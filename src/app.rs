//! Application state
//!
//! Owns everything on the UI thread: the transcript, the input field, the
//! output bridge and the story session. The main loop feeds it actions and
//! host events and redraws when it reports itself dirty.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use bitflags::bitflags;
use tracing::{debug, info, warn};

use crate::config::{ColorScheme, Config};
use crate::core::bridge::{output_bridge, OutputBridge, OutputWriter};
use crate::core::event::HostEvent;
use crate::core::session::{Session, WorkerPhase};
use crate::story;
use crate::ui::{InputField, KeyMapper, Layout, Transcript, UiAction};

bitflags! {
    /// Controls that currently accept input
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Controls: u8 {
        const START = 0b001;
        const CLEAR = 0b010;
        const SEND  = 0b100;
    }
}

impl Controls {
    /// Enabled set while no story is running
    pub const IDLE: Controls = Controls::START.union(Controls::CLEAR);
    /// Enabled set while a story is running
    pub const RUNNING: Controls = Controls::SEND;
}

pub struct App {
    pub scheme: ColorScheme,
    pub transcript: Transcript,
    pub input: InputField,
    pub layout: Layout,
    show_status: bool,

    writer: OutputWriter,
    bridge: OutputBridge,
    events_tx: Sender<HostEvent>,
    events_rx: Receiver<HostEvent>,
    session: Session,

    controls: Controls,
    phase: WorkerPhase,
    dirty: bool,
    quit: bool,
}

impl App {
    pub fn new(config: &Config, cols: u16, rows: u16) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        let (writer, bridge) = output_bridge(events_tx.clone());

        let mut app = Self {
            scheme: config.color_scheme(),
            transcript: Transcript::new(config.ui.scrollback_lines),
            input: InputField::new(),
            layout: Layout::default(),
            show_status: config.ui.show_status_bar,
            writer,
            bridge,
            events_tx,
            events_rx,
            session: Session::new(),
            controls: Controls::IDLE,
            phase: WorkerPhase::Idle,
            dirty: true,
            quit: false,
        };
        app.resize(cols, rows);
        app
    }

    pub fn controls(&self) -> Controls {
        self.controls
    }

    pub fn phase(&self) -> WorkerPhase {
        self.phase
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Returns whether a redraw is needed and resets the flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Recompute layout for a new terminal size
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.layout = Layout::compute(cols, rows, self.show_status);
        let area = self.layout.transcript;
        self.transcript
            .set_view(area.width as usize, area.height as usize);
        self.dirty = true;
    }

    /// Drain pending host events without blocking
    pub fn process_host_events(&mut self) {
        loop {
            match self.events_rx.try_recv() {
                Ok(HostEvent::Output) => {
                    self.bridge.drain(&mut self.transcript);
                    self.dirty = true;
                }
                Ok(HostEvent::WorkerExited { run }) => self.on_worker_exited(run),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        let phase = self.session.phase();
        if phase != self.phase {
            debug!("Worker phase: {}", phase.label());
            self.phase = phase;
            self.dirty = true;
        }
    }

    fn on_worker_exited(&mut self, run: u64) {
        // The exit report was written before this event was sent
        self.bridge.drain(&mut self.transcript);
        self.bridge.flush_carry(&mut self.transcript);
        self.bridge.reset();
        self.session.reap();
        self.controls = Controls::IDLE;
        self.dirty = true;
        info!("Run {} exited, controls restored", run);
    }

    /// Apply a user action
    pub fn handle(&mut self, action: UiAction) {
        match action {
            UiAction::Insert(ch) => self.input.insert(ch),
            UiAction::Backspace => self.input.backspace(),
            UiAction::Delete => self.input.delete(),
            UiAction::CursorLeft => self.input.move_left(),
            UiAction::CursorRight => self.input.move_right(),
            UiAction::CursorHome => self.input.home(),
            UiAction::CursorEnd => self.input.end(),

            UiAction::Submit => self.submit(),
            UiAction::Start => self.start_game(),
            UiAction::Clear => self.clear(),
            UiAction::Quit => self.quit = true,

            UiAction::ScrollUp(rows) => self.transcript.scroll_up(rows),
            UiAction::ScrollDown(rows) => self.transcript.scroll_down(rows),
            UiAction::ScrollPageUp => {
                let page = self.transcript.page_rows();
                self.transcript.scroll_up(page);
            }
            UiAction::ScrollPageDown => {
                let page = self.transcript.page_rows();
                self.transcript.scroll_down(page);
            }
            UiAction::ScrollBottom => self.transcript.scroll_to_bottom(),
        }
        self.dirty = true;
    }

    pub fn handle_key(&mut self, event: &crossterm::event::KeyEvent) {
        if let Some(action) = KeyMapper::map_key(event) {
            self.handle(action);
        }
    }

    pub fn handle_mouse(&mut self, event: &crossterm::event::MouseEvent) {
        if let Some(action) = KeyMapper::map_mouse(event, &self.layout) {
            self.handle(action);
        }
    }

    /// Spawn a fresh story run if none is active
    pub fn start_game(&mut self) {
        if !self.controls.contains(Controls::START) {
            debug!("Start ignored, a run is active");
            return;
        }

        let started = self
            .session
            .start(self.writer.clone(), self.events_tx.clone(), |out, input| {
                let ending = story::run(out, input)?;
                info!("Story ended: won={} score={}", ending.won, ending.score);
                Ok(())
            });

        match started {
            Ok(run) => {
                debug!("Started run {}", run);
                self.controls = Controls::RUNNING;
                self.transcript.scroll_to_bottom();
            }
            Err(e) => warn!("Could not start story: {}", e),
        }
    }

    /// Empty the transcript
    pub fn clear(&mut self) {
        if !self.controls.contains(Controls::CLEAR) {
            debug!("Clear ignored while a run is active");
            return;
        }
        self.transcript.clear();
    }

    /// Send the input field text to the story
    pub fn submit(&mut self) {
        if !self.controls.contains(Controls::SEND) {
            return;
        }
        let value = self.input.take();
        self.session.submit(value);
    }
}
