//! Prompt input
//!
//! Gives worker code a blocking "read one line" while the line itself is
//! typed into the input field on the UI thread. An unbounded channel sits
//! between the two; every run gets a fresh one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use thiserror::Error;

use super::bridge::{OutputSink, OutputWriter};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PromptError {
    #[error("input closed while waiting for an answer")]
    Closed,
}

/// Source of answers for story prompts
pub trait LineSource {
    /// Show `prompt` (if non-empty) and block until a line is available
    fn read_line(&mut self, prompt: &str) -> Result<String, PromptError>;
}

/// UI-side half: pushes submitted lines
pub struct Submitter {
    tx: Sender<String>,
}

impl Submitter {
    /// Queue a line. Returns `false` if the reader is gone.
    pub fn submit(&self, value: String) -> bool {
        self.tx.send(value).is_ok()
    }
}

/// Worker-side half: blocks for submitted lines and echoes them
pub struct PromptReader<W: OutputSink = OutputWriter> {
    rx: Receiver<String>,
    out: W,
    awaiting: Arc<AtomicBool>,
}

/// Create a fresh input queue echoing through `out`
pub fn channel<W: OutputSink>(out: W) -> (Submitter, PromptReader<W>) {
    let (tx, rx) = mpsc::channel();
    let reader = PromptReader {
        rx,
        out,
        awaiting: Arc::new(AtomicBool::new(false)),
    };
    (Submitter { tx }, reader)
}

impl<W: OutputSink> PromptReader<W> {
    /// Flag that is set while the reader is blocked waiting for input
    pub fn awaiting_flag(&self) -> Arc<AtomicBool> {
        self.awaiting.clone()
    }
}

impl<W: OutputSink> LineSource for PromptReader<W> {
    fn read_line(&mut self, prompt: &str) -> Result<String, PromptError> {
        if !prompt.is_empty() {
            self.out.write(prompt);
        }

        self.awaiting.store(true, Ordering::SeqCst);
        let received = self.rx.recv();
        self.awaiting.store(false, Ordering::SeqCst);

        let value = received.map_err(|_| PromptError::Closed)?;
        self.out.write(&format!("{value}\n\n"));
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::thread;
    use std::time::{Duration, Instant};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<String>>);

    impl OutputSink for Capture {
        fn write(&self, chunk: &str) {
            self.0.lock().unwrap().push_str(chunk);
        }
    }

    impl Capture {
        fn text(&self) -> String {
            self.0.lock().unwrap().clone()
        }
    }

    fn wait_for(flag: &AtomicBool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !flag.load(Ordering::SeqCst) {
            assert!(Instant::now() < deadline, "reader never blocked");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_read_line_blocks_until_submit() {
        let out = Capture::default();
        let (submitter, mut reader) = channel(out.clone());
        let awaiting = reader.awaiting_flag();

        let worker = thread::spawn(move || reader.read_line("Name: "));

        wait_for(&awaiting);
        assert_eq!(out.text(), "Name: ");

        assert!(submitter.submit("Bob".to_string()));
        assert_eq!(worker.join().unwrap(), Ok("Bob".to_string()));
        assert_eq!(out.text(), "Name: Bob\n\n");
        assert!(!awaiting.load(Ordering::SeqCst));
    }

    #[test]
    fn test_empty_prompt_writes_nothing_first() {
        let out = Capture::default();
        let (submitter, mut reader) = channel(out.clone());

        submitter.submit(String::new());
        assert_eq!(reader.read_line(""), Ok(String::new()));
        assert_eq!(out.text(), "\n\n");
    }

    #[test]
    fn test_submissions_are_fifo() {
        let out = Capture::default();
        let (submitter, mut reader) = channel(out.clone());

        for value in ["first", "second", "third"] {
            submitter.submit(value.to_string());
        }

        assert_eq!(reader.read_line("> ").unwrap(), "first");
        assert_eq!(reader.read_line("> ").unwrap(), "second");
        assert_eq!(reader.read_line("> ").unwrap(), "third");
        assert_eq!(out.text(), "> first\n\n> second\n\n> third\n\n");
    }

    #[test]
    fn test_rapid_submits_from_ui_thread() {
        let out = Capture::default();
        let (submitter, mut reader) = channel(out);

        let worker = thread::spawn(move || {
            (0..50)
                .map(|_| reader.read_line(""))
                .collect::<Result<Vec<_>, _>>()
        });
        for i in 0..50 {
            submitter.submit(i.to_string());
        }

        let expected: Vec<String> = (0..50).map(|i| i.to_string()).collect();
        assert_eq!(worker.join().unwrap().unwrap(), expected);
    }

    #[test]
    fn test_dropping_submitter_ends_wait() {
        let out = Capture::default();
        let (submitter, mut reader) = channel(out.clone());
        let awaiting = reader.awaiting_flag();

        let worker = thread::spawn(move || reader.read_line("? "));
        wait_for(&awaiting);
        drop(submitter);

        assert_eq!(worker.join().unwrap(), Err(PromptError::Closed));
        assert_eq!(out.text(), "? ");
    }

    #[test]
    fn test_submit_after_reader_dropped() {
        let (submitter, reader) = channel(Capture::default());
        drop(reader);
        assert!(!submitter.submit("late".to_string()));
    }
}
