use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

/// Result of a bounded wait for an operator answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimedAnswer {
    /// Trimmed, upper-cased line.
    Answer(String),
    /// Nothing arrived before the bound (or the source closed).
    TimedOut,
}

impl TimedAnswer {
    pub fn from_line(line: &str) -> Self {
        TimedAnswer::Answer(normalize_answer(line))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TimedAnswer::Answer(s) => Some(s.as_str()),
            TimedAnswer::TimedOut => None,
        }
    }
}

pub fn normalize_answer(line: &str) -> String {
    line.trim().to_uppercase()
}

/// Source of operator input lines
pub trait LineSource: Send + 'static {
    /// Block for up to `timeout` waiting for a line.
    fn recv_timeout(&self, timeout: Duration) -> Result<String, RecvTimeoutError>;

    /// Block until a line arrives. `None` once the source is closed.
    fn recv(&self) -> Option<String>;

    /// Discard lines that are already queued. Returns how many were dropped.
    fn drain(&self) -> usize;
}

fn drain_receiver(rx: &Receiver<String>) -> usize {
    let mut dropped = 0;
    while rx.try_recv().is_ok() {
        dropped += 1;
    }
    dropped
}

/// Production line source backed by stdin.
///
/// A single reader thread forwards lines over a channel. The thread is never
/// joined: when the main flow is done it simply returns and the process exits
/// with the reader still parked in `read_until`.
pub struct StdinLineSource {
    rx: Receiver<String>,
}

impl StdinLineSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let stdin = io::stdin();
            forward_lines(stdin.lock(), &tx);
        });

        Self { rx }
    }
}

/// Send every line of `reader` to `tx` until EOF, a read error, or the
/// receiver going away. A line that is not UTF-8 is skipped with a warning.
pub fn forward_lines<R: BufRead>(mut reader: R, tx: &Sender<String>) {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => {
                debug!("stdin reached EOF");
                break;
            }
            Ok(_) => {
                let Ok(line) = std::str::from_utf8(&buf) else {
                    warn!("ignoring an input line that is not valid UTF-8, please type it again");
                    continue;
                };
                let line = line.trim_end_matches(['\r', '\n']).to_string();
                if tx.send(line).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("stdin read failed, no more input: {e}");
                break;
            }
        }
    }
}

impl Default for StdinLineSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSource for StdinLineSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<String, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn recv(&self) -> Option<String> {
        self.rx.recv().ok()
    }

    fn drain(&self) -> usize {
        drain_receiver(&self.rx)
    }
}

/// Line source for tests and scripted play
pub struct ScriptedLineSource {
    rx: Receiver<String>,
}

impl ScriptedLineSource {
    pub fn new(rx: Receiver<String>) -> Self {
        Self { rx }
    }

    /// Queue every line up front; the source closes after the last one.
    pub fn from_lines<I, T>(lines: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let (tx, rx) = mpsc::channel();
        for line in lines {
            // receiver is alive for the whole loop
            let _ = tx.send(line.into());
        }
        Self { rx }
    }
}

impl LineSource for ScriptedLineSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<String, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn recv(&self) -> Option<String> {
        self.rx.recv().ok()
    }

    fn drain(&self) -> usize {
        drain_receiver(&self.rx)
    }
}

/// Wait up to `timeout` for one line from `source`.
pub fn read_line_with_timeout<S: LineSource + ?Sized>(
    source: &S,
    timeout: Duration,
) -> TimedAnswer {
    match source.recv_timeout(timeout) {
        Ok(line) => TimedAnswer::from_line(&line),
        Err(RecvTimeoutError::Timeout) => TimedAnswer::TimedOut,
        Err(RecvTimeoutError::Disconnected) => {
            debug!("line source closed while waiting for an answer");
            TimedAnswer::TimedOut
        }
    }
}
