use crate::error::{Error, Result};
use crate::input::{read_line_with_timeout, LineSource, TimedAnswer};
use crossterm::style::Stylize;
use std::fmt::Display;
use std::io::Write;
use std::time::Duration;
use tracing::debug;

/// Operator-facing terminal: one line source in, one text sink out.
pub struct Console<S: LineSource, W: Write> {
    source: S,
    out: W,
    // set after a timed read expired; lines typed late are dropped before the next prompt
    stale_input: bool,
}

impl<S: LineSource, W: Write> Console<S, W> {
    pub fn new(source: S, out: W) -> Self {
        Self {
            source,
            out,
            stale_input: false,
        }
    }

    pub fn out(&self) -> &W {
        &self.out
    }

    pub fn into_parts(self) -> (S, W) {
        (self.source, self.out)
    }

    pub fn say(&mut self, message: impl Display) {
        if let Err(e) = writeln!(self.out, "{message}") {
            debug!("console write failed: {e}");
        }
        self.flush();
    }

    pub fn blank(&mut self) {
        self.say("");
    }

    pub fn success(&mut self, message: impl Display) {
        self.say(message.to_string().green());
    }

    pub fn warn(&mut self, message: impl Display) {
        self.say(message.to_string().yellow());
    }

    pub fn error(&mut self, message: impl Display) {
        self.say(message.to_string().red());
    }

    pub fn info(&mut self, message: impl Display) {
        self.say(message.to_string().blue());
    }

    pub fn heading(&mut self, message: impl Display) {
        self.say(message.to_string().cyan());
    }

    fn show_prompt(&mut self, prompt: &str) {
        if let Err(e) = write!(self.out, "{prompt}") {
            debug!("console write failed: {e}");
        }
        self.flush();
    }

    // output is best effort; a closed terminal must not end the round
    fn flush(&mut self) {
        if let Err(e) = self.out.flush() {
            debug!("console flush failed: {e}");
        }
    }

    fn discard_stale(&mut self) {
        if self.stale_input {
            let dropped = self.source.drain();
            if dropped > 0 {
                debug!(dropped, "discarded lines typed after the answer window");
            }
            self.stale_input = false;
        }
    }

    /// Untimed prompt. Returns the trimmed line.
    pub fn prompt(&mut self, prompt: &str) -> Result<String> {
        self.discard_stale();
        self.show_prompt(prompt);
        match self.source.recv() {
            Some(line) => Ok(line.trim().to_string()),
            None => {
                self.blank();
                Err(Error::InputClosed)
            }
        }
    }

    /// Prompt with an upper bound on the wait.
    pub fn prompt_timed(&mut self, prompt: &str, timeout: Duration) -> TimedAnswer {
        self.discard_stale();
        self.show_prompt(prompt);
        let answer = read_line_with_timeout(&self.source, timeout);
        if answer == TimedAnswer::TimedOut {
            self.stale_input = true;
            self.blank();
        }
        answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ScriptedLineSource;
    use std::sync::mpsc;

    struct ClosedTerminal;

    impl Write for ClosedTerminal {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }
    }

    fn output<S: LineSource>(console: &Console<S, Vec<u8>>) -> String {
        String::from_utf8_lossy(console.out()).to_string()
    }

    #[test]
    fn prompt_trims_but_keeps_case() {
        let mut console = Console::new(ScriptedLineSource::from_lines(["  Alice  "]), Vec::new());
        let name = console.prompt("Name: ").unwrap();
        assert_eq!(name, "Alice");
        assert!(output(&console).contains("Name: "));
    }

    #[test]
    fn prompt_on_closed_input_fails() {
        let mut console =
            Console::new(ScriptedLineSource::from_lines(Vec::<String>::new()), Vec::new());
        assert!(matches!(console.prompt("Name: "), Err(Error::InputClosed)));
    }

    #[test]
    fn timed_prompt_uppercases() {
        let mut console = Console::new(ScriptedLineSource::from_lines([" a "]), Vec::new());
        let answer = console.prompt_timed("Answer: ", Duration::from_millis(50));
        assert_eq!(answer, TimedAnswer::Answer("A".to_string()));
    }

    #[test]
    fn late_lines_are_dropped_after_timeout() {
        let (tx, rx) = mpsc::channel();
        let mut console = Console::new(ScriptedLineSource::new(rx), Vec::new());

        let answer = console.prompt_timed("Answer: ", Duration::from_millis(10));
        assert_eq!(answer, TimedAnswer::TimedOut);

        // typed after the window closed
        tx.send("b".to_string()).unwrap();

        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            tx.send("c".to_string()).unwrap();
        });
        let answer = console.prompt_timed("Answer: ", Duration::from_secs(2));
        handle.join().unwrap();
        assert_eq!(answer, TimedAnswer::Answer("C".to_string()));
    }

    #[test]
    fn notices_contain_their_text() {
        let mut console =
            Console::new(ScriptedLineSource::from_lines(Vec::<String>::new()), Vec::new());
        console.success("saved");
        console.warn("careful");
        console.error("broken");
        console.info("stats");
        console.heading("Question 1");
        let text = output(&console);
        for needle in ["saved", "careful", "broken", "stats", "Question 1"] {
            assert!(text.contains(needle), "missing {needle}");
        }
    }

    #[test]
    fn rejected_writes_do_not_stop_prompting() {
        let mut console = Console::new(ScriptedLineSource::from_lines(["bob", "b"]), ClosedTerminal);
        console.heading("Question 1");
        console.error("broken");
        assert_eq!(console.prompt("Name: ").unwrap(), "bob");
        let answer = console.prompt_timed("Answer: ", Duration::from_millis(50));
        assert_eq!(answer, TimedAnswer::Answer("B".to_string()));
    }
}
