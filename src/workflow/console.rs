//! Progress output sinks.

/// Receives the human-readable progress transcript.
pub trait Console: Send {
    fn line(&mut self, line: String);
}

/// Prints each line to stdout, separated by a blank line.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn line(&mut self, line: String) {
        println!("\n{}", line);
    }
}

/// Keeps lines in memory.
#[derive(Debug, Default, Clone)]
pub struct CapturedConsole {
    lines: Vec<String>,
}

impl CapturedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Whether any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }
}

impl Console for CapturedConsole {
    fn line(&mut self, line: String) {
        self.lines.push(line);
    }
}
