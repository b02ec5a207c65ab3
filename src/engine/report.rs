// FILE: src/engine/report.rs
use std::fmt;

/// Human-readable result of one operation, printed by the binary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    lines: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.line("")
    }

    pub fn rule(&mut self, width: usize) -> &mut Self {
        self.line("-".repeat(width))
    }

    /// Append opaque tool output as-is, one entry per line.
    pub fn verbatim(&mut self, text: &str) -> &mut Self {
        for line in text.lines() {
            self.lines.push(line.to_string());
        }
        self
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
