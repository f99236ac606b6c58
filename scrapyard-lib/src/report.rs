//! Per-file processing report.

use std::fmt::Write;

/// Progress lines and warnings collected while one file is processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileReport {
    file: String,
    lines: Vec<String>,
    warnings: Vec<String>,
}

impl FileReport {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Default::default()
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Record a recoverable problem.
    pub fn warn(&mut self, warning: impl Into<String>) {
        let warning = warning.into();
        log::debug!("{}: {}", self.file, warning);
        self.warnings.push(warning);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Multi-line text block: the file name, indented lines, then warnings.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.file);
        for line in &self.lines {
            let _ = writeln!(out, "     {}", line);
        }
        for warning in &self.warnings {
            let _ = writeln!(out, "     Warning: {}", warning);
        }
        out
    }
}
