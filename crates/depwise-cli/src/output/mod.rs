//! Terminal output
//!
//! Messages go to stderr so stdout carries nothing but the report.

pub mod errors;

use std::env;
use std::io::{self, IsTerminal};

/// ANSI colouring that respects `NO_COLOR` and non-terminal stderr
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn detect() -> Self {
        Self {
            enabled: env::var_os("NO_COLOR").is_none() && io::stderr().is_terminal(),
        }
    }

    pub fn plain() -> Self {
        Self { enabled: false }
    }

    fn paint(&self, code: u8, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }

    pub fn red(&self, text: &str) -> String {
        self.paint(31, text)
    }

    pub fn green(&self, text: &str) -> String {
        self.paint(32, text)
    }

    pub fn yellow(&self, text: &str) -> String {
        self.paint(33, text)
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint(2, text)
    }
}

/// Output handler shared by all commands
#[derive(Debug, Clone, Copy)]
pub struct OutputHandler {
    palette: Palette,
}

impl OutputHandler {
    pub fn new() -> Self {
        Self {
            palette: Palette::detect(),
        }
    }

    /// Handler that never emits escape codes
    pub fn plain() -> Self {
        Self {
            palette: Palette::plain(),
        }
    }

    pub fn info(&self, message: &str) {
        eprintln!("{}", self.palette.dim(message));
    }

    pub fn success(&self, message: &str) {
        eprintln!("{} {}", self.palette.green("✓"), message);
    }

    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", self.palette.yellow("⚠"), message);
    }

    /// Write a document to stdout
    pub fn document(&self, content: &str) {
        println!("{}", content);
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}
