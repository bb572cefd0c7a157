//! Error message formatting with actionable suggestions.

use std::error::Error;

use depwise_core::error::DepwiseError;

use super::Palette;

/// Error formatter with suggestions
pub struct ErrorFormatter {
    palette: Palette,
}

impl ErrorFormatter {
    pub fn new() -> Self {
        Self {
            palette: Palette::detect(),
        }
    }

    pub fn with_palette(palette: Palette) -> Self {
        Self { palette }
    }

    /// Message, suggestion and cause chain
    pub fn format_error(&self, error: &DepwiseError) -> String {
        let mut output = format!("{}: {}\n", self.palette.red("error"), error);

        if let Some(suggestion) = error.suggestion() {
            output.push_str(&format!("{}: {}\n", self.palette.dim("help"), suggestion));
        }

        let mut source = error.source();
        while let Some(cause) = source {
            output.push_str(&format!("{}: {}\n", self.palette.dim("caused by"), cause));
            source = cause.source();
        }

        output
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}
