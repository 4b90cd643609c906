//! Output rendering for the chat transcript and streamed replies.
//!
//! This module provides the renderer trait and a plain-text implementation that writes
//! to stdout with optional ANSI styling.

use std::io::{self, Stdout, Write};

use crate::types::{Message, Role};

/// ANSI escape code for dim text.
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text.
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (assistant label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (user label).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (errors).
const ANSI_RED: &str = "\x1b[31m";

/// Label printed above user messages.
pub const USER_LABEL: &str = "You";

/// Label printed above assistant messages.
pub const ASSISTANT_LABEL: &str = "Assistant";

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - Capturing output in tests
pub trait Renderer: Send {
    /// Called once before the first fragment of a reply.
    fn start_response(&mut self) {}

    /// Print a chunk of response text.
    ///
    /// This is called incrementally as fragments are streamed from the API, and must
    /// make the text visible before returning.
    fn print_text(&mut self, text: &str);

    /// Called when a reply completes.
    ///
    /// Used to ensure proper newlines and cleanup after streaming.
    fn finish_response(&mut self);

    /// Print the reply synthesized for a failed turn.
    fn print_failed_reply(&mut self, reply: &str);

    /// Print a stored transcript message as a chat bubble.
    fn print_message(&mut self, message: &Message);

    /// Print an error message that is not part of the transcript.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    line_start: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            line_start: true,
        }
    }

    /// Returns true if ANSI styling is enabled.
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn write(&mut self, text: &str) {
        let _ = self.stdout.write_all(text.as_bytes());
        if let Some(last) = text.chars().last() {
            self.line_start = last == '\n';
        }
        self.flush();
    }

    fn end_line(&mut self) {
        if !self.line_start {
            self.write("\n");
        }
    }

    fn label(&mut self, label: &str, color: &str) {
        self.end_line();
        let line = if self.use_color {
            format!("{ANSI_BOLD}{color}{label}:{ANSI_RESET}\n")
        } else {
            format!("{label}:\n")
        };
        self.write(&line);
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn start_response(&mut self) {
        self.label(ASSISTANT_LABEL, ANSI_CYAN);
    }

    fn print_text(&mut self, text: &str) {
        self.write(text);
    }

    fn finish_response(&mut self) {
        self.end_line();
        self.write("\n");
    }

    fn print_failed_reply(&mut self, reply: &str) {
        self.end_line();
        if self.use_color {
            self.write(&format!("{ANSI_RED}{reply}{ANSI_RESET}\n"));
        } else {
            self.write(&format!("{reply}\n"));
        }
    }

    fn print_message(&mut self, message: &Message) {
        match message.role {
            Role::User => self.label(USER_LABEL, ANSI_GREEN),
            Role::Assistant => self.label(ASSISTANT_LABEL, ANSI_CYAN),
            Role::System => return,
        }
        self.write(&message.content);
        self.end_line();
        self.write("\n");
    }

    fn print_error(&mut self, error: &str) {
        self.end_line();
        if self.use_color {
            eprintln!("{ANSI_RED}Error: {error}{ANSI_RESET}");
        } else {
            eprintln!("Error: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        self.end_line();
        if self.use_color {
            self.write(&format!("{ANSI_DIM}{info}{ANSI_RESET}\n"));
        } else {
            self.write(&format!("{info}\n"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color());
    }

    #[test]
    fn renderer_without_color() {
        let renderer = PlainTextRenderer::with_color(false);
        assert!(!renderer.use_color());
    }

    #[test]
    fn line_start_tracks_last_write() {
        let mut renderer = PlainTextRenderer::with_color(false);
        renderer.print_text("partial");
        assert!(!renderer.line_start);
        renderer.finish_response();
        assert!(renderer.line_start);
    }
}
