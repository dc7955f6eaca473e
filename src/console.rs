use crossterm::style::{Color, Stylize};

/// Colorizing text output with a process-wide enable switch.
///
/// When colors are disabled every paint call is the identity, so anything
/// rendered through a `Console` can be compared against plain text.
#[derive(Clone, Copy)]
pub struct Console {
    colors: bool,
}

impl Console {
    pub fn new(colors: bool) -> Self {
        Self { colors }
    }

    pub fn colors_enabled(&self) -> bool {
        self.colors
    }

    /// Wrap `text` in the ANSI codes for `color`, or return it unchanged.
    pub fn paint(&self, text: &str, color: Color) -> String {
        if self.colors {
            text.with(color).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn println(&self, text: &str) {
        println!("{text}");
    }

    /// Error-styled output on stderr.
    pub fn error(&self, text: &str) {
        eprintln!("{}", self.paint(text, Color::Red));
    }
}
