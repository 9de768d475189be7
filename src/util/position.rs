use super::Position;
use std::fmt::{Display, Formatter};

impl Position {
    /// Create a new Position object based on the line and column number.
    pub fn new(line: usize, column: usize, index: usize) -> Self {
        Self {
            line,
            column,
            index,
        }
    }

    /// The position of the very first character of an input.
    pub fn start() -> Self {
        Self {
            line: 1,
            column: 1,
            index: 0,
        }
    }

    /// Advance the position over one character of input.
    pub fn step(&mut self, ch: char) {
        self.index += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::start()
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("")
            .field("line", &self.line)
            .field("column", &self.column)
            .finish()
    }
}
