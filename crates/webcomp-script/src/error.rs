//! Error types for script processing.

use webcomp_span::{LineCol, LineIndex};

/// Result type for script processing.
pub type ScriptResult<T> = Result<T, ScriptError>;

/// A 1-indexed position used in script error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub col: u32,
}

impl Position {
    /// Compute the display position of a byte offset in `source`.
    pub fn of(source: &str, offset: usize) -> Self {
        Self::from(LineIndex::new(source).line_col(offset as u32))
    }
}

impl From<LineCol> for Position {
    fn from(lc: LineCol) -> Self {
        let (line, col) = lc.to_display();
        Self { line, col }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Errors raised while tokenizing, parsing or transpiling a script.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("unterminated {what} starting at {at}")]
    Unterminated { what: &'static str, at: Position },

    #[error("unbalanced `{delim}` at {at}")]
    Unbalanced { delim: String, at: Position },

    #[error("unsupported TypeScript syntax `{construct}` at {at}")]
    Unsupported { construct: String, at: Position },

    #[error("TypeScript syntax error at {at}: {message}")]
    InvalidTypeScript { message: String, at: Position },

    #[error("type erasure produced invalid JavaScript at {at}: {message}")]
    InvalidOutput { message: String, at: Position },
}

impl ScriptError {
    /// A stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ScriptError::Unterminated { .. } => "unterminated-token",
            ScriptError::Unbalanced { .. } => "unbalanced-delimiter",
            ScriptError::Unsupported { .. } => "unsupported-syntax",
            ScriptError::InvalidTypeScript { .. } => "invalid-typescript",
            ScriptError::InvalidOutput { .. } => "invalid-output",
        }
    }
}
