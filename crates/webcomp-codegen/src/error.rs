//! Compile errors.

use std::io;
use std::path::{Path, PathBuf};
use webcomp_parser::ParseError;
use webcomp_script::ScriptError;

/// A fatal compile failure. No output is produced for the document.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("{}:{line}:{col}: {source}", path.display())]
    Document {
        path: PathBuf,
        line: u32,
        col: u32,
        #[source]
        source: ParseError,
    },

    #[error("cannot read {}: {source}", path.display())]
    UnreadableDocument {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read `{reference}` (resolved to {}): {source}", resolved.display())]
    UnreadableReference {
        reference: String,
        resolved: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("class name not found; the script needs a `class <Name> extends ...` declaration")]
    ClassNameNotFound,

    #[error("TypeScript transpilation failed: {0}")]
    Transpile(#[source] ScriptError),

    #[error("SCSS compilation failed: {message}")]
    Style { message: String },

    #[error("cannot process script: {0}")]
    Script(#[from] ScriptError),
}

impl CompileError {
    /// Wrap an extraction error with its position in `source`.
    pub fn document(path: &Path, source: &str, error: ParseError) -> Self {
        let (line, col) = error.line_col(source).to_display();
        Self::Document {
            path: path.to_path_buf(),
            line,
            col,
            source: error,
        }
    }

    /// A stable machine-readable code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document { source, .. } => source.code.as_str(),
            Self::UnreadableDocument { .. } => "unreadable-document",
            Self::UnreadableReference { .. } => "unreadable-reference",
            Self::ClassNameNotFound => "class-name-not-found",
            Self::Transpile(_) => "transpile-failed",
            Self::Style { .. } => "style-failed",
            Self::Script(e) => e.code(),
        }
    }
}
