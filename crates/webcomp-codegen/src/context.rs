//! Per-document compile context.

use crate::resolve::FileSystem;
use crate::CompileOptions;
use std::fmt;
use std::path::Path;

/// State shared by the stages while one document compiles.
pub struct CompileContext<'a> {
    /// Path of the document being compiled.
    pub path: &'a Path,
    /// Where external references are read from.
    pub fs: &'a dyn FileSystem,
    pub options: &'a CompileOptions,
    /// Non-fatal problems, in the order they were found.
    pub diagnostics: Vec<Diagnostic>,
}

impl<'a> CompileContext<'a> {
    pub fn new(path: &'a Path, fs: &'a dyn FileSystem, options: &'a CompileOptions) -> Self {
        Self {
            path,
            fs,
            options,
            diagnostics: Vec::new(),
        }
    }

    /// The directory external references are resolved against.
    pub fn base_dir(&self) -> &'a Path {
        self.path.parent().unwrap_or(Path::new(""))
    }

    /// Log and record a warning.
    pub fn warn(&mut self, code: &'static str, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(path = %self.path.display(), code, "{message}");
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            code,
            message,
        });
    }

    /// Log and record a failure the pipeline recovered from.
    pub fn error(&mut self, code: &'static str, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(path = %self.path.display(), code, "{message}");
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            code,
            message,
        });
    }
}

impl fmt::Debug for CompileContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileContext")
            .field("path", &self.path)
            .field("options", &self.options)
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

/// A non-fatal problem found while compiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// A stable machine-readable code.
    pub code: &'static str,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// A degraded failure: output was produced without part of the input.
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}
