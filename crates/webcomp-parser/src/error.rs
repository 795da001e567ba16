//! Error types for section extraction.

use crate::ast::SectionKind;
use std::fmt;
use webcomp_span::{LineCol, LineIndex, Span};

/// Result type for extraction.
pub type ParseResult<T> = Result<T, ParseError>;

/// A fatal problem with the shape of a component document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    /// The error message.
    pub message: String,
    /// Where in the document the problem is.
    pub span: Span,
    /// The error code.
    pub code: ErrorCode,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span, code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            span,
            code,
        }
    }

    /// A required section does not appear in the document.
    pub fn missing_section(kind: SectionKind, source_len: usize) -> Self {
        Self::new(
            format!("no {} section found", kind),
            Span::empty(source_len as u32),
            match kind {
                SectionKind::Script => ErrorCode::MissingScript,
                SectionKind::Template => ErrorCode::MissingTemplate,
                SectionKind::Style => ErrorCode::InvalidContent,
            },
        )
    }

    /// An opening tag with no closing tag after it.
    pub fn unclosed_section(kind: SectionKind, span: Span) -> Self {
        Self::new(
            format!("unclosed <{}> section", kind),
            span,
            ErrorCode::UnclosedSection,
        )
    }

    /// A required section with neither inline text nor a `src` attribute.
    pub fn empty_section(kind: SectionKind, span: Span) -> Self {
        Self::new(
            format!("the {} section is empty", kind),
            span,
            ErrorCode::EmptySection,
        )
    }

    /// The script tag has no `selector` attribute.
    pub fn missing_selector(span: Span) -> Self {
        Self::new(
            "selector not found; add a `selector` attribute to the script tag",
            span,
            ErrorCode::MissingSelector,
        )
    }

    /// Position of the error's start, for display.
    pub fn line_col(&self, source: &str) -> LineCol {
        LineIndex::new(source).line_col(self.span.start)
    }
}

/// Error codes for categorizing extraction errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// No `<script>` section.
    MissingScript,
    /// No `<template>` section.
    MissingTemplate,
    /// The script tag has no `selector`.
    MissingSelector,
    /// A section is opened but never closed.
    UnclosedSection,
    /// A required section has no content.
    EmptySection,
    /// Any other malformed content.
    InvalidContent,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingScript => "missing-script",
            ErrorCode::MissingTemplate => "missing-template",
            ErrorCode::MissingSelector => "missing-selector",
            ErrorCode::UnclosedSection => "unclosed-section",
            ErrorCode::EmptySection => "empty-section",
            ErrorCode::InvalidContent => "invalid-content",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
