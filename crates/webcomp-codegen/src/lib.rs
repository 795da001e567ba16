//! Custom element code generation.
//!
//! This crate turns a parsed component document into one JavaScript module
//! that defines and registers a custom element. The style block is folded
//! into the template, the template becomes the body of a `render(data)`
//! method, and the script's class is spliced with the lifecycle wiring.

pub mod context;
pub mod error;
pub mod resolve;
pub mod script;
pub mod style;
pub mod template;

use std::path::Path;

pub use context::{CompileContext, Diagnostic, Severity};
pub use error::CompileError;
pub use resolve::{resolve_content, resolve_reference, FileSystem, MemoryFileSystem, StdFileSystem};
pub use template::{build_import_line, build_render_body, AttachTarget, TemplateOutput};

/// Options for compiling a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Treat SCSS and TypeScript failures as fatal instead of degrading.
    pub strict: bool,
}

/// Result of compiling a document.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// The emitted JavaScript module, without a trailing newline.
    pub code: String,
    /// Warnings and degraded failures.
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileOutput {
    /// Check if any stage degraded.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }
}

/// Compile a component document whose text is `source`.
///
/// `path` locates the document; external references are resolved against
/// its directory and read through `fs`.
pub fn compile_document(
    path: &Path,
    source: &str,
    fs: &dyn FileSystem,
    options: &CompileOptions,
) -> Result<CompileOutput, CompileError> {
    let _span = tracing::info_span!("compile", path = %path.display()).entered();

    let doc = webcomp_parser::parse_document(source)
        .map_err(|e| CompileError::document(path, source, e))?;
    let mut ctx = CompileContext::new(path, fs, options);

    if !doc.script.selector.contains('-') {
        ctx.warn(
            "invalid-selector",
            format!(
                "selector `{}` has no hyphen; browsers only register custom element names that contain one",
                doc.script.selector
            ),
        );
    }

    let style_block = style::build_styles(&mut ctx, &doc)?;
    let template = template::build_template(&mut ctx, &doc, &style_block)?;
    let code = script::build_script(&mut ctx, &doc, &template)?;

    Ok(CompileOutput {
        code,
        diagnostics: ctx.diagnostics,
    })
}

/// Read and compile the document at `path` from disk.
pub fn compile_file(path: &Path, options: &CompileOptions) -> Result<CompileOutput, CompileError> {
    let fs = StdFileSystem;
    let source = fs
        .read_to_string(path)
        .map_err(|source| CompileError::UnreadableDocument {
            path: path.to_path_buf(),
            source,
        })?;
    compile_document(path, &source, &fs, options)
}

/// Read and compile the document at `path` with default options.
pub fn compile_one(path: &Path) -> Result<String, CompileError> {
    compile_file(path, &CompileOptions::default()).map(|output| output.code)
}
