//! Style stage: resolve, optionally compile SCSS, wrap in `<style>`.

use crate::context::CompileContext;
use crate::error::CompileError;
use crate::resolve::{resolve_content, FileSystem};
use grass::{Options, OutputStyle};
use std::fmt::Debug;
use std::io;
use std::path::{Path, PathBuf};
use webcomp_parser::{ComponentDocument, StyleLang};

/// Build the `<style>` block, or an empty string when the document has no
/// style section.
pub fn build_styles(ctx: &mut CompileContext<'_>, doc: &ComponentDocument) -> Result<String, CompileError> {
    let Some(style) = &doc.style else {
        return Ok(String::new());
    };
    tracing::info!(path = %ctx.path.display(), "building styles");

    let lang = match style.lang.as_deref() {
        None => StyleLang::default(),
        Some(tag) => StyleLang::parse(tag).unwrap_or_else(|| {
            ctx.warn("unknown-style-lang", format!("unknown style language `{tag}`, treating it as css"));
            StyleLang::Css
        }),
    };

    let content = resolve_content(
        ctx.fs,
        ctx.path,
        style.src.as_ref().map(|s| s.value.as_str()),
        &style.content,
    )?;

    let css = match lang {
        StyleLang::Css => content,
        StyleLang::Scss => match compile_scss(ctx.fs, &content, ctx.base_dir()) {
            Ok(css) => css,
            Err(message) if ctx.options.strict => return Err(CompileError::Style { message }),
            Err(message) => {
                ctx.error("style-failed", format!("SCSS compilation failed: {message}"));
                String::new()
            }
        },
    };

    Ok(wrap_style(&css))
}

/// Wrap CSS in a `<style>` element.
pub fn wrap_style(css: &str) -> String {
    format!("<style>\n{}\n</style>", css.trim_end())
}

/// Compile SCSS, resolving imports relative to `base_dir`.
pub fn compile_scss(fs: &dyn FileSystem, scss: &str, base_dir: &Path) -> Result<String, String> {
    let sass_fs = SassFs { fs };
    let load_paths = [if base_dir.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        base_dir.to_path_buf()
    }];
    let options = Options::default()
        .fs(&sass_fs)
        .load_paths(&load_paths[..])
        .style(OutputStyle::Expanded);
    grass::from_string(scss.to_string(), &options).map_err(|e| e.to_string())
}

/// Lets grass read `@use` and `@import` targets through a [`FileSystem`].
struct SassFs<'a> {
    fs: &'a dyn FileSystem,
}

impl Debug for SassFs<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SassFs").finish_non_exhaustive()
    }
}

impl grass::Fs for SassFs<'_> {
    fn is_dir(&self, path: &Path) -> bool {
        self.fs.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.fs.is_file(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.fs.read_to_string(path).map(String::into_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::MemoryFileSystem;
    use crate::CompileOptions;
    use pretty_assertions::assert_eq;

    fn styles(source: &str, fs: &MemoryFileSystem, strict: bool) -> (Result<String, CompileError>, usize) {
        let doc = webcomp_parser::parse(source).unwrap();
        let options = CompileOptions { strict };
        let mut ctx = CompileContext::new(Path::new("comp/card.wc"), fs, &options);
        let result = build_styles(&mut ctx, &doc);
        (result, ctx.diagnostics.len())
    }

    const SHELL: &str = "<template><p>x</p></template><script selector=\"x-a\">class A extends HTMLElement {}</script>";

    #[test]
    fn test_no_style_section() {
        let (result, _) = styles(SHELL, &MemoryFileSystem::new(), false);
        assert_eq!(result.unwrap(), "");
    }

    #[test]
    fn test_css_passes_through() {
        let source = format!("{SHELL}<style>\n  p {{ color: red; }}\n</style>");
        let (result, diagnostics) = styles(&source, &MemoryFileSystem::new(), false);
        assert_eq!(result.unwrap(), "<style>\np { color: red; }\n</style>");
        assert_eq!(diagnostics, 0);
    }

    #[test]
    fn test_scss_imports_relative_to_document() {
        let fs = MemoryFileSystem::new().with_file("comp/_vars.scss", "$accent: blue;");
        let source = format!("{SHELL}<style lang=\"scss\">@import 'vars';\np {{ a {{ color: $accent; }} }}</style>");
        let (result, _) = styles(&source, &fs, false);
        let block = result.unwrap();
        assert!(block.starts_with("<style>\n"));
        assert!(block.contains("p a {"));
        assert!(block.contains("color: blue;"));
        assert!(block.ends_with("\n</style>"));
    }

    #[test]
    fn test_scss_failure_is_degraded() {
        let source = format!("{SHELL}<style lang=\"scss\">p {{ color: $missing; }}</style>");
        let (result, diagnostics) = styles(&source, &MemoryFileSystem::new(), false);
        assert_eq!(result.unwrap(), "<style>\n\n</style>");
        assert_eq!(diagnostics, 1);
    }

    #[test]
    fn test_scss_failure_is_fatal_when_strict() {
        let source = format!("{SHELL}<style lang=\"scss\">p {{ color: $missing; }}</style>");
        let (result, _) = styles(&source, &MemoryFileSystem::new(), true);
        assert_eq!(result.unwrap_err().as_str(), "style-failed");
    }

    #[test]
    fn test_unknown_lang_warns() {
        let source = format!("{SHELL}<style lang=\"less\">p {{}}</style>");
        let (result, diagnostics) = styles(&source, &MemoryFileSystem::new(), false);
        assert_eq!(result.unwrap(), "<style>\np {}\n</style>");
        assert_eq!(diagnostics, 1);
    }
}
