//! Output placement and writing.

use miette::{IntoDiagnostic, Result, WrapErr};
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions that make `--out` a file path rather than a directory.
const JS_EXTENSIONS: &[&str] = &["js", "mjs", "jsx"];

fn is_js_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| JS_EXTENSIONS.iter().any(|e| ext.to_string_lossy() == *e))
}

/// Where the module compiled from `file` is written.
///
/// An `out` ending in a JavaScript extension is used as is. Any other `out`
/// is a directory that mirrors `file`'s location under `input_root`. Without
/// `out`, the module is written next to `file`.
pub fn output_path(input_root: &Path, out: Option<&Path>, file: &Path) -> PathBuf {
    let name = match file.file_stem() {
        Some(stem) => format!("{}.js", stem.to_string_lossy()),
        None => "index.js".to_string(),
    };
    match out {
        Some(out) if is_js_file(out) => out.to_path_buf(),
        Some(dir) => {
            let relative = file
                .strip_prefix(input_root)
                .ok()
                .and_then(Path::parent)
                .unwrap_or(Path::new(""));
            dir.join(relative).join(name)
        }
        None => file.with_file_name(name),
    }
}

/// Write `code` to `path` with a trailing newline, creating parent
/// directories as needed.
pub fn write_output(path: &Path, code: &str) -> Result<()> {
    let mut text = code.to_string();
    if !text.ends_with('\n') {
        text.push('\n');
    }

    let result = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => fs::create_dir_all(parent).and_then(|()| fs::write(path, text)),
        None => fs::write(path, text),
    };
    match result {
        Ok(()) => {
            tracing::info!(path = %path.display(), "wrote component");
            Ok(())
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to write component");
            Err(e)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to write {}", path.display()))
        }
    }
}
