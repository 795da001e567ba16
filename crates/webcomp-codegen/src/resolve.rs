//! Section content resolution.
//!
//! A section either carries its content inline or points at a file through
//! `src`. References are resolved against the document's directory and
//! normalized lexically; symlinks are not followed.

use crate::error::CompileError;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// Read access to the files a document refers to.
pub trait FileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
}

/// The real disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

/// An in-memory file tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: BTreeMap<PathBuf, String>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, replacing any previous contents.
    pub fn insert(&mut self, path: impl AsRef<Path>, contents: impl Into<String>) {
        self.files.insert(path_clean::clean(path), contents.into());
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(&path_clean::clean(path))
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(&path_clean::clean(path))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let dir = path_clean::clean(path);
        self.files
            .keys()
            .any(|file| file != &dir && (dir == Path::new(".") || file.starts_with(&dir)))
    }
}

/// Resolve `reference` relative to the directory of `document`.
pub fn resolve_reference(document: &Path, reference: &str) -> PathBuf {
    let base = document.parent().unwrap_or(Path::new(""));
    path_clean::clean(base.join(reference))
}

/// The content of a section: the referenced file verbatim, or the inline
/// text trimmed.
pub fn resolve_content(
    fs: &dyn FileSystem,
    document: &Path,
    reference: Option<&str>,
    inline: &str,
) -> Result<String, CompileError> {
    let Some(reference) = reference else {
        return Ok(inline.trim().to_string());
    };
    let resolved = resolve_reference(document, reference);
    tracing::debug!(reference, resolved = %resolved.display(), "reading external section");
    fs.read_to_string(&resolved)
        .map_err(|source| CompileError::UnreadableReference {
            reference: reference.to_string(),
            resolved,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_resolve_reference() {
        assert_eq!(
            resolve_reference(Path::new("src/comp/card.wc"), "../shared/card.html"),
            PathBuf::from("src/shared/card.html")
        );
        assert_eq!(
            resolve_reference(Path::new("card.wc"), "./card.scss"),
            PathBuf::from("card.scss")
        );
    }

    #[test]
    fn test_inline_text_is_trimmed() {
        let fs = MemoryFileSystem::new();
        let content = resolve_content(&fs, Path::new("a.wc"), None, "\n  <p>hi</p>\n").unwrap();
        assert_eq!(content, "<p>hi</p>");
    }

    #[test]
    fn test_reference_matches_direct_read() {
        let dir = tempfile::tempdir().unwrap();
        let body = "  <p>kept verbatim</p>\n\n";
        fs::write(dir.path().join("card.html"), body).unwrap();

        let document = dir.path().join("card.wc");
        let content = resolve_content(&StdFileSystem, &document, Some("card.html"), "ignored").unwrap();
        assert_eq!(content, fs::read_to_string(dir.path().join("card.html")).unwrap());
    }

    #[test]
    fn test_unreadable_reference() {
        let fs = MemoryFileSystem::new();
        let err = resolve_content(&fs, Path::new("lib/a.wc"), Some("missing.css"), "").unwrap_err();
        assert_eq!(err.as_str(), "unreadable-reference");
        assert!(err.to_string().contains("missing.css"));
    }

    #[test]
    fn test_memory_file_system() {
        let fs = MemoryFileSystem::new().with_file("styles/_vars.scss", "$c: red;");
        assert!(fs.is_file(Path::new("styles/./_vars.scss")));
        assert!(fs.is_dir(Path::new("styles")));
        assert!(!fs.is_dir(Path::new("styles/_vars.scss")));
        assert!(!fs.is_file(Path::new("styles")));
    }
}
