//! Configuration loading and management.

use crate::cli::Args;
use globset::{Glob, GlobSet, GlobSetBuilder};
use miette::{miette, IntoDiagnostic, Result, WrapErr};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".webcomp.json";

/// Patterns that are always ignored during discovery.
const ALWAYS_IGNORED: &[&str] = &["**/node_modules/**"];

/// Contents of a `.webcomp.json` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    #[serde(rename = "in", alias = "i")]
    pub input: Option<PathBuf>,
    #[serde(alias = "o")]
    pub out: Option<PathBuf>,
    #[serde(alias = "w")]
    pub watch: Option<bool>,
    pub strict: Option<bool>,
    pub ignore: Vec<String>,
    /// Component file extensions, with or without the leading dot.
    pub extensions: Vec<String>,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&text)
            .into_diagnostic()
            .wrap_err_with(|| format!("Invalid config file {}", path.display()))
    }
}

/// Configuration for webcomp.
#[derive(Debug, Clone)]
pub struct Config {
    /// The component file or directory to compile.
    pub input: PathBuf,
    /// Output file or directory.
    pub out: Option<PathBuf>,
    pub watch: bool,
    pub strict: bool,
    /// Component file extensions, without the leading dot.
    pub extensions: Vec<String>,
    ignore: GlobSet,
}

impl Config {
    /// Load configuration from CLI arguments and the config file.
    pub fn load(cwd: &Path, args: &Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::read(&cwd.join(path))?,
            None => {
                let default = cwd.join(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    FileConfig::read(&default)?
                } else {
                    FileConfig::default()
                }
            }
        };
        Self::merge(cwd, args, file)
    }

    /// Combine CLI arguments with file values. Arguments win; the file only
    /// fills gaps.
    pub fn merge(cwd: &Path, args: &Args, file: FileConfig) -> Result<Self> {
        let input = args
            .input
            .clone()
            .or(file.input)
            .ok_or_else(|| miette!("No input given; pass --in <path> or set `in` in {DEFAULT_CONFIG_FILE}"))?;

        let extensions = if file.extensions.is_empty() {
            vec!["wc".to_string()]
        } else {
            file.extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_string())
                .collect()
        };

        let mut ignore_patterns: Vec<String> = ALWAYS_IGNORED.iter().map(|p| p.to_string()).collect();
        ignore_patterns.extend(file.ignore);
        ignore_patterns.extend(args.ignore.iter().cloned());

        let mut builder = GlobSetBuilder::new();
        for pattern in &ignore_patterns {
            let glob = Glob::new(pattern)
                .into_diagnostic()
                .wrap_err_with(|| format!("Invalid ignore pattern `{pattern}`"))?;
            builder.add(glob);
        }
        let ignore = builder.build().into_diagnostic()?;
        tracing::debug!(patterns = ?ignore_patterns, "ignore patterns");

        Ok(Self {
            input: cwd.join(input),
            out: args.out.clone().or(file.out).map(|out| cwd.join(out)),
            watch: args.watch || file.watch.unwrap_or(false),
            strict: args.strict || file.strict.unwrap_or(false),
            extensions,
            ignore,
        })
    }

    /// Check if a path matches an ignore pattern. Patterns are tried against
    /// the path as given and relative to the input directory, so both
    /// `**/drafts/**` and `drafts/**` work.
    pub fn is_ignored(&self, path: &Path) -> bool {
        self.ignore.is_match(path)
            || path
                .strip_prefix(&self.input)
                .is_ok_and(|relative| !relative.as_os_str().is_empty() && self.ignore.is_match(relative))
    }

    /// Check if a path has a component extension.
    pub fn is_component(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| self.extensions.iter().any(|e| ext.to_string_lossy() == e.as_str()))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    fn file(json: &str) -> FileConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_file_config_aliases() {
        let short = file(r#"{ "i": "src", "o": "dist", "w": true }"#);
        let long = file(r#"{ "in": "src", "out": "dist", "watch": true }"#);
        assert_eq!(short, long);
        assert_eq!(short.input, Some(PathBuf::from("src")));
    }

    #[test]
    fn test_cli_wins_over_file() {
        let args = Args::parse_from(["webcomp", "--in", "components"]);
        let config = Config::merge(
            Path::new("/work"),
            &args,
            file(r#"{ "in": "src", "out": "dist", "strict": true, "extensions": [".wc", "comp"] }"#),
        )
        .unwrap();
        assert_eq!(config.input, PathBuf::from("/work/components"));
        assert_eq!(config.out, Some(PathBuf::from("/work/dist")));
        assert!(config.strict);
        assert!(!config.watch);
        assert_eq!(config.extensions, vec!["wc", "comp"]);
    }

    #[test]
    fn test_missing_input() {
        let args = Args::parse_from(["webcomp"]);
        assert!(Config::merge(Path::new("/work"), &args, FileConfig::default()).is_err());
    }

    #[test]
    fn test_ignore_patterns() {
        let args = Args::parse_from(["webcomp", "--in", ".", "--ignore", "**/drafts/**"]);
        let config = Config::merge(Path::new("/work"), &args, file(r#"{ "ignore": ["**/*.skip.wc"] }"#)).unwrap();
        assert!(config.is_ignored(Path::new("/work/node_modules/pkg/a.wc")));
        assert!(config.is_ignored(Path::new("/work/drafts/a.wc")));
        assert!(config.is_ignored(Path::new("/work/src/a.skip.wc")));
        assert!(!config.is_ignored(Path::new("/work/src/a.wc")));
        assert!(config.is_component(Path::new("/work/src/a.wc")));
        assert!(!config.is_component(Path::new("/work/src/a.wc.css")));
    }

    #[test]
    fn test_relative_ignore_patterns() {
        let args = Args::parse_from(["webcomp", "--in", "src", "--ignore", "drafts/**"]);
        let config = Config::merge(Path::new("/work"), &args, file(r#"{ "ignore": ["*.skip.wc"] }"#)).unwrap();
        assert!(config.is_ignored(Path::new("/work/src/drafts/a.wc")));
        assert!(config.is_ignored(Path::new("/work/src/a.skip.wc")));
        assert!(!config.is_ignored(Path::new("/work/src/ui/drafts.wc")));
        assert!(!config.is_ignored(Path::new("/work/src/a.wc")));
        assert!(!config.is_ignored(Path::new("/work/src")));
    }

    #[test]
    fn test_load_reads_default_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), r#"{ "in": "src", "strict": true }"#).unwrap();
        let config = Config::load(dir.path(), &Args::default()).unwrap();
        assert_eq!(config.input, dir.path().join("src"));
        assert!(config.strict);
    }
}
