//! Orchestrator for batch and watch compilation.

use crate::config::Config;
use crate::output;
use miette::{miette, IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};
use std::time::Instant;
use webcomp_codegen::{compile_file, CompileOptions, Severity};

/// Result of a compile run.
#[derive(Debug, Default)]
pub struct BuildResult {
    /// Number of components written.
    pub compiled: usize,
    /// Number of components that failed.
    pub failed: usize,
    /// Number of warnings across all components.
    pub warning_count: usize,
    /// Number of degraded failures across all components.
    pub error_count: usize,
    /// Time taken.
    pub duration_ms: u64,
}

/// Counts for one successfully compiled component.
#[derive(Debug, Default, Clone, Copy)]
struct FileReport {
    warnings: usize,
    errors: usize,
}

/// Orchestrator for running webcomp.
pub struct Orchestrator {
    config: Config,
    options: CompileOptions,
}

impl Orchestrator {
    pub fn new(config: Config) -> Self {
        let options = CompileOptions {
            strict: config.strict,
        };
        Self { config, options }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compile every component under the input path, one at a time.
    pub fn run_once(&self) -> Result<BuildResult> {
        let start = Instant::now();
        let files = self.find_components()?;
        tracing::debug!(count = files.len(), "found components");

        let mut result = BuildResult::default();
        for file in &files {
            match self.compile_one(file) {
                Ok(report) => {
                    result.compiled += 1;
                    result.warning_count += report.warnings;
                    result.error_count += report.errors;
                }
                Err(e) => {
                    tracing::error!("{e:?}");
                    result.failed += 1;
                }
            }
        }
        result.duration_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            compiled = result.compiled,
            failed = result.failed,
            warnings = result.warning_count,
            degraded = result.error_count,
            "finished in {}ms",
            result.duration_ms
        );
        Ok(result)
    }

    /// Run once, then recompile on every change event until the watcher
    /// shuts down.
    pub fn run_watch_mode(&self) -> Result<()> {
        use notify::{Config as NotifyConfig, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
        use std::sync::mpsc::channel;

        self.run_once()?;

        let (tx, rx) = channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| {
                if let Ok(event) = res {
                    let _ = tx.send(event);
                }
            },
            NotifyConfig::default(),
        )
        .into_diagnostic()?;
        watcher
            .watch(&self.config.input, RecursiveMode::Recursive)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to watch {}", self.config.input.display()))?;
        tracing::info!(path = %self.config.input.display(), "watching for changes");

        for event in rx {
            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                continue;
            }
            for changed in &event.paths {
                let Some(component) = self.component_for(changed) else {
                    continue;
                };
                tracing::info!(path = %component.display(), "change detected, recompiling");
                if let Err(e) = self.compile_one(&component) {
                    tracing::error!("{e:?}");
                }
            }
        }
        Ok(())
    }

    /// Find all components under the input path, in sorted order.
    pub fn find_components(&self) -> Result<Vec<PathBuf>> {
        let input = &self.config.input;
        if input.is_file() {
            return Ok(vec![input.clone()]);
        }
        if !input.is_dir() {
            return Err(miette!("Input {} does not exist", input.display()));
        }

        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(input)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            if self.config.is_component(path) && !self.config.is_ignored(path) {
                files.push(path.to_path_buf());
            }
        }
        Ok(files)
    }

    /// The component to recompile when `changed` changes: the component
    /// itself, or `x.wc` for a side file such as `x.wc.scss`.
    pub fn component_for(&self, changed: &Path) -> Option<PathBuf> {
        if self.config.is_ignored(changed) {
            return None;
        }
        if self.config.is_component(changed) {
            return Some(changed.to_path_buf());
        }
        let stem = changed.file_stem()?;
        let component = changed.with_file_name(stem);
        (self.config.is_component(&component) && component.is_file()).then_some(component)
    }

    /// Compile a single component and write its module.
    fn compile_one(&self, path: &Path) -> Result<FileReport> {
        let compiled = compile_file(path, &self.options)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to compile {}", path.display()))?;

        let report = compiled
            .diagnostics
            .iter()
            .fold(FileReport::default(), |mut report, d| {
                match d.severity {
                    Severity::Warning => report.warnings += 1,
                    Severity::Error => report.errors += 1,
                }
                report
            });

        let target = output::output_path(&self.config.input, self.config.out.as_deref(), path);
        output::write_output(&target, &compiled.code)?;
        Ok(report)
    }
}
