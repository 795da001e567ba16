//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;

/// Compile single-file components into standalone custom elements
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "webcomp")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Component file or directory of components to compile
    #[arg(short = 'i', long = "in", value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Output file (ending in .js, .mjs or .jsx) or output directory
    #[arg(short = 'o', long = "out", value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Recompile when a component or one of its side files changes
    #[arg(short, long)]
    pub watch: bool,

    /// Path to the config file (default: .webcomp.json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Fail instead of degrading when SCSS or TypeScript cannot be compiled
    #[arg(long)]
    pub strict: bool,

    /// Only log errors
    #[arg(long, conflicts_with = "verbose")]
    pub silent: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Ignore patterns (glob)
    #[arg(long)]
    pub ignore: Vec<String>,
}

impl Args {
    /// The log filter used when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &'static str {
        if self.silent {
            "webcomp=error"
        } else if self.verbose {
            "webcomp=debug"
        } else {
            "webcomp=info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_and_long_flags() {
        let args = Args::parse_from(["webcomp", "-i", "src", "--out", "dist", "-w", "--ignore", "**/drafts/**"]);
        assert_eq!(args.input, Some(PathBuf::from("src")));
        assert_eq!(args.out, Some(PathBuf::from("dist")));
        assert!(args.watch);
        assert_eq!(args.ignore, vec!["**/drafts/**"]);
        assert_eq!(args.log_filter(), "webcomp=info");
    }

    #[test]
    fn test_log_levels() {
        assert_eq!(Args::parse_from(["webcomp", "--silent"]).log_filter(), "webcomp=error");
        assert_eq!(Args::parse_from(["webcomp", "-v"]).log_filter(), "webcomp=debug");
        assert!(Args::try_parse_from(["webcomp", "--silent", "--verbose"]).is_err());
    }
}
