//! CLI argument parsing.

use camino::Utf8PathBuf;
use canvas_transform::FallbackMode;
use clap::{Parser, ValueEnum};

/// Turn canvas animation components into standalone HTML and JavaScript.
#[derive(Debug, Parser)]
#[command(name = "standalone-canvas")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Component or markup files, or directories to search
    pub inputs: Vec<Utf8PathBuf>,

    /// Read one input from standard input
    #[arg(long)]
    pub stdin: bool,

    /// Convert the bundled ribbon sample component
    #[arg(long)]
    pub sample: bool,

    /// Write generated files here instead of printing them
    #[arg(long = "out-dir")]
    pub out_dir: Option<Utf8PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    pub output: OutputFormat,

    /// What to generate when the input has no class
    #[arg(long, value_enum)]
    pub fallback: Option<FallbackArg>,

    /// Let `?bg=` and `?transparent=` override the background at runtime
    #[arg(long = "url-overrides")]
    pub url_overrides: bool,

    /// Show where each field value came from
    #[arg(long)]
    pub explain: bool,

    /// Glob patterns to ignore
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Path to a JSON config file (default: ./standalone-canvas.json)
    #[arg(long)]
    pub config: Option<Utf8PathBuf>,

    /// Log extraction details
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output
    Json,
    /// Machine-readable (one line per input)
    Machine,
}

/// Fallback selection.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum FallbackArg {
    /// Empty update and draw
    Inert,
    /// A generated ribbon animation
    Synthesized,
}

impl From<FallbackArg> for FallbackMode {
    fn from(arg: FallbackArg) -> Self {
        match arg {
            FallbackArg::Inert => FallbackMode::Inert,
            FallbackArg::Synthesized => FallbackMode::Synthesized,
        }
    }
}

impl Args {
    /// Default log directive when the environment does not set one.
    pub fn log_directive(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }
}
