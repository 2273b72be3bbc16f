use clap::{Args, Parser};
use std::path::PathBuf;

/// Help text for configuration file options, shown at the bottom of --help.
const CONFIG_HELP: &str = "\
CONFIGURATION FILE (.stdlift.toml):
  Create this file in your module root to set defaults.

  [stdlift]
  go_version = \"1.21\"         # Assumed when go.mod declares none
  include_tests = false       # Analyze _test.go files
  exclude_folders = [\"gen\"]   # On top of vendor, testdata, .git
  ignore = [\"STD003\", \"github.com/samber/lo.Keys\"]

SUPPRESSION:
  //nolint                    every rule on this line
  //nolint:stdlift            every stdlift rule on this line
  //nolint:STD001             one rule on this line
";

/// Options for output formatting and verbosity.
#[derive(Args, Debug, Default, Clone)]
pub struct OutputOptions {
    /// Output raw JSON.
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging (shows gated rules and failed rewrites).
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode: show only the summary.
    #[arg(long, conflicts_with = "json")]
    pub quiet: bool,
}

/// What to do with suggested fixes.
#[derive(Args, Debug, Default, Clone)]
pub struct FixOptions {
    /// Apply suggested fixes in place.
    #[arg(long, conflicts_with = "diff")]
    pub fix: bool,

    /// Print the fixed source of every changed file instead of writing it.
    #[arg(long)]
    pub diff: bool,
}

/// Command line arguments for stdlift.
///
/// This struct defines the arguments and flags accepted by the program.
#[derive(Parser, Debug)]
#[command(
    name = "stdlift",
    author,
    version,
    about = "stdlift - Find Go helpers the standard library now covers, and rewrite them",
    long_about = None,
    after_help = CONFIG_HELP
)]
pub struct Cli {
    /// Paths to analyze (files or directories).
    /// When no paths are provided, defaults to the current directory.
    pub paths: Vec<PathBuf>,

    /// Fix options (fix, diff).
    #[command(flatten)]
    pub fixes: FixOptions,

    /// Output formatting options.
    #[command(flatten)]
    pub output: OutputOptions,

    /// Go version to assume when go.mod declares none, and to use instead of
    /// the go.mod directive when given. Files with a `//go:build go1.N`
    /// constraint keep their own version.
    #[arg(long, value_name = "VERSION")]
    pub go_version: Option<String>,

    /// Folders to exclude from analysis.
    #[arg(long = "exclude-folder", alias = "exclude-folders")]
    pub exclude_folders: Vec<String>,

    /// Include `_test.go` files in analysis.
    #[arg(long)]
    pub include_tests: bool,

    /// Rule IDs, import paths or `path.Symbol` names to skip.
    #[arg(long)]
    pub ignore: Vec<String>,
}
