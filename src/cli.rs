use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub dry_run: bool,  // global --dry-run
}

#[derive(Parser)]
#[command(name = "dotflip")]
#[command(
    about = "A fast CLI that keeps a live index of shell-style dotfiles and flips KEY=VALUE flags through configured cycles"
)]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Show what would be done without writing files
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List parsed entries across all matching dotfiles
    List(ListArgs),

    /// Flip the value at FILE:LINE to the next member of its cycle
    Toggle(ToggleArgs),

    /// Watch the tree and keep the index live, reporting changes
    Watch(WatchArgs),

    /// Initialize a dotflip.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Parser)]
pub struct ListArgs {
    /// Root directory to scan
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Show only toggleable entries
    #[arg(long)]
    pub toggleable: bool,

    /// Emit one JSON object per file (single-line)
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct ToggleArgs {
    /// Target in FILE:LINE form (1-based line number)
    pub target: String,

    /// Skip the version-control confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Edit without prompting or printing the resulting line
    #[arg(long)]
    pub silent: bool,

    /// Emit the outcome as JSON (single-line)
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct WatchArgs {
    /// Root directory to watch
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}
