//! **dotflip** - Live index and in-place toggling of shell-style dotfiles
//!
//! Finds `.env`-style `KEY=VALUE` files across a project tree, parses every
//! line with byte-exact value spans, and flips values forward through
//! configured cycle groups (`true` → `false`, `on` → `off`, …). Writes are
//! always fresh read-modify-write with atomic persistence: cached positions
//! are never used to edit a file.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Core engine - parsing, cycle resolution, index and toggle orchestration
pub mod core {
    /// Cycle groups, table-ordered matching and successor computation
    pub mod cycles;
    pub use cycles::{CycleGroup, CycleTable, next_value};

    /// KEY=VALUE line/file parsing with exact value spans
    pub mod parse;
    pub use parse::{Entry, ParsedFile, parse_file, parse_line};

    /// Event-driven in-memory index of parsed files
    pub mod index;
    pub use index::{FileIndex, FsEvent, IndexChange};

    /// Toggle orchestration with the write-safety protocol
    pub mod toggle;
    pub use toggle::{RejectReason, ToggleEngine, ToggleOutcome, run as toggle_run};

    /// Entry listing and reporting
    pub mod list;
    pub use list::run as list_run;

    /// Owned facade bundling config, index and engine
    pub mod workspace;
    pub use workspace::Workspace;
}

/// Infrastructure - Configuration, IO, discovery and watching
pub mod infra {
    /// Configuration management with TOML support and env overrides
    pub mod config;
    pub use config::{Config, init as config_init, load_config};

    /// Newline-aware file IO and atomic writes
    pub mod io;

    /// Dotfile discovery over the configured location globs
    pub mod walk;
    pub use walk::FileWalker;

    /// Filesystem watching as discrete index events
    pub mod watch;
    pub use watch::run as watch_run;

    /// Version-control ignore status for the toggle challenge
    pub mod vcs;
    pub use vcs::{GitIgnoreStatus, IgnoreStatus};
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli, Commands};
pub use self::core::{Workspace, list_run, toggle_run};
pub use infra::{Config, FileWalker, load_config};

// Core types for external consumers
pub use self::core::{CycleGroup, CycleTable, Entry, FsEvent, ParsedFile, ToggleOutcome};
