//! Toggle orchestration: fresh re-parse, locate, validate, splice, persist.
//!
//! The engine never edits through cached parse results. Every request
//! re-reads the file and re-parses it immediately before computing the edit
//! span; a span taken from the index could predate an external rewrite and
//! corrupt unrelated text. The index is refreshed after the write, not
//! consulted before it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use dialoguer::Confirm;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::debug;

use crate::cli::{AppContext, ToggleArgs};
use crate::core::cycles::{self, CycleTable};
use crate::core::index::canonical;
use crate::core::parse;
use crate::infra::config::load_config;
use crate::infra::io;
use crate::infra::vcs::{GitIgnoreStatus, IgnoreStatus};

/// Result of one toggle request. Always freshly constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToggleOutcome {
    Applied { new_value: String },
    Rejected { reason: RejectReason },
}

impl ToggleOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Expected, reported rejection reasons; line numbers are 1-based for
/// display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    #[error("cancelled")]
    UserCancelled,

    #[error("no key/value entry at line {line}")]
    NoEntryAtLine { line: usize },

    #[error("value at line {line} matches no configured cycle")]
    NotToggleable { line: usize },

    #[error("could not read {path}: {message}")]
    Io { path: String, message: String },

    #[error("could not persist {path}: {message}")]
    PersistFailure { path: String, message: String },
}

/// Exit code mapping: 0 applied, 2 rejected (internal errors exit 1 via
/// the normal error path).
pub fn exit_code_for(outcome: &ToggleOutcome) -> i32 {
    if outcome.is_applied() { 0 } else { 2 }
}

/// Core toggle engine. Holds the cycle table, the version-control
/// collaborator and the per-session acknowledgement set.
pub struct ToggleEngine {
    table: CycleTable,
    vcs: Box<dyn IgnoreStatus + Send>,
    confirm_unignored: bool,
    dry_run: bool,
    acknowledged: HashSet<PathBuf>,
}

impl ToggleEngine {
    pub fn new(table: CycleTable, vcs: Box<dyn IgnoreStatus + Send>) -> Self {
        Self {
            table,
            vcs,
            confirm_unignored: true,
            dry_run: false,
            acknowledged: HashSet::new(),
        }
    }

    pub fn with_confirm_unignored(mut self, enabled: bool) -> Self {
        self.confirm_unignored = enabled;
        self
    }

    pub fn with_dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Swap the cycle table on reconfiguration.
    pub fn set_table(&mut self, table: CycleTable) {
        self.table = table;
    }

    /// Run one toggle request against `path` at 0-based `line`.
    ///
    /// `confirm` is consulted only when the file is not excluded from
    /// version control and has not been acknowledged this session; a
    /// declined confirmation is a clean no-op. The interactive and silent
    /// entry points differ only in the callback they wire in here.
    pub fn toggle(
        &mut self,
        path: &Path,
        line: usize,
        confirm: &mut dyn FnMut(&Path) -> bool,
    ) -> ToggleOutcome {
        let path = canonical(path);

        if self.confirm_unignored
            && !self.vcs.is_ignored(&path)
            && !self.acknowledged.contains(&path)
        {
            if !confirm(&path) {
                debug!(path = %path.display(), "toggle cancelled at gitignore challenge");
                return ToggleOutcome::Rejected {
                    reason: RejectReason::UserCancelled,
                };
            }
            self.acknowledged.insert(path.clone());
        }

        // Fresh read: cached spans are never trusted for a write.
        let content = match io::read_file(&path) {
            Ok(c) => c,
            Err(e) => {
                return ToggleOutcome::Rejected {
                    reason: RejectReason::Io {
                        path: path.display().to_string(),
                        message: format!("{e:#}"),
                    },
                };
            }
        };

        let entries = parse::parse_file(&content, &self.table);
        let Some(entry) = entries.iter().find(|e| e.line == line) else {
            return ToggleOutcome::Rejected {
                reason: RejectReason::NoEntryAtLine { line: line + 1 },
            };
        };

        let Some(cycle) = entry.cycle.as_ref() else {
            return ToggleOutcome::Rejected {
                reason: RejectReason::NotToggleable { line: line + 1 },
            };
        };

        // A missing membership here means match-time and resolve-time state
        // diverged; refuse rather than write a fabricated value.
        let Some(new_value) = cycles::next_value(&entry.value, cycle) else {
            return ToggleOutcome::Rejected {
                reason: RejectReason::NotToggleable { line: line + 1 },
            };
        };

        // Splice exactly [value_start, value_end) on the target line; every
        // other byte of the file passes through untouched.
        let style = io::detect_newline(&content);
        let mut lines = io::content_lines(&content);
        let Some(target) = lines.get_mut(entry.line) else {
            return ToggleOutcome::Rejected {
                reason: RejectReason::NoEntryAtLine { line: line + 1 },
            };
        };
        let mut edited = String::with_capacity(target.len() + new_value.len());
        edited.push_str(&target[..entry.value_start]);
        edited.push_str(&new_value);
        edited.push_str(&target[entry.value_end..]);
        *target = edited;

        if self.dry_run {
            return ToggleOutcome::Applied { new_value };
        }

        let updated = io::join_lines(&lines, style);
        if let Err(e) = io::write_atomic(&path, updated.as_bytes()) {
            return ToggleOutcome::Rejected {
                reason: RejectReason::PersistFailure {
                    path: path.display().to_string(),
                    message: format!("{e:#}"),
                },
            };
        }

        ToggleOutcome::Applied { new_value }
    }

    /// Silent variant: identical state machine, auto-accepted challenge.
    pub fn toggle_silently(&mut self, path: &Path, line: usize) -> ToggleOutcome {
        self.toggle(path, line, &mut |_| true)
    }
}

/// Parse a `FILE:LINE` target with a 1-based line number.
pub fn parse_target(target: &str) -> Result<(PathBuf, usize)> {
    let Some((path, line)) = target.rsplit_once(':') else {
        bail!("target must be FILE:LINE, got {target:?}");
    };
    let line: usize = line
        .parse()
        .with_context(|| format!("invalid line number in target {target:?}"))?;
    if line == 0 {
        bail!("line numbers are 1-based");
    }
    Ok((PathBuf::from(path), line - 1))
}

/// Walk upward from `start` looking for a `.git` marker.
/// Returns None when no repository encloses the path.
pub fn discover_repo_root(start: &Path) -> Option<PathBuf> {
    let mut cur = Some(start);
    while let Some(dir) = cur {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        cur = dir.parent();
    }
    None
}

/// Handler for `dflip toggle FILE:LINE`.
pub fn run(args: ToggleArgs, ctx: &AppContext) -> Result<()> {
    let (path, line) = parse_target(&args.target)?;
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let config = load_config(&cwd)?;

    let abs = if path.is_absolute() {
        path.clone()
    } else {
        cwd.join(&path)
    };
    let repo_root = abs
        .parent()
        .and_then(discover_repo_root)
        .unwrap_or_else(|| cwd.clone());

    let mut engine = ToggleEngine::new(
        config.cycle_table(),
        Box::new(GitIgnoreStatus::open(&repo_root)),
    )
    .with_confirm_unignored(config.confirm_unignored)
    .with_dry_run(ctx.dry_run);

    let assume_yes = args.yes || args.silent;
    let mut confirm = |file: &Path| {
        if assume_yes {
            return true;
        }
        Confirm::new()
            .with_prompt(format!(
                "{} is not excluded from version control; toggling edits a trackable file. Continue?",
                file.display()
            ))
            .default(false)
            .interact()
            .unwrap_or(false)
    };

    let outcome = engine.toggle(&abs, line, &mut confirm);

    if args.json {
        println!("{}", serde_json::to_string(&outcome)?);
    } else {
        match &outcome {
            ToggleOutcome::Applied { new_value } => {
                if !ctx.quiet && !args.silent {
                    let suffix = if ctx.dry_run { " (dry-run)" } else { "" };
                    println!(
                        "{}:{} {} {}{}",
                        path.display(),
                        line + 1,
                        "→".green(),
                        new_value,
                        suffix
                    );
                    // Show the resulting line so the edit is verifiable at a
                    // glance.
                    if let Ok(content) = io::read_file(&abs) {
                        if let Some(l) = io::content_lines(&content).get(line) {
                            println!("  {}", l.dimmed());
                        }
                    }
                }
            }
            ToggleOutcome::Rejected { reason } => {
                eprintln!("{} {}", "rejected:".red(), reason);
            }
        }
    }

    let code = exit_code_for(&outcome);
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
