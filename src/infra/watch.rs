//! Filesystem watching: raw `notify` events become discrete `FsEvent`
//! messages on a channel, consumed one at a time by the index owner.
//!
//! The watcher thread only classifies and forwards; all index mutation
//! happens on the single consuming side. That serialization is what keeps
//! re-parses of one path ordered — and since every re-parse reads current
//! content, even a reordered burst converges on the last on-disk state.

use std::path::Path;
use std::sync::mpsc::Sender;

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use owo_colors::OwoColorize;
use tracing::{debug, warn};

use crate::cli::{AppContext, WatchArgs};
use crate::core::index::FsEvent;
use crate::core::workspace::Workspace;
use crate::infra::config::load_config;
use crate::infra::walk::FileWalker;

/// Start a recursive watcher on `root`, forwarding matching paths as
/// `FsEvent`s. The returned watcher must be kept alive for the duration.
pub fn spawn_watcher(
    root: &Path,
    filter: FileWalker,
    tx: Sender<FsEvent>,
) -> Result<RecommendedWatcher> {
    let root_owned = root.to_path_buf();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "watch error");
                return;
            }
        };

        for path in event.paths {
            if !filter.matches(&root_owned, &path) {
                continue;
            }
            let message = match &event.kind {
                EventKind::Create(_) => FsEvent::Created(path),
                EventKind::Remove(_) => FsEvent::Deleted(path),
                // Renames arrive as Modify; a re-parse from current content
                // resolves either side correctly.
                EventKind::Modify(_) | EventKind::Any | EventKind::Other => {
                    FsEvent::Changed(path)
                }
                EventKind::Access(_) => continue,
            };
            debug!(event = ?message, "forwarding filesystem event");
            // A closed channel just means the consumer is gone.
            if tx.send(message).is_err() {
                return;
            }
        }
    })
    .context("Failed to create filesystem watcher")?;

    watcher
        .watch(root, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", root.display()))?;

    Ok(watcher)
}

/// Handler for `dflip watch [PATH]`: keep the index live and report every
/// change until interrupted.
pub fn run(args: WatchArgs, ctx: &AppContext) -> Result<()> {
    let root = dunce::canonicalize(&args.path)
        .with_context(|| format!("Failed to resolve path {}", args.path.display()))?;
    let config = load_config(&root)?;

    let filter = FileWalker::new(&config.files, &config.ignore_patterns)?;
    let mut ws = Workspace::open(root.clone(), config)?;
    ws.refresh_all();

    if !ctx.quiet {
        let toggleable: usize = ws.parsed_files().map(|f| f.toggleable.len()).sum();
        println!(
            "watching {} ({} file(s), {} toggleable)",
            root.display(),
            ws.parsed_files().count(),
            toggleable
        );
    }

    let (tx, rx) = std::sync::mpsc::channel();
    // Keep the watcher alive for the whole loop.
    let _watcher = spawn_watcher(&root, filter, tx)?;

    while let Ok(event) = rx.recv() {
        let path = event.path().to_path_buf();
        ws.apply_event(event);

        if ctx.quiet {
            continue;
        }
        match ws.parsed_file(&path) {
            Some(file) => {
                let line = format!(
                    "~ {}  {} entr{}, {} toggleable",
                    file.display_path,
                    file.entries.len(),
                    if file.entries.len() == 1 { "y" } else { "ies" },
                    file.toggleable.len()
                );
                if ctx.no_color {
                    println!("{line}");
                } else {
                    println!("{}", line.yellow());
                }
            }
            None => {
                let rel = path.strip_prefix(&root).unwrap_or(&path);
                let line = format!("- {} removed", rel.display());
                if ctx.no_color {
                    println!("{line}");
                } else {
                    println!("{}", line.red());
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_watcher_forwards_matching_events() -> Result<()> {
        let dir = TempDir::new()?;
        let root = dunce::canonicalize(dir.path())?;

        let filter = FileWalker::new(&["**/.env".to_string()], &[])?;
        let (tx, rx) = std::sync::mpsc::channel();
        let _watcher = spawn_watcher(&root, filter, tx)?;

        fs::write(root.join(".env"), "A=true\n")?;
        fs::write(root.join("ignored.txt"), "not a dotfile")?;

        // Platform backends differ on Create vs Modify granularity; any
        // event for the matching path is enough.
        let event = rx
            .recv_timeout(Duration::from_secs(10))
            .expect("expected an event for .env");
        assert_eq!(event.path().file_name().unwrap(), ".env");

        // The non-matching file must never come through.
        while let Ok(extra) = rx.recv_timeout(Duration::from_millis(200)) {
            assert_eq!(extra.path().file_name().unwrap(), ".env");
        }
        Ok(())
    }
}
