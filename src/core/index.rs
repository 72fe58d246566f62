//! In-memory index of parsed dotfiles with event-driven updates.
//!
//! The map is owned by one `FileIndex` value and only ever replaced or
//! updated here; consumers receive references or freshly produced values.
//! `refresh_all` builds a complete replacement map before swapping it in,
//! so no reader observes a half-rebuilt index. Per-path events re-parse
//! from current content, which makes bursts of events for the same path
//! collapse to the last observed state regardless of arrival jitter.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::core::cycles::CycleTable;
use crate::core::parse::{self, ParsedFile};
use crate::infra::io;
use crate::infra::walk::FileWalker;

/// Discrete filesystem notification delivered to the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsEvent {
    Created(PathBuf),
    Changed(PathBuf),
    Deleted(PathBuf),
}

impl FsEvent {
    pub fn path(&self) -> &Path {
        match self {
            Self::Created(p) | Self::Changed(p) | Self::Deleted(p) => p,
        }
    }
}

/// What a change notification refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexChange {
    /// The whole map was rebuilt by `refresh_all`.
    Rebuilt,
    /// One file was re-parsed and replaced.
    Updated(PathBuf),
    /// One file left the index.
    Removed(PathBuf),
}

type Subscriber = Box<dyn Fn(&IndexChange) + Send>;

/// Map from canonical file path to its most recent parse result.
pub struct FileIndex {
    root: PathBuf,
    walker: FileWalker,
    table: CycleTable,
    files: IndexMap<PathBuf, ParsedFile>,
    subscribers: Vec<Subscriber>,
}

impl FileIndex {
    pub fn new(root: PathBuf, walker: FileWalker, table: CycleTable) -> Self {
        Self {
            root: canonical(&root),
            walker,
            table,
            files: IndexMap::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Register a change subscriber. Subscribers run synchronously after
    /// each applied change, in registration order.
    pub fn on_change(&mut self, subscriber: impl Fn(&IndexChange) + Send + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Rescan the configured locations end to end and replace the whole
    /// map. Files that fail to read are dropped, not fatal. Fires a single
    /// `Rebuilt` notification.
    pub fn refresh_all(&mut self) {
        let paths = self.walker.walk_files(&self.root);

        // Subscribers are not shareable across threads; hand the parallel
        // stage only the data it needs.
        let root = self.root.clone();
        let table = self.table.clone();
        let parsed: Vec<Option<(PathBuf, ParsedFile)>> = paths
            .par_iter()
            .map(|path| {
                let key = canonical(path);
                parse_one(&root, &table, &key).map(|pf| (key, pf))
            })
            .collect();

        // Build the replacement before touching the live map.
        let next: IndexMap<PathBuf, ParsedFile> = parsed.into_iter().flatten().collect();

        debug!(files = next.len(), "index rebuilt");
        self.files = next;
        self.notify(&IndexChange::Rebuilt);
    }

    /// Apply one filesystem event. Created and Changed both re-parse from
    /// current content; Deleted removes. One notification per affected path.
    pub fn apply_event(&mut self, event: FsEvent) {
        match event {
            FsEvent::Created(path) | FsEvent::Changed(path) => {
                let key = canonical(&path);
                match parse_one(&self.root, &self.table, &key) {
                    Some(pf) => {
                        self.files.insert(key.clone(), pf);
                        self.notify(&IndexChange::Updated(key));
                    }
                    // Unreadable now: whatever we believed about the file is
                    // stale, so it leaves the index.
                    None => {
                        if self.files.shift_remove(&key).is_some() {
                            self.notify(&IndexChange::Removed(key));
                        }
                    }
                }
            }
            FsEvent::Deleted(path) => {
                let key = canonical(&path);
                if self.files.shift_remove(&key).is_some() {
                    self.notify(&IndexChange::Removed(key));
                }
            }
        }
    }

    /// Swap the cycle table. The caller decides when to re-parse; pair with
    /// `refresh_all` to recompute all derived state.
    pub fn set_table(&mut self, table: CycleTable) {
        self.table = table;
    }

    pub fn set_walker(&mut self, walker: FileWalker) {
        self.walker = walker;
    }

    pub fn get(&self, path: &Path) -> Option<&ParsedFile> {
        self.files.get(&canonical(path))
    }

    pub fn files(&self) -> impl Iterator<Item = &ParsedFile> {
        self.files.values()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn notify(&self, change: &IndexChange) {
        for subscriber in &self.subscribers {
            subscriber(change);
        }
    }
}

/// Read and parse one file. IO failures drop the file with a warning
/// instead of poisoning the index or aborting a batch.
fn parse_one(root: &Path, table: &CycleTable, path: &Path) -> Option<ParsedFile> {
    match io::read_file(path) {
        Ok(text) => Some(ParsedFile::parse(
            path.to_path_buf(),
            parse::display_path(root, path),
            &text,
            table,
        )),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "dropping unreadable file from index");
            None
        }
    }
}

/// Stable key for the index: canonicalized where possible so watcher paths,
/// user-supplied paths and walked paths all agree. Deleted files are keyed
/// through their canonical parent so removal events still hit the map.
pub(crate) fn canonical(path: &Path) -> PathBuf {
    if let Ok(p) = dunce::canonicalize(path) {
        return p;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => dunce::canonicalize(parent)
            .map(|p| p.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}
