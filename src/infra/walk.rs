//! Dotfile discovery walker.
//! - Matches files against the configured location globs (match-list)
//! - Extra ignore globs (early prune + late filter)
//! - Hidden files are always visible: the targets are dotfiles
//! - Does NOT consult .gitignore: `.env` files are routinely gitignored
//!   and must still be indexed
//! - Deterministic ordering for stable tests/CI
//!
//! Backed by ripgrep's `ignore` crate and `globset`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, WalkBuilder};

/// Walker returning the sorted set of files matching the location globs.
/// Extra ignore globs are applied in two places:
///   1) Early: prune directories during traversal (filter_entry).
///   2) Late: filter out files that still slipped through.
#[derive(Debug, Clone)]
pub struct FileWalker {
    /// Compiled set of file-location patterns (match-list)
    matchers: GlobSet,

    /// Compiled set of additional ignore patterns
    ignore_patterns: GlobSet,
}

impl FileWalker {
    /// Build a walker from location globs (e.g. "**/.env", "**/*.flags")
    /// and extra ignore globs (e.g. "**/node_modules/**"). Patterns match
    /// on root-relative paths.
    pub fn new(file_globs: &[String], extra_ignores: &[String]) -> Result<Self> {
        let mut matchers = GlobSetBuilder::new();
        for pattern in file_globs {
            matchers.add(Glob::new(pattern)?);
        }

        let mut ignores = GlobSetBuilder::new();
        for pattern in extra_ignores {
            ignores.add(Glob::new(pattern)?);
        }

        Ok(Self {
            matchers: matchers.build()?,
            ignore_patterns: ignores.build()?,
        })
    }

    /// Whether a single path (relative to `root`) belongs to the indexed
    /// set. Used by the watcher to filter raw filesystem events.
    pub fn matches(&self, root: &Path, path: &Path) -> bool {
        let rel = path.strip_prefix(root).unwrap_or(path);
        self.matchers.is_match(rel) && !self.ignore_patterns.is_match(rel)
    }

    /// Internal: construct a configured WalkBuilder for `root`.
    fn build_walk(&self, root: &Path) -> WalkBuilder {
        let mut b = WalkBuilder::new(root);

        // Dotfiles are the whole point; never treat hidden files specially.
        b.hidden(false);

        // Gitignored dotfiles must still be found.
        b.git_ignore(false);
        b.git_global(false);
        b.git_exclude(false);

        // Early directory pruning using extra ignores (fast short-circuit).
        let extra = self.ignore_patterns.clone();
        let root_owned = root.to_path_buf();
        b.filter_entry(move |ent: &DirEntry| {
            let is_dir = ent.file_type().map(|ft| ft.is_dir()).unwrap_or(false);

            if is_dir {
                let rel = ent.path().strip_prefix(&root_owned).unwrap_or(ent.path());
                if extra.is_match(rel) {
                    return false;
                }
            }
            true
        });

        b
    }

    /// Traverse files under `root`, keeping only glob matches.
    /// Returns a **sorted** list of file paths for determinism.
    pub fn walk_files<P: AsRef<Path>>(&self, root: P) -> Vec<PathBuf> {
        let root_path = root.as_ref();
        let walker = self.build_walk(root_path).build();

        let mut out: Vec<PathBuf> = walker
            // Drop entries with IO errors (could be collected/logged later)
            .filter_map(|res| res.ok())
            // Keep only regular files
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            // Convert to owned path
            .map(|entry| entry.into_path())
            // Location + ignore matching on the RELATIVE path
            .filter(|abs| self.matches(root_path, abs))
            .collect();

        // Deterministic order (stable CLI & tests)
        out.sort();

        out
    }
}
