//! Version-control ignore status for the toggle challenge.
//!
//! The toggle engine only needs one answer per path: "does version control
//! ignore this file". Files that are tracked-able get a confirmation prompt
//! before their first edit in a session, because a toggled secret that lands
//! in a commit is worse than an extra question.

use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::debug;

/// Answers "is this path excluded from version control".
pub trait IgnoreStatus {
    fn is_ignored(&self, path: &Path) -> bool;
}

/// Gitignore-backed implementation rooted at a repository.
pub struct GitIgnoreStatus {
    root: PathBuf,
    matcher: Gitignore,
    in_repo: bool,
}

impl GitIgnoreStatus {
    /// Build a matcher from the repository's root `.gitignore` and
    /// `.git/info/exclude`. A root without `.git` is treated as "no
    /// repository": nothing can be committed, so every path counts as
    /// ignored and no challenge fires.
    pub fn open(root: &Path) -> Self {
        let in_repo = root.join(".git").exists();

        let mut builder = GitignoreBuilder::new(root);
        builder.add(root.join(".gitignore"));
        builder.add(root.join(".git/info/exclude"));
        let matcher = builder.build().unwrap_or_else(|e| {
            debug!(error = %e, "failed to build gitignore matcher; treating nothing as ignored");
            Gitignore::empty()
        });

        Self {
            root: root.to_path_buf(),
            matcher,
            in_repo,
        }
    }
}

impl IgnoreStatus for GitIgnoreStatus {
    fn is_ignored(&self, path: &Path) -> bool {
        if !self.in_repo {
            return true;
        }
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        self.matcher
            .matched_path_or_any_parents(rel, false)
            .is_ignore()
    }
}

/// Stub that reports every path as ignored; disables the challenge.
pub struct NoChallenge;

impl IgnoreStatus for NoChallenge {
    fn is_ignored(&self, _path: &Path) -> bool {
        true
    }
}
