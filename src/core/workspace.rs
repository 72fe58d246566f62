//! Workspace facade: one owned bundle of configuration, cycle table, file
//! index and toggle engine.
//!
//! This is the command surface external consumers integrate against. The
//! index map lives here (injected into nothing, reachable from nowhere
//! else), configuration changes go through the explicit `reconfigure`, and
//! a successful toggle feeds straight back into the index so readers see
//! the new value without a full rescan.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::cycles::CycleTable;
use crate::core::index::{FileIndex, FsEvent, IndexChange};
use crate::core::parse::ParsedFile;
use crate::core::toggle::{ToggleEngine, ToggleOutcome};
use crate::infra::config::Config;
use crate::infra::vcs::{GitIgnoreStatus, IgnoreStatus};
use crate::infra::walk::FileWalker;

pub struct Workspace {
    root: PathBuf,
    config: Config,
    index: FileIndex,
    engine: ToggleEngine,
}

impl Workspace {
    /// Open a workspace rooted at `root` with the given configuration.
    /// The index starts empty; call `refresh_all` to populate it.
    pub fn open(root: impl Into<PathBuf>, config: Config) -> Result<Self> {
        let root = root.into();
        let vcs: Box<dyn IgnoreStatus + Send> = Box::new(GitIgnoreStatus::open(&root));
        Self::open_with_vcs(root, config, vcs)
    }

    /// Variant with an injected version-control collaborator (tests, hosts
    /// with their own ignore detection).
    pub fn open_with_vcs(
        root: impl Into<PathBuf>,
        config: Config,
        vcs: Box<dyn IgnoreStatus + Send>,
    ) -> Result<Self> {
        let root = root.into();
        let walker = FileWalker::new(&config.files, &config.ignore_patterns)?;
        let table = config.cycle_table();
        let index = FileIndex::new(root.clone(), walker, table.clone());
        let engine =
            ToggleEngine::new(table, vcs).with_confirm_unignored(config.confirm_unignored);

        Ok(Self {
            root,
            config,
            index,
            engine,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Full rescan; one `Rebuilt` notification.
    pub fn refresh_all(&mut self) {
        self.index.refresh_all();
    }

    /// All indexed files in deterministic (walk) order.
    pub fn parsed_files(&self) -> impl Iterator<Item = &ParsedFile> {
        self.index.files()
    }

    pub fn parsed_file(&self, path: &Path) -> Option<&ParsedFile> {
        self.index.get(path)
    }

    pub fn on_change(&mut self, subscriber: impl Fn(&IndexChange) + Send + 'static) {
        self.index.on_change(subscriber);
    }

    /// Feed one filesystem event into the index.
    pub fn apply_event(&mut self, event: FsEvent) {
        self.index.apply_event(event);
    }

    /// Interactive toggle: `confirm` decides the gitignore challenge.
    /// On success the index entry for the file is refreshed, so subsequent
    /// reads observe the new value without a full rescan.
    pub fn toggle(
        &mut self,
        path: &Path,
        line: usize,
        confirm: &mut dyn FnMut(&Path) -> bool,
    ) -> ToggleOutcome {
        let outcome = self.engine.toggle(path, line, confirm);
        if outcome.is_applied() {
            self.index.apply_event(FsEvent::Changed(path.to_path_buf()));
        }
        outcome
    }

    /// Silent variant: same state machine, auto-accepted challenge.
    pub fn toggle_silently(&mut self, path: &Path, line: usize) -> ToggleOutcome {
        self.toggle(path, line, &mut |_| true)
    }

    /// Replace the configuration and rebuild all derived state: walker,
    /// cycle table (index and engine copies) and the index contents.
    pub fn reconfigure(&mut self, config: Config) -> Result<()> {
        let walker = FileWalker::new(&config.files, &config.ignore_patterns)?;
        let table: CycleTable = config.cycle_table();

        self.index.set_walker(walker);
        self.index.set_table(table.clone());
        self.engine.set_table(table);
        self.config = config;

        self.refresh_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::core::cycles::CycleGroup;
    use crate::infra::vcs::NoChallenge;

    fn workspace(root: &Path) -> Workspace {
        Workspace::open_with_vcs(root, Config::default(), Box::new(NoChallenge)).unwrap()
    }

    #[test]
    fn test_toggle_refreshes_index_without_full_rescan() {
        let dir = TempDir::new().unwrap();
        let env = dir.path().join(".env");
        fs::write(&env, "DEBUG=true\n").unwrap();

        let mut ws = workspace(dir.path());
        ws.refresh_all();
        assert_eq!(ws.parsed_file(&env).unwrap().entries[0].value, "true");

        let outcome = ws.toggle_silently(&env, 0);
        assert!(outcome.is_applied());

        // No refresh_all in between: the per-path update must be enough.
        assert_eq!(ws.parsed_file(&env).unwrap().entries[0].value, "false");
    }

    #[test]
    fn test_rejected_toggle_leaves_index_untouched() {
        let dir = TempDir::new().unwrap();
        let env = dir.path().join(".env");
        fs::write(&env, "DEBUG=true\n# note\n").unwrap();

        let mut ws = workspace(dir.path());
        ws.refresh_all();

        let outcome = ws.toggle_silently(&env, 1);
        assert!(!outcome.is_applied());
        assert_eq!(ws.parsed_file(&env).unwrap().entries[0].value, "true");
    }

    #[test]
    fn test_reconfigure_rebuilds_derived_state() {
        let dir = TempDir::new().unwrap();
        let env = dir.path().join(".env");
        fs::write(&env, "MODE=hot\n").unwrap();

        let mut ws = workspace(dir.path());
        ws.refresh_all();
        assert!(!ws.parsed_file(&env).unwrap().entries[0].toggleable);

        let mut config = Config::default();
        config.cycles = vec![CycleGroup::new(["hot", "cold"])];
        ws.reconfigure(config).unwrap();

        let entry = &ws.parsed_file(&env).unwrap().entries[0];
        assert!(entry.toggleable);

        // And the engine follows the new table too.
        assert!(ws.toggle_silently(&env, 0).is_applied());
        assert_eq!(fs::read_to_string(&env).unwrap(), "MODE=cold\n");
    }

    #[test]
    fn test_parsed_files_iterates_walk_order() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".env"), "A=1\n").unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("b/.env"), "B=2\n").unwrap();

        let mut ws = workspace(dir.path());
        ws.refresh_all();

        let names: Vec<_> = ws.parsed_files().map(|f| f.display_path.clone()).collect();
        assert_eq!(names, vec![".env".to_string(), "b/.env".to_string()]);
    }
}
