//! End-to-end toggle scenarios over real temp trees: the full read → parse
//! → resolve → splice → persist → re-index path, no mocks.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use dotflip::core::cycles::CycleGroup;
use dotflip::core::workspace::Workspace;
use dotflip::infra::config::Config;
use dotflip::infra::vcs::NoChallenge;

fn open_workspace(root: &Path, config: Config) -> Workspace {
    Workspace::open_with_vcs(root, config, Box::new(NoChallenge)).unwrap()
}

#[test]
fn toggle_flips_value_and_leaves_rest_of_file_alone() {
    let dir = TempDir::new().unwrap();
    let env = dir.path().join(".env");
    fs::write(&env, "DEBUG=true\n# comment\nPORT=8080\n").unwrap();

    let mut ws = open_workspace(dir.path(), Config::default());
    ws.refresh_all();

    let outcome = ws.toggle_silently(&env, 0);
    assert!(outcome.is_applied(), "outcome: {outcome:?}");
    assert_eq!(
        fs::read_to_string(&env).unwrap(),
        "DEBUG=false\n# comment\nPORT=8080\n"
    );

    // PORT stays non-toggleable and untouched.
    let pf = ws.parsed_file(&env).unwrap();
    let port = pf.entry_at_line(2).unwrap();
    assert_eq!(port.key, "PORT");
    assert_eq!(port.value, "8080");
    assert!(!port.toggleable);
}

#[test]
fn toggle_on_comment_line_rejects_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let env = dir.path().join(".env");
    let original = "DEBUG=true\n# comment\nPORT=8080\n";
    fs::write(&env, original).unwrap();

    let mut ws = open_workspace(dir.path(), Config::default());
    ws.refresh_all();

    let outcome = ws.toggle_silently(&env, 1);
    assert!(!outcome.is_applied());
    assert_eq!(fs::read_to_string(&env).unwrap(), original);
}

#[test]
fn index_reflects_toggle_without_manual_refresh() {
    let dir = TempDir::new().unwrap();
    let env = dir.path().join(".env");
    fs::write(&env, "FEATURE=on\n").unwrap();

    let mut ws = open_workspace(dir.path(), Config::default());
    ws.refresh_all();
    assert_eq!(ws.parsed_file(&env).unwrap().entries[0].value, "on");

    assert!(ws.toggle_silently(&env, 0).is_applied());

    // No refresh_all here on purpose.
    let entry = &ws.parsed_file(&env).unwrap().entries[0];
    assert_eq!(entry.value, "off");
    assert!(entry.toggleable);
}

#[test]
fn repeated_toggles_walk_the_full_cycle() {
    let dir = TempDir::new().unwrap();
    let env = dir.path().join(".env");
    fs::write(&env, "LEVEL=low\n").unwrap();

    let mut config = Config::default();
    config.cycles = vec![CycleGroup::new(["low", "medium", "high"])];
    let mut ws = open_workspace(dir.path(), config);
    ws.refresh_all();

    for expected in ["medium", "high", "low", "medium"] {
        assert!(ws.toggle_silently(&env, 0).is_applied());
        assert_eq!(
            fs::read_to_string(&env).unwrap(),
            format!("LEVEL={expected}\n")
        );
    }
}

#[test]
fn quoted_values_keep_their_quotes_through_the_whole_path() {
    let dir = TempDir::new().unwrap();
    let env = dir.path().join(".env");
    fs::write(&env, "A=\"true\"\nB='YES'\nC=true\n").unwrap();

    let mut ws = open_workspace(dir.path(), Config::default());
    ws.refresh_all();

    assert!(ws.toggle_silently(&env, 0).is_applied());
    assert!(ws.toggle_silently(&env, 1).is_applied());
    assert!(ws.toggle_silently(&env, 2).is_applied());

    // 'YES' resolves case-insensitively and is replaced with the group's
    // canonical spelling, quotes intact.
    assert_eq!(
        fs::read_to_string(&env).unwrap(),
        "A=\"false\"\nB='no'\nC=false\n"
    );
}

#[test]
fn external_edit_between_index_and_toggle_cannot_corrupt() {
    let dir = TempDir::new().unwrap();
    let env = dir.path().join(".env");
    fs::write(&env, "PADDING=xxxxxxxxxxxxxxxx\nDEBUG=true\n").unwrap();

    let mut ws = open_workspace(dir.path(), Config::default());
    ws.refresh_all();

    // External tool rewrites the file after indexing: the value moves to a
    // different column and line content shifts.
    fs::write(&env, "DEBUG =   true\nPADDING=xxxxxxxxxxxxxxxx\n").unwrap();

    // The engine re-parses fresh, so the edit lands on the moved span.
    assert!(ws.toggle_silently(&env, 0).is_applied());
    assert_eq!(
        fs::read_to_string(&env).unwrap(),
        "DEBUG =   false\nPADDING=xxxxxxxxxxxxxxxx\n"
    );
}

#[test]
fn default_config_covers_env_flags_and_config_files() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".env"), "A=true\n").unwrap();
    fs::write(dir.path().join("feature.flags"), "NEW_UI=on\n").unwrap();
    fs::write(dir.path().join(".config"), "verbose=yes\n").unwrap();
    fs::write(dir.path().join("notes.txt"), "B=true\n").unwrap();

    let mut ws = open_workspace(dir.path(), Config::default());
    ws.refresh_all();

    let mut names: Vec<_> = ws.parsed_files().map(|f| f.display_path.clone()).collect();
    names.sort();
    assert_eq!(names, vec![".config", ".env", "feature.flags"]);

    let toggleable: usize = ws.parsed_files().map(|f| f.toggleable.len()).sum();
    assert_eq!(toggleable, 3);
}

#[test]
fn reconfigure_changes_what_is_toggleable() {
    let dir = TempDir::new().unwrap();
    let env = dir.path().join(".env");
    fs::write(&env, "STAGE=alpha\nDEBUG=true\n").unwrap();

    let mut ws = open_workspace(dir.path(), Config::default());
    ws.refresh_all();
    assert_eq!(ws.parsed_file(&env).unwrap().toggleable.len(), 1);

    let mut config = Config::default();
    config.cycles.push(CycleGroup::new(["alpha", "beta", "gamma"]));
    ws.reconfigure(config).unwrap();

    let pf = ws.parsed_file(&env).unwrap();
    assert_eq!(pf.toggleable.len(), 2);
    let stage = pf.entry_at_line(0).unwrap();
    assert_eq!(
        stage.cycle.as_ref().unwrap().values,
        vec!["alpha", "beta", "gamma"]
    );
}
