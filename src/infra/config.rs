use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::{AppContext, InitArgs};
use crate::core::cycles::{CycleGroup, CycleTable};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Glob patterns of files to index, in match order
    pub files: Vec<String>,

    /// Ignore patterns pruned during discovery (in addition to defaults)
    pub ignore_patterns: Vec<String>,

    /// Ordered cycle groups; the first matching group wins
    pub cycles: Vec<CycleGroup>,

    /// Challenge toggles on files that version control does not ignore
    pub confirm_unignored: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            files: vec![
                "**/.env".to_string(),
                "**/.env.*".to_string(),
                "**/*.flags".to_string(),
                "**/.config".to_string(),
            ],
            ignore_patterns: vec![
                "**/.git/**".to_string(),
                "**/node_modules/**".to_string(),
                "**/target/**".to_string(),
                "**/dist/**".to_string(),
                "**/build/**".to_string(),
            ],
            // Matching is case-insensitive within a group, so one canonical
            // casing per concept is enough; replacements use these spellings.
            cycles: vec![
                CycleGroup::new(["true", "false"]),
                CycleGroup::new(["yes", "no"]),
                CycleGroup::new(["on", "off"]),
                CycleGroup::new(["enabled", "disabled"]),
                CycleGroup::new(["1", "0"]),
            ],
            confirm_unignored: true,
        }
    }
}

impl Config {
    /// Validated cycle table; unusable groups are dropped with a warning.
    pub fn cycle_table(&self) -> CycleTable {
        CycleTable::new(self.cycles.clone())
    }
}

/// Load configuration for a workspace root: `dotflip.toml` (or the hidden
/// variant) layered under `DOTFLIP_*` environment overrides, with serde
/// defaults filling everything else.
pub fn load_config(root: &Path) -> Result<Config> {
    let mut builder = config::Config::builder();

    let config_paths = ["dotflip.toml", ".dotflip.toml"];

    for name in &config_paths {
        let path = root.join(name);
        if path.exists() {
            builder = builder.add_source(config::File::from(path));
            break;
        }
    }

    builder = builder.add_source(config::Environment::with_prefix("DOTFLIP").separator("__"));

    let cfg = builder.build().context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(args: InitArgs, ctx: &AppContext) -> Result<()> {
    let config_path: PathBuf = args.path.join("dotflip.toml");

    if config_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}
