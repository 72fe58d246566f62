//! `list` command: scan the tree and report parsed entries.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use crate::cli::{AppContext, ListArgs};
use crate::core::workspace::Workspace;
use crate::infra::config::load_config;

pub fn run(args: ListArgs, ctx: &AppContext) -> Result<()> {
    let root = dunce::canonicalize(&args.path)
        .with_context(|| format!("Failed to resolve path {}", args.path.display()))?;
    let config = load_config(&root)?;

    let mut ws = Workspace::open(root, config)?;
    ws.refresh_all();

    if args.json {
        for file in ws.parsed_files() {
            println!("{}", serde_json::to_string(file)?);
        }
        return Ok(());
    }

    let mut files = 0usize;
    let mut entries = 0usize;
    let mut toggleable = 0usize;

    for file in ws.parsed_files() {
        let shown: Vec<_> = if args.toggleable {
            file.toggleable_entries().collect()
        } else {
            file.entries.iter().collect()
        };
        if shown.is_empty() {
            continue;
        }

        files += 1;
        if ctx.no_color {
            println!("{}", file.display_path);
        } else {
            println!("{}", file.display_path.bold());
        }

        for entry in shown {
            entries += 1;
            let cycle = match &entry.cycle {
                Some(group) => {
                    toggleable += 1;
                    format!("  [{}]", group.values.join(" -> "))
                }
                None => String::new(),
            };
            let line = format!(
                "  {:>4}  {} = {}{}",
                entry.line + 1,
                entry.key,
                entry.value,
                cycle
            );
            if ctx.no_color || entry.toggleable {
                println!("{line}");
            } else {
                println!("{}", line.dimmed());
            }
        }
    }

    if !ctx.quiet {
        println!(
            "{} file(s), {} entr{}, {} toggleable",
            files,
            entries,
            if entries == 1 { "y" } else { "ies" },
            toggleable
        );
    }

    Ok(())
}
