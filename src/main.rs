use anyhow::Result;
use clap::Parser;
use dotflip::cli::{AppContext, Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Diagnostics go to stderr, controlled by RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        dry_run: cli.dry_run,
    };

    match cli.command {
        Commands::List(args) => dotflip::list_run(args, &ctx),
        Commands::Toggle(args) => dotflip::toggle_run(args, &ctx),
        Commands::Watch(args) => dotflip::infra::watch_run(args, &ctx),
        Commands::Init(args) => dotflip::infra::config_init(args, &ctx),
        Commands::Completions(args) => dotflip::completion::run(args),
    }
}
