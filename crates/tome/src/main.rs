mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries results
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let overrides = cli.overrides;

    match cli.command {
        Commands::Init { force } => commands::init::run(force),
        Commands::Estimate { file } => commands::estimate::run(&file, &overrides),
        Commands::Chunk {
            file,
            max_tokens,
            json,
        } => commands::chunk::run(&file, max_tokens, json, &overrides),
        Commands::Summarize(args) => commands::summarize::run(&args, &overrides).await,
        Commands::Analyze { source, kind } => {
            commands::analyze::run(&source, &kind, &overrides).await
        }
        Commands::History { stats, limit } => commands::history::run(stats, limit),
        Commands::Version => commands::version::run(),
    }
}
