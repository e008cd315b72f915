use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    hansard_mirror::logging::init().context("init logging")?;

    let cli = hansard_mirror::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        hansard_mirror::cli::Command::Fetch(args) => {
            hansard_mirror::run::run(args).await.context("fetch")?;
        }
        hansard_mirror::cli::Command::Parse(args) => {
            hansard_mirror::inspect::run(args).context("parse")?;
        }
        hansard_mirror::cli::Command::Bench(args) => {
            hansard_mirror::bench::run(args).context("bench")?;
        }
    }

    Ok(())
}
