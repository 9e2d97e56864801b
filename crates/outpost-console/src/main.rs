use std::process::ExitCode;

use clap::Parser as _;
use color_eyre::eyre::{
    self,
    WrapErr as _,
};
use outpost_console::{
    cli::Cli,
    ConsoleConfig,
};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = run().await {
        eprintln!("{err:?}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run() -> eyre::Result<()> {
    color_eyre::install()?;

    let cfg: ConsoleConfig = outpost_config::get().wrap_err("failed to read configuration")?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(cfg.log))
        .with_writer(std::io::stderr)
        .init();

    Cli::parse().run().await
}
