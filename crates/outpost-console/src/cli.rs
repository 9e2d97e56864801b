use clap::Parser;
use color_eyre::eyre;

use crate::commands::Command;

/// Inspection and transaction console for a rollup application: list and
/// decode outputs, fetch proofs, execute vouchers, validate notices, send
/// inputs, and deposit assets through the portals.
#[derive(Debug, Parser)]
#[command(name = "outpost", version)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    /// Runs the selected command to completion.
    ///
    /// # Errors
    /// Returns an error if the command fails; the error is rendered by
    /// main.
    pub async fn run(self) -> eyre::Result<()> {
        self.command.run().await
    }
}
