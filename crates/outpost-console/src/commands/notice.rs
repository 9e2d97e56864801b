use clap::Subcommand;
use color_eyre::eyre::{
    self,
    bail,
};
use outpost_client::OutputKind;

use super::ConnectionArgs;
use crate::controller::{
    ActionAvailability,
    ControllerState,
    NOTICE_VALID_MESSAGE,
};

#[derive(Debug, clap::Args)]
pub(crate) struct Command {
    #[command(subcommand)]
    command: SubCommand,
}

impl Command {
    pub(crate) async fn run(self) -> eyre::Result<()> {
        match self.command {
            SubCommand::Validate(validate) => validate.run().await,
        }
    }
}

#[derive(Debug, Subcommand)]
enum SubCommand {
    /// Validate one notice against the target chain
    Validate(Validate),
}

#[derive(Debug, clap::Args)]
struct Validate {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// The output index of the notice to validate
    #[arg(long)]
    index: u64,
}

impl Validate {
    async fn run(self) -> eyre::Result<()> {
        let connection = self.connection.open()?;
        let mut controller = connection.controller(OutputKind::Notice);
        controller.reload().await;
        if let ControllerState::Error {
            message,
        } = controller.state()
        {
            bail!("{message}");
        }
        controller.select(self.index).await;

        match controller.action_availability() {
            ActionAvailability::NoProofYet => bail!("no proof yet"),
            ActionAvailability::Validate => {
                controller.validate().await;
                match controller.message() {
                    Some(message) if message == NOTICE_VALID_MESSAGE => {
                        println!("{message}");
                        Ok(())
                    }
                    Some(message) => bail!("{message}"),
                    None => bail!("validation produced no result"),
                }
            }
            _ => match controller.message() {
                Some(message) => bail!("{message}"),
                None => bail!("no notice with index {}", self.index),
            },
        }
    }
}
