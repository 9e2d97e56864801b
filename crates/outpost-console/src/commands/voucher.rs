use clap::Subcommand;
use color_eyre::eyre::{
    self,
    bail,
    WrapErr as _,
};
use ethers::signers::LocalWallet;
use outpost_client::OutputKind;

use super::ConnectionArgs;
use crate::controller::{
    ActionAvailability,
    ControllerState,
    VOUCHER_EXECUTED_MESSAGE,
};

#[derive(Debug, clap::Args)]
pub(crate) struct Command {
    #[command(subcommand)]
    command: SubCommand,
}

impl Command {
    pub(crate) async fn run(self) -> eyre::Result<()> {
        match self.command {
            SubCommand::Execute(execute) => execute.run().await,
        }
    }
}

#[derive(Debug, Subcommand)]
enum SubCommand {
    /// Execute one voucher on the target chain
    Execute(Execute),
}

#[derive(Debug, clap::Args)]
struct Execute {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// The output index of the voucher to execute
    #[arg(long)]
    index: u64,

    /// Execute a delegate-call voucher instead of a plain voucher
    #[arg(long)]
    delegate_call: bool,

    /// The hex-encoded private key of the executing account
    #[arg(long, env = "OUTPOST_PRIVATE_KEY")]
    private_key: String,
}

impl Execute {
    async fn run(self) -> eyre::Result<()> {
        let wallet: LocalWallet = self
            .private_key
            .parse()
            .wrap_err("failed parsing the private key")?;
        let connection = self.connection.open()?;
        let kind = if self.delegate_call {
            OutputKind::DelegateCallVoucher
        } else {
            OutputKind::Voucher
        };

        let mut controller = connection.controller(kind);
        controller.reload().await;
        if let ControllerState::Error {
            message,
        } = controller.state()
        {
            bail!("{message}");
        }
        controller.select(self.index).await;

        match controller.action_availability() {
            ActionAvailability::AlreadyExecuted => {
                println!("voucher {} was already executed", self.index);
                Ok(())
            }
            ActionAvailability::NoProofYet => bail!("no proof yet"),
            ActionAvailability::Execute => {
                controller.execute(wallet).await;
                match controller.message() {
                    Some(message) if message == VOUCHER_EXECUTED_MESSAGE => {
                        println!("{message}");
                        Ok(())
                    }
                    Some(message) => bail!("{message}"),
                    None => bail!("execution produced no result"),
                }
            }
            ActionAvailability::Validate | ActionAvailability::Unavailable => {
                match controller.message() {
                    Some(message) => bail!("{message}"),
                    None => bail!("no {kind} with index {}", self.index),
                }
            }
        }
    }
}
