use clap::Subcommand;
use color_eyre::eyre::{
    self,
    WrapErr as _,
};
use ethers::signers::LocalWallet;

use super::{
    payload_bytes,
    ConnectionArgs,
};

#[derive(Debug, clap::Args)]
pub(crate) struct Command {
    #[command(subcommand)]
    command: SubCommand,
}

impl Command {
    pub(crate) async fn run(self) -> eyre::Result<()> {
        match self.command {
            SubCommand::Send(send) => send.run().await,
            SubCommand::SendL2(send) => send.run().await,
        }
    }
}

#[derive(Debug, Subcommand)]
enum SubCommand {
    /// Add an input directly on-chain through the input box
    Send(Send),
    /// Submit an input through the sequencer endpoint
    #[command(name = "send-l2")]
    SendL2(SendL2),
}

#[derive(Debug, clap::Args)]
struct Send {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// The input payload, UTF-8 text by default
    payload: String,

    /// Interpret the payload as raw hex
    #[arg(long)]
    hex: bool,

    /// The hex-encoded private key of the sending account
    #[arg(long, env = "OUTPOST_PRIVATE_KEY")]
    private_key: String,
}

impl Send {
    async fn run(self) -> eyre::Result<()> {
        let wallet: LocalWallet = self
            .private_key
            .parse()
            .wrap_err("failed parsing the private key")?;
        let payload = payload_bytes(&self.payload, self.hex)?;
        let connection = self.connection.open()?;
        let sender = connection.input_sender()?;

        let receipt = sender.add_input(wallet, payload).await?;
        println!("Input added!");
        println!("Transaction hash: {:?}", receipt.transaction_hash);
        if let Some(block_number) = receipt.block_number {
            println!("Included in block: {block_number}");
        }
        Ok(())
    }
}

#[derive(Debug, clap::Args)]
struct SendL2 {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// The input payload, UTF-8 text by default
    payload: String,

    /// Interpret the payload as raw hex
    #[arg(long)]
    hex: bool,

    /// The maximum gas price the sequencer may charge
    #[arg(long, default_value_t = 10)]
    max_gas_price: u128,

    /// The hex-encoded private key of the sending account
    #[arg(long, env = "OUTPOST_PRIVATE_KEY")]
    private_key: String,
}

impl SendL2 {
    async fn run(self) -> eyre::Result<()> {
        let wallet: LocalWallet = self
            .private_key
            .parse()
            .wrap_err("failed parsing the private key")?;
        let payload = payload_bytes(&self.payload, self.hex)?;
        let connection = self.connection.open()?;
        let client = connection.sequencer_client()?;

        let response = client
            .submit_input(&wallet, connection.application(), payload, self.max_gas_price)
            .await?;
        println!("Input id: {}", response.id);
        Ok(())
    }
}
