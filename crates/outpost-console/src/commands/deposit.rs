use clap::Subcommand;
use color_eyre::eyre::{
    self,
    ensure,
    WrapErr as _,
};
use ethers::{
    signers::LocalWallet,
    types::{
        Address,
        TransactionReceipt,
        U256,
    },
};

use super::ConnectionArgs;

#[derive(Debug, clap::Args)]
pub(crate) struct Command {
    #[command(subcommand)]
    command: SubCommand,
}

impl Command {
    pub(crate) async fn run(self) -> eyre::Result<()> {
        match self.command {
            SubCommand::Ether(ether) => ether.run().await,
            SubCommand::Erc20(erc20) => erc20.run().await,
            SubCommand::Erc721(erc721) => erc721.run().await,
            SubCommand::Erc1155Single(deposit) => deposit.run().await,
            SubCommand::Erc1155Batch(deposit) => deposit.run().await,
        }
    }
}

#[derive(Debug, Subcommand)]
enum SubCommand {
    /// Deposit native assets through the ether portal
    Ether(Ether),
    /// Deposit ERC-20 tokens, approving the portal first if needed
    Erc20(Erc20),
    /// Deposit one ERC-721 token, approving the portal first if needed
    Erc721(Erc721),
    /// Deposit ERC-1155 tokens of one id
    #[command(name = "erc1155-single")]
    Erc1155Single(Erc1155Single),
    /// Deposit a batch of ERC-1155 token ids
    #[command(name = "erc1155-batch")]
    Erc1155Batch(Erc1155Batch),
}

#[derive(Clone, Debug, clap::Args)]
struct SignerArgs {
    /// The hex-encoded private key of the depositing account
    #[arg(long, env = "OUTPOST_PRIVATE_KEY")]
    private_key: String,
}

impl SignerArgs {
    fn wallet(&self) -> eyre::Result<LocalWallet> {
        self.private_key
            .parse()
            .wrap_err("failed parsing the private key")
    }
}

#[derive(Debug, clap::Args)]
struct Ether {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(flatten)]
    signer: SignerArgs,

    /// The amount of ether to deposit, in ether
    #[arg(long)]
    amount: String,
}

impl Ether {
    async fn run(self) -> eyre::Result<()> {
        let wallet = self.signer.wallet()?;
        let amount = parse_ether(&self.amount)?;
        let memo = format!("Deposited ({}) ether.", self.amount);
        let connection = self.connection.open()?;
        let sender = connection.input_sender()?;

        let receipt = sender
            .deposit_ether(wallet, amount, memo.into_bytes())
            .await?;
        report("Ether deposited!", &receipt);
        Ok(())
    }
}

#[derive(Debug, clap::Args)]
struct Erc20 {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(flatten)]
    signer: SignerArgs,

    /// The address of the token contract
    #[arg(long)]
    token: Address,

    /// The amount of tokens to deposit, in whole tokens (18 decimals)
    #[arg(long)]
    amount: String,
}

impl Erc20 {
    async fn run(self) -> eyre::Result<()> {
        let wallet = self.signer.wallet()?;
        let amount = parse_ether(&self.amount)?;
        let memo = format!(
            "Deposited ({}) of ERC20 ({:?}).",
            self.amount, self.token
        );
        let connection = self.connection.open()?;
        let sender = connection.input_sender()?;

        let receipt = sender
            .deposit_erc20(wallet, self.token, amount, memo.into_bytes())
            .await?;
        report("ERC20 deposited!", &receipt);
        Ok(())
    }
}

#[derive(Debug, clap::Args)]
struct Erc721 {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(flatten)]
    signer: SignerArgs,

    /// The address of the token contract
    #[arg(long)]
    token: Address,

    /// The id of the token to deposit
    #[arg(long)]
    id: u64,

    /// Base layer data forwarded with the deposit, raw hex
    #[arg(long, default_value = "0x")]
    base_layer_data: String,
}

impl Erc721 {
    async fn run(self) -> eyre::Result<()> {
        let wallet = self.signer.wallet()?;
        let memo = format!("Deposited ({}) of ERC721 ({:?}).", self.id, self.token);
        let base_layer_data = super::payload_bytes(&self.base_layer_data, true)?;
        let connection = self.connection.open()?;
        let sender = connection.input_sender()?;

        let receipt = sender
            .deposit_erc721(
                wallet,
                self.token,
                self.id.into(),
                base_layer_data,
                memo.into_bytes(),
            )
            .await?;
        report("ERC721 deposited!", &receipt);
        Ok(())
    }
}

#[derive(Debug, clap::Args)]
struct Erc1155Single {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(flatten)]
    signer: SignerArgs,

    /// The address of the token contract
    #[arg(long)]
    token: Address,

    /// The id of the token to deposit
    #[arg(long)]
    id: u64,

    /// The amount of tokens of that id to deposit
    #[arg(long)]
    amount: u64,
}

impl Erc1155Single {
    async fn run(self) -> eyre::Result<()> {
        let wallet = self.signer.wallet()?;
        let memo = format!(
            "Deposited ({}) tokens from id ({}) of ERC1155 ({:?}).",
            self.amount, self.id, self.token
        );
        let connection = self.connection.open()?;
        let sender = connection.input_sender()?;

        let receipt = sender
            .deposit_erc1155_single(
                wallet,
                self.token,
                self.id.into(),
                self.amount.into(),
                Vec::new(),
                memo.into_bytes(),
            )
            .await?;
        report("ERC1155 deposited!", &receipt);
        Ok(())
    }
}

#[derive(Debug, clap::Args)]
struct Erc1155Batch {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(flatten)]
    signer: SignerArgs,

    /// The address of the token contract
    #[arg(long)]
    token: Address,

    /// The token ids to deposit, comma separated
    #[arg(long, value_delimiter = ',')]
    ids: Vec<u64>,

    /// The amount per token id, comma separated, same length as `ids`
    #[arg(long, value_delimiter = ',')]
    amounts: Vec<u64>,
}

impl Erc1155Batch {
    async fn run(self) -> eyre::Result<()> {
        ensure!(
            self.ids.len() == self.amounts.len(),
            "`ids` and `amounts` must have the same length"
        );
        let wallet = self.signer.wallet()?;
        let memo = format!(
            "Deposited ({}) tokens from ids ({}) of ERC1155 ({:?}).",
            join(&self.amounts),
            join(&self.ids),
            self.token
        );
        let connection = self.connection.open()?;
        let sender = connection.input_sender()?;

        let receipt = sender
            .deposit_erc1155_batch(
                wallet,
                self.token,
                self.ids.into_iter().map(U256::from).collect(),
                self.amounts.into_iter().map(U256::from).collect(),
                Vec::new(),
                memo.into_bytes(),
            )
            .await?;
        report("ERC1155 batch deposited!", &receipt);
        Ok(())
    }
}

fn parse_ether(amount: &str) -> eyre::Result<U256> {
    ethers::utils::parse_ether(amount).wrap_err("failed parsing the amount")
}

fn join(values: &[u64]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn report(headline: &str, receipt: &TransactionReceipt) {
    println!("{headline}");
    println!("Transaction hash: {:?}", receipt.transaction_hash);
    if let Some(block_number) = receipt.block_number {
        println!("Included in block: {block_number}");
    }
}
