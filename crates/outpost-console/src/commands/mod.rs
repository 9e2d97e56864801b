use clap::Subcommand;
use color_eyre::eyre;
use outpost_client::OutputKind;

use crate::connection::Connection;

mod deposit;
mod input;
mod inspect;
mod notice;
mod outputs;
mod voucher;

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// List and fetch outputs of the connected application
    Outputs(outputs::Command),
    /// Execute vouchers through the connected wallet
    Voucher(voucher::Command),
    /// Validate notices against the target chain
    Notice(notice::Command),
    /// Send inputs to the application
    Input(input::Command),
    /// Deposit assets through the portals
    Deposit(deposit::Command),
    /// Query the inspect endpoint
    Inspect(inspect::Command),
}

impl Command {
    pub(crate) async fn run(self) -> eyre::Result<()> {
        match self {
            Self::Outputs(outputs) => outputs.run().await,
            Self::Voucher(voucher) => voucher.run().await,
            Self::Notice(notice) => notice.run().await,
            Self::Input(input) => input.run().await,
            Self::Deposit(deposit) => deposit.run().await,
            Self::Inspect(inspect) => inspect.run().await,
        }
    }
}

/// The chain to operate on and where to find its registry entry.
#[derive(Clone, Debug, clap::Args)]
pub(crate) struct ChainArgs {
    /// The chain identifier to operate on, e.g. `0x7a69`
    #[arg(long = "chain-id", env = "OUTPOST_CHAIN_ID")]
    pub(crate) chain_id: String,

    /// Path to the chain registry document
    #[arg(long, env = "OUTPOST_REGISTRY_PATH", default_value = "chains.json")]
    pub(crate) registry: String,
}

/// The full connection coordinates: chain plus application.
#[derive(Clone, Debug, clap::Args)]
pub(crate) struct ConnectionArgs {
    #[command(flatten)]
    pub(crate) chain: ChainArgs,

    /// The address of the application whose outputs are inspected
    #[arg(long, env = "OUTPOST_APPLICATION")]
    pub(crate) application: String,
}

impl ConnectionArgs {
    pub(crate) fn open(&self) -> eyre::Result<Connection> {
        Connection::open(&self.chain.registry, &self.chain.chain_id, &self.application)
    }
}

/// An output kind as selected on the command line.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum KindArg {
    Notice,
    Voucher,
    DelegateCallVoucher,
    Report,
}

impl From<KindArg> for OutputKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Notice => Self::Notice,
            KindArg::Voucher => Self::Voucher,
            KindArg::DelegateCallVoucher => Self::DelegateCallVoucher,
            KindArg::Report => Self::Report,
        }
    }
}

/// Decodes an operator-supplied payload: raw hex when `hex` is set, UTF-8
/// text otherwise.
pub(crate) fn payload_bytes(payload: &str, hex_input: bool) -> eyre::Result<Vec<u8>> {
    use color_eyre::eyre::WrapErr as _;
    if hex_input {
        let stripped = payload.strip_prefix("0x").unwrap_or(payload);
        hex::decode(stripped).wrap_err("failed decoding the payload from hex")
    } else {
        Ok(payload.as_bytes().to_vec())
    }
}
