use clap::Subcommand;
use color_eyre::eyre::{
    self,
    bail,
};
use ethers::types::Address;
use outpost_client::{
    Output,
    OutputFilter,
    OutputKind,
};

use super::{
    ConnectionArgs,
    KindArg,
};
use crate::controller::{
    ControllerState,
    OutputKindDescriptor,
    OutputRow,
};

#[derive(Debug, clap::Args)]
pub(crate) struct Command {
    #[command(subcommand)]
    command: SubCommand,
}

impl Command {
    pub(crate) async fn run(self) -> eyre::Result<()> {
        match self.command {
            SubCommand::List(list) => list.run().await,
            SubCommand::Get(get) => get.run().await,
        }
    }
}

#[derive(Debug, Subcommand)]
enum SubCommand {
    /// List outputs, most recent first
    List(List),
    /// Fetch a single output with its proof and execution state
    Get(Get),
}

#[derive(Debug, clap::Args)]
struct List {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Restrict the listing to one output kind; all kinds when omitted
    #[arg(long)]
    kind: Option<KindArg>,

    /// Maximum number of outputs to print
    #[arg(long)]
    limit: Option<usize>,

    /// Number of ordered outputs to skip
    #[arg(long)]
    offset: Option<usize>,

    /// Only outputs from this epoch
    #[arg(long)]
    epoch: Option<u64>,

    /// Only outputs caused by this input
    #[arg(long)]
    input: Option<u64>,

    /// Only vouchers calling this destination
    #[arg(long)]
    destination: Option<Address>,

    /// Only outputs of this kind in the combined listing
    #[arg(long, conflicts_with = "kind")]
    output_type: Option<KindArg>,
}

impl List {
    async fn run(self) -> eyre::Result<()> {
        let connection = self.connection.open()?;
        let filter = OutputFilter {
            limit: self.limit,
            offset: self.offset,
            epoch_index: self.epoch,
            input_index: self.input,
            output_type: self.output_type.map(OutputKind::from),
            voucher_address: self.destination,
        };

        match self.kind {
            Some(kind) => {
                let mut controller = connection.controller(kind.into());
                controller.set_filter(filter);
                controller.reload().await;
                match controller.state() {
                    ControllerState::Ready {
                        rows, ..
                    } => {
                        if rows.is_empty() {
                            println!("no outputs");
                        }
                        for row in rows {
                            print_row(OutputKind::from(kind), row);
                        }
                        Ok(())
                    }
                    ControllerState::Error {
                        message,
                    } => bail!("{message}"),
                    ControllerState::Idle | ControllerState::Fetching => {
                        bail!("listing did not complete")
                    }
                }
            }
            None => {
                let repository = connection.repository()?;
                let outputs = repository.list_all(&filter).await?;
                if outputs.is_empty() {
                    println!("no outputs");
                }
                for output in &outputs {
                    let descriptor = OutputKindDescriptor::for_kind(output.kind());
                    print_output(output, &descriptor);
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, clap::Args)]
struct Get {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// The kind of the output to fetch
    #[arg(long)]
    kind: KindArg,

    /// The output index within its kind
    #[arg(long)]
    index: u64,
}

impl Get {
    async fn run(self) -> eyre::Result<()> {
        let connection = self.connection.open()?;
        let repository = connection.repository()?;
        let kind = OutputKind::from(self.kind);
        let Some(output) = repository.get(kind, self.index).await? else {
            bail!("no {kind} with index {}", self.index);
        };
        let descriptor = OutputKindDescriptor::for_kind(kind);

        println!("kind:        {kind}");
        println!("index:       {}", output.index());
        if let Some(input) = output.input() {
            println!("input id:    {}", input.id);
        }
        if let Some(destination) = output.destination() {
            println!("destination: {destination:?}");
        }
        if let Some(value) = output.value() {
            println!("value:       {}", ethers::utils::format_ether(value));
        }
        println!("payload:     {}", (descriptor.decode)(output.payload()));
        if descriptor.proof_required {
            match output.proof() {
                Some(proof) if proof.is_ready() => println!(
                    "proof:       ready ({} siblings)",
                    proof.output_hashes_siblings.len()
                ),
                _ => println!("proof:       no proof yet"),
            }
        }
        if let Some(executed) = output.executed() {
            println!("executed:    {executed}");
        }
        Ok(())
    }
}

fn print_row(kind: OutputKind, row: &OutputRow) {
    let input_id = row.input_id.as_deref().unwrap_or("-");
    match (row.destination, row.value) {
        (Some(destination), Some(value)) => println!(
            "{:>6}  {:<22}  input {:<6}  {:?}  {:>8}  {}",
            row.index,
            kind.to_string(),
            input_id,
            destination,
            ethers::utils::format_ether(value),
            row.summary,
        ),
        (Some(destination), None) => println!(
            "{:>6}  {:<22}  input {:<6}  {:?}  {}",
            row.index,
            kind.to_string(),
            input_id,
            destination,
            row.summary,
        ),
        _ => println!(
            "{:>6}  {:<22}  input {:<6}  {}",
            row.index,
            kind.to_string(),
            input_id,
            row.summary,
        ),
    }
}

fn print_output(output: &Output, descriptor: &OutputKindDescriptor) {
    let row = OutputRow {
        index: output.index(),
        input_id: output.input().map(|input| input.id.clone()),
        summary: (descriptor.decode)(output.payload()),
        destination: output.destination(),
        value: output.value(),
    };
    print_row(output.kind(), &row);
}
