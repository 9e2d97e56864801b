use color_eyre::eyre::{
    self,
    WrapErr as _,
};
use outpost_config::ChainRegistry;
use outpost_decoder::decode_text_payload;

use super::ChainArgs;

#[derive(Debug, clap::Args)]
pub(crate) struct Command {
    #[command(flatten)]
    chain: ChainArgs,

    /// The inspect payload, UTF-8 text by default
    payload: String,

    /// Interpret the payload as raw hex encoding the text to send
    #[arg(long)]
    hex: bool,

    /// Send the payload as a POST body instead of a path segment
    #[arg(long)]
    post: bool,
}

impl Command {
    pub(crate) async fn run(self) -> eyre::Result<()> {
        let payload = if self.hex {
            let bytes = super::payload_bytes(&self.payload, true)?;
            String::from_utf8(bytes).wrap_err("hex payload does not decode to UTF-8 text")?
        } else {
            self.payload.clone()
        };

        let registry = ChainRegistry::from_path(&self.chain.registry)
            .wrap_err("failed loading the chain registry")?;
        let client = outpost_client::InspectClient::new(registry.inspect_url(&self.chain.chain_id)?);

        let response = if self.post {
            client.post(payload.into_bytes()).await?
        } else {
            client.get(&payload).await?
        };

        if let Some(metadata) = &response.metadata {
            println!("active epoch index:  {}", metadata.active_epoch_index);
            println!("current input index: {}", metadata.current_input_index);
        }
        if let Some(status) = &response.status {
            println!("status:              {status}");
        }
        if let Some(exception) = response.exception_payload_bytes()? {
            println!("exception:           {}", decode_text_payload(&exception));
        }
        if response.reports.is_empty() {
            println!("no reports");
        }
        for report in &response.reports {
            println!("{}", decode_text_payload(&report.payload_bytes()?));
        }
        Ok(())
    }
}
