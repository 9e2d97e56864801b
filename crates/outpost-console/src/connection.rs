use std::sync::Arc;

use color_eyre::eyre::{
    self,
    WrapErr as _,
};
use ethers::{
    providers::{
        Http,
        Provider,
    },
    types::Address,
};
use outpost_client::{
    InspectClient,
    OutputKind,
    OutputRepository,
    SequencerClient,
};
use outpost_config::ChainRegistry;
use outpost_executor::{
    ExecutionEngine,
    InputSender,
    PortalContracts,
};

use crate::controller::{
    OutputKindDescriptor,
    OutputListController,
};

/// Owns everything derived from the connected (chain, application) pair:
/// the loaded registry entry and the clients built on it. One connection
/// per command invocation; nothing here is global.
pub(crate) struct Connection {
    chain_id: String,
    application: Address,
    registry: ChainRegistry,
}

impl Connection {
    /// Loads the registry and resolves the chain and application.
    ///
    /// # Errors
    /// Returns an error if the registry cannot be loaded, the chain is not
    /// configured, or the application address does not parse.
    pub(crate) fn open(
        registry_path: &str,
        chain_id: &str,
        application: &str,
    ) -> eyre::Result<Self> {
        let registry = ChainRegistry::from_path(registry_path)
            .wrap_err("failed loading the chain registry")?;
        registry
            .get(chain_id)
            .wrap_err("the requested chain is not configured")?;
        let application = application
            .parse::<Address>()
            .wrap_err("failed parsing the application address")?;
        Ok(Self {
            chain_id: chain_id.to_string(),
            application,
            registry,
        })
    }

    pub(crate) fn application(&self) -> Address {
        self.application
    }

    /// The output repository for this connection, enriched with chain-read
    /// execution state when the chain is reachable.
    pub(crate) fn repository(&self) -> eyre::Result<OutputRepository> {
        let url = self
            .registry
            .graphql_url(&self.chain_id, &format!("{:?}", self.application))?;
        let repository = OutputRepository::new(url);
        Ok(match self.engine() {
            Ok(engine) => repository.with_execution_state(Arc::new(engine)),
            Err(_) => repository,
        })
    }

    pub(crate) fn engine(&self) -> eyre::Result<ExecutionEngine<Http>> {
        Ok(ExecutionEngine::new(self.provider()?, self.application))
    }

    pub(crate) fn input_sender(&self) -> eyre::Result<InputSender<Http>> {
        let entry = self.registry.get(&self.chain_id)?;
        let portals = PortalContracts::from_registry(&entry.portals)?;
        Ok(InputSender::new(self.provider()?, self.application, portals))
    }

    pub(crate) fn inspect_client(&self) -> eyre::Result<InspectClient> {
        Ok(InspectClient::new(self.registry.inspect_url(&self.chain_id)?))
    }

    pub(crate) fn sequencer_client(&self) -> eyre::Result<SequencerClient> {
        Ok(SequencerClient::new(
            self.registry.sequencer_url(&self.chain_id)?,
        ))
    }

    /// Builds the list controller for one output kind. Configuration
    /// problems become the controller's error state instead of failing the
    /// command outright, mirroring how the view renders them inline.
    pub(crate) fn controller(&self, kind: OutputKind) -> OutputListController {
        OutputListController::connect(
            Some(&self.chain_id),
            self.repository().ok(),
            self.engine().ok(),
            OutputKindDescriptor::for_kind(kind),
        )
    }

    fn provider(&self) -> eyre::Result<Arc<Provider<Http>>> {
        let url = self.registry.rpc_url(&self.chain_id)?;
        let provider =
            Provider::<Http>::try_from(url).wrap_err("failed constructing the chain provider")?;
        Ok(Arc::new(provider))
    }
}
