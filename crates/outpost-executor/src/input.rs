use std::sync::Arc;

use ethers::{
    providers::{
        JsonRpcClient,
        Middleware as _,
        Provider,
        ProviderError,
    },
    signers::{
        LocalWallet,
        Signer as _,
    },
    types::{
        Address,
        TransactionReceipt,
        U256,
    },
};
use outpost_contracts::{
    make_signer_client,
    Erc1155BatchPortal,
    Erc1155SinglePortal,
    Erc20Portal,
    Erc721Portal,
    EtherPortal,
    InputBox,
    SignerClient,
    IERC1155,
    IERC20,
    IERC721,
};
use tracing::{
    debug,
    info,
    instrument,
};

use crate::{
    short_message,
    simulate_then_submit,
    CallFailure,
};

/// The on-chain entry points inputs travel through: the input box for plain
/// inputs and one portal per asset standard.
#[derive(Clone, Copy, Debug)]
pub struct PortalContracts {
    pub input_box: Address,
    pub ether_portal: Address,
    pub erc20_portal: Address,
    pub erc721_portal: Address,
    pub erc1155_single_portal: Address,
    pub erc1155_batch_portal: Address,
}

impl PortalContracts {
    /// Parses the portal addresses out of a chain registry entry.
    ///
    /// # Errors
    /// Returns an error if any of the configured addresses is not valid hex.
    pub fn from_registry(
        portals: &outpost_config::PortalAddresses,
    ) -> Result<Self, SendInputError> {
        Ok(Self {
            input_box: parse_portal_address("input_box", &portals.input_box)?,
            ether_portal: parse_portal_address("ether_portal", &portals.ether_portal)?,
            erc20_portal: parse_portal_address("erc20_portal", &portals.erc20_portal)?,
            erc721_portal: parse_portal_address("erc721_portal", &portals.erc721_portal)?,
            erc1155_single_portal: parse_portal_address(
                "erc1155_single_portal",
                &portals.erc1155_single_portal,
            )?,
            erc1155_batch_portal: parse_portal_address(
                "erc1155_batch_portal",
                &portals.erc1155_batch_portal,
            )?,
        })
    }
}

fn parse_portal_address(name: &'static str, raw: &str) -> Result<Address, SendInputError> {
    raw.parse::<Address>()
        .map_err(|source| SendInputError::parse_portal_address(name, source))
}

/// Sends inputs to one application: plain inputs through the input box,
/// asset deposits through the portals.
///
/// Deposits that require a token approval read the current approval first
/// and only approve when it does not cover the deposit; the approval is
/// mined before the deposit is submitted.
#[derive(Clone, Debug)]
pub struct InputSender<P> {
    provider: Arc<Provider<P>>,
    application: Address,
    portals: PortalContracts,
}

impl<P: JsonRpcClient + 'static> InputSender<P> {
    #[must_use]
    pub fn new(
        provider: Arc<Provider<P>>,
        application: Address,
        portals: PortalContracts,
    ) -> Self {
        Self {
            provider,
            application,
            portals,
        }
    }

    /// Adds an input directly on-chain through the input box.
    ///
    /// # Errors
    /// Returns an error if the chain call fails at any stage.
    #[instrument(skip(self, wallet, payload), fields(application = %self.application), err)]
    pub async fn add_input(
        &self,
        wallet: LocalWallet,
        payload: Vec<u8>,
    ) -> Result<TransactionReceipt, SendInputError> {
        let (client, _) = self.signer(wallet).await?;
        let input_box = InputBox::new(self.portals.input_box, client);
        let call = input_box.add_input(self.application, payload.into());
        let receipt = simulate_then_submit(&call)
            .await
            .map_err(SendInputError::send)?;
        info!(transaction_hash = %receipt.transaction_hash, "input added");
        Ok(receipt)
    }

    /// Deposits native assets through the ether portal.
    ///
    /// # Errors
    /// Returns an error if the chain call fails at any stage.
    #[instrument(skip(self, wallet, exec_layer_data), fields(%amount), err)]
    pub async fn deposit_ether(
        &self,
        wallet: LocalWallet,
        amount: U256,
        exec_layer_data: Vec<u8>,
    ) -> Result<TransactionReceipt, SendInputError> {
        let (client, _) = self.signer(wallet).await?;
        let portal = EtherPortal::new(self.portals.ether_portal, client);
        let call = portal
            .deposit_ether(self.application, exec_layer_data.into())
            .value(amount);
        simulate_then_submit(&call)
            .await
            .map_err(SendInputError::send)
    }

    /// Deposits ERC-20 tokens, approving the portal first if the current
    /// allowance does not cover the amount.
    ///
    /// # Errors
    /// Returns an error if the allowance read, the approval, or the deposit
    /// fails.
    #[instrument(skip(self, wallet, exec_layer_data), fields(%token, %amount), err)]
    pub async fn deposit_erc20(
        &self,
        wallet: LocalWallet,
        token: Address,
        amount: U256,
        exec_layer_data: Vec<u8>,
    ) -> Result<TransactionReceipt, SendInputError> {
        let (client, signer_address) = self.signer(wallet).await?;
        let token_contract = IERC20::new(token, client.clone());

        let allowance = token_contract
            .allowance(signer_address, self.portals.erc20_portal)
            .call()
            .await
            .map_err(|err| SendInputError::read_approval(short_message(&err), err))?;
        if allowance < amount {
            let approve = token_contract.approve(self.portals.erc20_portal, amount);
            let receipt = simulate_then_submit(&approve)
                .await
                .map_err(SendInputError::approve)?;
            debug!(transaction_hash = %receipt.transaction_hash, "approved erc20 portal");
        }

        let portal = Erc20Portal::new(self.portals.erc20_portal, client);
        let call =
            portal.deposit_erc20_tokens(token, self.application, amount, exec_layer_data.into());
        simulate_then_submit(&call)
            .await
            .map_err(SendInputError::send)
    }

    /// Deposits one ERC-721 token, approving the portal for it first if
    /// needed.
    ///
    /// # Errors
    /// Returns an error if the approval read, the approval, or the deposit
    /// fails.
    #[instrument(skip(self, wallet, base_layer_data, exec_layer_data), fields(%token, %token_id), err)]
    pub async fn deposit_erc721(
        &self,
        wallet: LocalWallet,
        token: Address,
        token_id: U256,
        base_layer_data: Vec<u8>,
        exec_layer_data: Vec<u8>,
    ) -> Result<TransactionReceipt, SendInputError> {
        let (client, _) = self.signer(wallet).await?;
        let token_contract = IERC721::new(token, client.clone());

        let approved = token_contract
            .get_approved(token_id)
            .call()
            .await
            .map_err(|err| SendInputError::read_approval(short_message(&err), err))?;
        if approved != self.portals.erc721_portal {
            let approve = token_contract.approve(self.portals.erc721_portal, token_id);
            let receipt = simulate_then_submit(&approve)
                .await
                .map_err(SendInputError::approve)?;
            debug!(transaction_hash = %receipt.transaction_hash, "approved erc721 portal");
        }

        let portal = Erc721Portal::new(self.portals.erc721_portal, client);
        let call = portal.deposit_erc721_token(
            token,
            self.application,
            token_id,
            base_layer_data.into(),
            exec_layer_data.into(),
        );
        simulate_then_submit(&call)
            .await
            .map_err(SendInputError::send)
    }

    /// Deposits ERC-1155 tokens of one id through the single portal.
    ///
    /// # Errors
    /// Returns an error if the approval read, the approval, or the deposit
    /// fails.
    #[instrument(skip(self, wallet, base_layer_data, exec_layer_data), fields(%token, %token_id), err)]
    pub async fn deposit_erc1155_single(
        &self,
        wallet: LocalWallet,
        token: Address,
        token_id: U256,
        amount: U256,
        base_layer_data: Vec<u8>,
        exec_layer_data: Vec<u8>,
    ) -> Result<TransactionReceipt, SendInputError> {
        let (client, signer_address) = self.signer(wallet).await?;
        let portal_address = self.portals.erc1155_single_portal;
        self.ensure_erc1155_approval(&client, token, signer_address, portal_address)
            .await?;

        let portal = Erc1155SinglePortal::new(portal_address, client);
        let call = portal.deposit_single_erc1155_token(
            token,
            self.application,
            token_id,
            amount,
            base_layer_data.into(),
            exec_layer_data.into(),
        );
        simulate_then_submit(&call)
            .await
            .map_err(SendInputError::send)
    }

    /// Deposits a batch of ERC-1155 token ids through the batch portal.
    ///
    /// # Errors
    /// Returns an error if the approval read, the approval, or the deposit
    /// fails.
    #[instrument(skip(self, wallet, token_ids, amounts, base_layer_data, exec_layer_data), fields(%token), err)]
    pub async fn deposit_erc1155_batch(
        &self,
        wallet: LocalWallet,
        token: Address,
        token_ids: Vec<U256>,
        amounts: Vec<U256>,
        base_layer_data: Vec<u8>,
        exec_layer_data: Vec<u8>,
    ) -> Result<TransactionReceipt, SendInputError> {
        let (client, signer_address) = self.signer(wallet).await?;
        let portal_address = self.portals.erc1155_batch_portal;
        self.ensure_erc1155_approval(&client, token, signer_address, portal_address)
            .await?;

        let portal = Erc1155BatchPortal::new(portal_address, client);
        let call = portal.deposit_batch_erc1155_token(
            token,
            self.application,
            token_ids,
            amounts,
            base_layer_data.into(),
            exec_layer_data.into(),
        );
        simulate_then_submit(&call)
            .await
            .map_err(SendInputError::send)
    }

    async fn ensure_erc1155_approval(
        &self,
        client: &Arc<SignerClient<P>>,
        token: Address,
        owner: Address,
        operator: Address,
    ) -> Result<(), SendInputError> {
        let token_contract = IERC1155::new(token, client.clone());
        let approved = token_contract
            .is_approved_for_all(owner, operator)
            .call()
            .await
            .map_err(|err| SendInputError::read_approval(short_message(&err), err))?;
        if !approved {
            let approve = token_contract.set_approval_for_all(operator, true);
            let receipt = simulate_then_submit(&approve)
                .await
                .map_err(SendInputError::approve)?;
            debug!(transaction_hash = %receipt.transaction_hash, "approved erc1155 portal");
        }
        Ok(())
    }

    async fn signer(
        &self,
        wallet: LocalWallet,
    ) -> Result<(Arc<SignerClient<P>>, Address), SendInputError> {
        let chain_id = self
            .provider
            .get_chainid()
            .await
            .map_err(SendInputError::chain_id)?;
        let wallet = wallet.with_chain_id(chain_id.as_u64());
        let address = wallet.address();
        Ok((make_signer_client(self.provider.clone(), wallet), address))
    }
}

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct SendInputError(SendInputErrorKind);

impl SendInputError {
    #[must_use]
    fn parse_portal_address<T: Into<Box<dyn std::error::Error + Send + Sync + 'static>>>(
        name: &'static str,
        source: T,
    ) -> Self {
        Self(SendInputErrorKind::ParsePortalAddress {
            name,
            source: source.into(),
        })
    }

    #[must_use]
    fn chain_id(source: ProviderError) -> Self {
        Self(SendInputErrorKind::ChainId {
            source,
        })
    }

    #[must_use]
    fn read_approval<T: Into<Box<dyn std::error::Error + Send + Sync + 'static>>>(
        message: String,
        source: T,
    ) -> Self {
        Self(SendInputErrorKind::ReadApproval {
            message,
            source: source.into(),
        })
    }

    #[must_use]
    fn approve(source: CallFailure) -> Self {
        Self(SendInputErrorKind::Approve {
            source,
        })
    }

    #[must_use]
    fn send(source: CallFailure) -> Self {
        Self(SendInputErrorKind::Send {
            source,
        })
    }
}

#[derive(Debug, thiserror::Error)]
enum SendInputErrorKind {
    #[error("failed parsing configured address `{name}`")]
    ParsePortalAddress {
        name: &'static str,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("failed reading the chain id from the provider")]
    ChainId { source: ProviderError },
    #[error("failed reading the current token approval: {message}")]
    ReadApproval {
        message: String,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("token approval failed")]
    Approve { source: CallFailure },
    #[error(transparent)]
    Send { source: CallFailure },
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ethers::{
        providers::{
            Http,
            Provider,
        },
        types::{
            Address,
            U256,
        },
        utils::id,
    };
    use outpost_config::PortalAddresses;
    use serde_json::json;
    use wiremock::{
        matchers::{
            body_string_contains,
            method,
        },
        Mock,
        MockServer,
        ResponseTemplate,
    };

    use super::{
        InputSender,
        PortalContracts,
    };
    use crate::test_utils::{
        test_wallet,
        RpcResponse,
    };

    fn registry_portals() -> PortalAddresses {
        PortalAddresses {
            input_box: "0x593e5bcf894d6829dd26d0810da7f064406aebb6".to_string(),
            ether_portal: "0xfa2292f6d85ea4e629b068f10a8ad617526bc37a".to_string(),
            erc20_portal: "0x05355c2f9bd1c04c4f6db34bf0c9af2b29254bd8".to_string(),
            erc721_portal: "0x874c6fbad3a3e307b359efb1e3dfa36b0c68b1b8".to_string(),
            erc1155_single_portal: "0xa94546aa9f62a32b9cd82e1b5031b40c9c171bd9".to_string(),
            erc1155_batch_portal: "0x4a218d331c0933d5fac5b3ead4641a08d5b7ce23".to_string(),
        }
    }

    #[test]
    fn portal_addresses_parse_from_the_registry() {
        let portals = PortalContracts::from_registry(&registry_portals()).unwrap();
        assert_eq!(
            portals.input_box,
            "0x593e5bcf894d6829dd26d0810da7f064406aebb6"
                .parse::<Address>()
                .unwrap()
        );
    }

    #[test]
    fn malformed_portal_address_is_an_error() {
        let mut portals = registry_portals();
        portals.erc20_portal = "not-an-address".to_string();
        let err = PortalContracts::from_registry(&portals).unwrap_err();
        assert!(err.to_string().contains("erc20_portal"));
    }

    fn selector_hex(signature: &str) -> String {
        hex::encode(id(signature))
    }

    #[tokio::test]
    async fn failed_approval_aborts_the_deposit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("eth_chainId"))
            .respond_with(RpcResponse(json!({"result": "0x7a69"})))
            .mount(&server)
            .await;
        // allowance read returns zero, forcing the approval path
        Mock::given(method("POST"))
            .and(body_string_contains(selector_hex(
                "allowance(address,address)",
            )))
            .respond_with(RpcResponse(json!({
                "result": format!("0x{}", hex::encode([0u8; 32]))
            })))
            .mount(&server)
            .await;
        // the approval simulation reverts
        Mock::given(method("POST"))
            .and(body_string_contains(selector_hex(
                "approve(address,uint256)",
            )))
            .respond_with(RpcResponse(json!({
                "error": {"code": 3, "message": "execution reverted: not the owner"}
            })))
            .mount(&server)
            .await;
        // the deposit itself must never be attempted
        Mock::given(method("POST"))
            .and(body_string_contains(selector_hex(
                "depositERC20Tokens(address,address,uint256,bytes)",
            )))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let provider = Arc::new(Provider::<Http>::try_from(server.uri()).unwrap());
        let sender = InputSender::new(
            provider,
            Address::repeat_byte(0xaa),
            PortalContracts::from_registry(&registry_portals()).unwrap(),
        );

        let err = sender
            .deposit_erc20(
                test_wallet(),
                Address::repeat_byte(0x33),
                U256::exp10(18),
                b"memo".to_vec(),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("approval"), "got: {err}");
    }
}
