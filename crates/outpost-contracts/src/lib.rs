//! Contract bindings for the on-chain side of the console: the application
//! contract (output execution and validation), the input box, the asset
//! portals, and the token interfaces the portals require approvals on.
//!
//! Bindings are generated with `abigen!` from human-readable ABI fragments;
//! only the functions the console calls are declared.

use std::sync::Arc;

use ethers::{
    providers::{
        JsonRpcClient,
        Provider,
    },
    signers::LocalWallet,
    types::Address,
};

#[rustfmt::skip]
#[allow(clippy::pedantic)]
mod generated;

pub use generated::{
    application::{
        Application,
        OutputValidityProof,
    },
    input_box::InputBox,
    portals::{
        Erc1155BatchPortal,
        Erc1155SinglePortal,
        Erc20Portal,
        Erc721Portal,
        EtherPortal,
    },
    tokens::{
        IERC1155,
        IERC20,
        IERC721,
    },
};

/// The middleware stack used for state-changing calls: a provider wrapped
/// with a local signing key.
pub type SignerClient<P> =
    ethers::middleware::SignerMiddleware<Arc<Provider<P>>, LocalWallet>;

/// Returns a new read-only [`Application`] contract instance.
pub fn get_application_read_only<P: JsonRpcClient>(
    provider: Arc<Provider<P>>,
    contract_address: Address,
) -> Application<Provider<P>> {
    Application::new(contract_address, provider)
}

/// Returns a new [`Application`] contract instance with a signer.
pub fn get_application_with_signer<P: JsonRpcClient>(
    provider: Arc<Provider<P>>,
    wallet: LocalWallet,
    contract_address: Address,
) -> Application<SignerClient<P>> {
    Application::new(contract_address, make_signer_client(provider, wallet))
}

/// Returns a new [`InputBox`] contract instance with a signer.
pub fn get_input_box_with_signer<P: JsonRpcClient>(
    provider: Arc<Provider<P>>,
    wallet: LocalWallet,
    contract_address: Address,
) -> InputBox<SignerClient<P>> {
    InputBox::new(contract_address, make_signer_client(provider, wallet))
}

/// Wraps `provider` and `wallet` into the shared signing middleware stack.
///
/// The wallet must already carry the chain id of the target chain, otherwise
/// submitted transactions will be rejected with a signature error.
pub fn make_signer_client<P: JsonRpcClient>(
    provider: Arc<Provider<P>>,
    wallet: LocalWallet,
) -> Arc<SignerClient<P>> {
    Arc::new(ethers::middleware::SignerMiddleware::new(provider, wallet))
}

#[cfg(test)]
mod tests {
    use ethers::{
        abi::AbiEncode as _,
        types::Bytes,
        utils::id,
    };

    use super::generated::application::{
        ExecuteOutputCall,
        OutputValidityProof,
        WasOutputExecutedCall,
    };

    #[test]
    fn execute_output_encodes_with_the_interface_selector() {
        let call = ExecuteOutputCall {
            output: Bytes::from(vec![1, 2, 3]),
            proof: OutputValidityProof {
                output_index: 7,
                output_hashes_siblings: vec![[0x11; 32]],
            },
        };
        let encoded = call.encode();
        assert_eq!(
            &encoded[..4],
            id("executeOutput(bytes,(uint64,bytes32[]))").as_slice()
        );
    }

    #[test]
    fn was_output_executed_encodes_with_the_interface_selector() {
        let call = WasOutputExecutedCall {
            output_index: 7u64.into(),
        };
        let encoded = call.encode();
        assert_eq!(
            &encoded[..4],
            id("wasOutputExecuted(uint256)").as_slice()
        );
    }
}
