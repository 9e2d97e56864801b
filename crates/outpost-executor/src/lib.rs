//! Chain writes and authenticated reads for the console: executing and
//! validating outputs against the application contract, adding inputs, and
//! depositing assets through the portals.
//!
//! Every state-changing call follows the same shape: simulate first to
//! surface revert reasons before spending gas, submit with the connected
//! signer, then block until the transaction is mined (one confirmation).
//! Nothing retries automatically; a failed operation is abandoned and the
//! caller re-triggers it.

use ethers::{
    contract::ContractError,
    prelude::{
        ContractCall,
        Middleware,
    },
    providers::ProviderError,
    types::TransactionReceipt,
};

mod engine;
mod input;
#[cfg(test)]
pub(crate) mod test_utils;

pub use engine::{
    ExecuteError,
    ExecutionEngine,
    ExecutionOutcome,
    ValidateError,
};
pub use input::{
    InputSender,
    PortalContracts,
    SendInputError,
};

/// Extracts the short, user-facing message from a contract error: the
/// decoded revert reason when the chain supplied one, the error's own
/// display otherwise.
fn short_message<M: Middleware>(err: &ContractError<M>) -> String {
    err.decode_revert::<String>()
        .unwrap_or_else(|| err.to_string())
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum CallFailure {
    #[error("simulation failed: {message}")]
    Simulate {
        message: String,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("submission failed: {message}")]
    Submit {
        message: String,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("failed waiting for the transaction to be mined")]
    WaitForReceipt { source: ProviderError },
    #[error("transaction was dropped from the mempool before being mined")]
    Dropped,
}

impl CallFailure {
    fn simulate<M: Middleware + 'static>(err: ContractError<M>) -> Self {
        Self::Simulate {
            message: short_message(&err),
            source: err.into(),
        }
    }

    fn submit<M: Middleware + 'static>(err: ContractError<M>) -> Self {
        Self::Submit {
            message: short_message(&err),
            source: err.into(),
        }
    }
}

/// Simulates `call` against current chain state, submits it, and waits for
/// one confirmation. No timeout is applied to the mining wait.
pub(crate) async fn simulate_then_submit<M, D>(
    call: &ContractCall<M, D>,
) -> Result<TransactionReceipt, CallFailure>
where
    M: Middleware + 'static,
    D: ethers::abi::Detokenize,
{
    call.call().await.map_err(CallFailure::simulate)?;
    let pending = call.send().await.map_err(CallFailure::submit)?;
    let receipt = pending
        .await
        .map_err(|source| CallFailure::WaitForReceipt {
            source,
        })?;
    receipt.ok_or(CallFailure::Dropped)
}
