use std::sync::Arc;

use ethers::{
    providers::{
        JsonRpcClient,
        Middleware as _,
        Provider,
    },
    signers::{
        LocalWallet,
        Signer as _,
    },
    types::{
        Address,
        TransactionReceipt,
    },
};
use outpost_client::{
    DelegateCallVoucher,
    ExecutionStateProvider,
    Notice,
    Proof,
    Voucher,
};
use outpost_contracts::{
    get_application_read_only,
    get_application_with_signer,
    OutputValidityProof,
};
use tracing::{
    info,
    instrument,
    warn,
};

use crate::{
    short_message,
    simulate_then_submit,
    CallFailure,
};

/// Executes and validates outputs against one application contract.
///
/// Execution goes through a signing wallet provided per call; validation and
/// the executed predicate are plain reads.
#[derive(Clone, Debug)]
pub struct ExecutionEngine<P> {
    provider: Arc<Provider<P>>,
    application: Address,
}

/// The result of a successful execution.
#[derive(Clone, Debug)]
pub struct ExecutionOutcome {
    pub receipt: TransactionReceipt,
    /// The executed predicate re-read from the chain after the receipt.
    /// `None` if the confirmation read failed; the transaction itself was
    /// mined either way.
    pub confirmed_executed: Option<bool>,
}

impl<P: JsonRpcClient + 'static> ExecutionEngine<P> {
    #[must_use]
    pub fn new(provider: Arc<Provider<P>>, application: Address) -> Self {
        Self {
            provider,
            application,
        }
    }

    #[must_use]
    pub fn application(&self) -> Address {
        self.application
    }

    /// Executes a voucher with the connected signer.
    ///
    /// # Errors
    /// Returns an error if the voucher has no payload, carries no usable
    /// proof, or the chain call fails at any stage.
    pub async fn execute_voucher(
        &self,
        voucher: &Voucher,
        wallet: LocalWallet,
    ) -> Result<ExecutionOutcome, ExecuteError> {
        self.execute(&voucher.payload, voucher.proof.as_ref(), wallet)
            .await
    }

    /// Executes a delegate-call voucher with the connected signer.
    ///
    /// # Errors
    /// Same failure modes as [`Self::execute_voucher`].
    pub async fn execute_delegate_call_voucher(
        &self,
        voucher: &DelegateCallVoucher,
        wallet: LocalWallet,
    ) -> Result<ExecutionOutcome, ExecuteError> {
        self.execute(&voucher.payload, voucher.proof.as_ref(), wallet)
            .await
    }

    /// Executes one output: simulate, submit, wait for one confirmation,
    /// then re-read the executed predicate for server confirmation.
    ///
    /// The preconditions run before any chain call: a missing payload or a
    /// proof without siblings never reaches the provider. A stale local
    /// executed flag is deliberately not checked here; if the output was
    /// already executed the contract reverts and that revert is surfaced.
    ///
    /// # Errors
    /// Returns an error if a precondition fails or the chain call fails at
    /// any stage.
    #[instrument(skip_all, fields(application = %self.application), err)]
    pub async fn execute(
        &self,
        payload: &[u8],
        proof: Option<&Proof>,
        wallet: LocalWallet,
    ) -> Result<ExecutionOutcome, ExecuteError> {
        let proof = check_preconditions(payload, proof)?;

        let chain_id = self
            .provider
            .get_chainid()
            .await
            .map_err(ExecuteError::chain_id)?;
        let wallet = wallet.with_chain_id(chain_id.as_u64());
        let contract =
            get_application_with_signer(self.provider.clone(), wallet, self.application);

        let call = contract.execute_output(payload.to_vec().into(), to_contract_proof(proof));
        let receipt = simulate_then_submit(&call)
            .await
            .map_err(ExecuteError::execute)?;
        info!(
            output_index = proof.output_index,
            transaction_hash = %receipt.transaction_hash,
            "output executed"
        );

        // the local flag is optimistic; always reconfirm against the chain
        let confirmed_executed = match self.was_output_executed(proof.output_index).await {
            Ok(executed) => Some(executed),
            Err(error) => {
                warn!(
                    output_index = proof.output_index,
                    %error,
                    "failed re-reading the executed predicate after execution"
                );
                None
            }
        };

        Ok(ExecutionOutcome {
            receipt,
            confirmed_executed,
        })
    }

    /// Validates a notice against the application contract.
    ///
    /// A pure read; no signer is involved.
    ///
    /// # Errors
    /// Returns an error if the notice has no payload, carries no usable
    /// proof, or the chain rejects the proof.
    pub async fn validate_notice(&self, notice: &Notice) -> Result<(), ValidateError> {
        self.validate(&notice.payload, notice.proof.as_ref()).await
    }

    /// Validates one output payload against its proof.
    ///
    /// # Errors
    /// Returns an error if a precondition fails or the read call reverts.
    #[instrument(skip_all, fields(application = %self.application), err)]
    pub async fn validate(
        &self,
        payload: &[u8],
        proof: Option<&Proof>,
    ) -> Result<(), ValidateError> {
        let proof = check_preconditions(payload, proof).map_err(ValidateError::from_precondition)?;

        let contract = get_application_read_only(self.provider.clone(), self.application);
        contract
            .validate_output(payload.to_vec().into(), to_contract_proof(proof))
            .call()
            .await
            .map_err(|err| ValidateError::chain_call(short_message(&err), err))?;
        Ok(())
    }

    /// Reads the executed predicate for `output_index`.
    ///
    /// # Errors
    /// Returns an error if the read call fails.
    pub async fn was_output_executed(&self, output_index: u64) -> Result<bool, ExecuteError> {
        let contract = get_application_read_only(self.provider.clone(), self.application);
        contract
            .was_output_executed(output_index.into())
            .call()
            .await
            .map_err(|err| ExecuteError::read_execution_state(short_message(&err), err))
    }
}

#[async_trait::async_trait]
impl<P: JsonRpcClient + 'static> ExecutionStateProvider for ExecutionEngine<P> {
    async fn was_output_executed(
        &self,
        output_index: u64,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync + 'static>> {
        ExecutionEngine::was_output_executed(self, output_index)
            .await
            .map_err(Into::into)
    }
}

fn check_preconditions<'a>(
    payload: &[u8],
    proof: Option<&'a Proof>,
) -> Result<&'a Proof, ExecuteError> {
    if payload.is_empty() {
        return Err(ExecuteError::missing_payload());
    }
    match proof {
        Some(proof) if proof.is_ready() => Ok(proof),
        _ => Err(ExecuteError::missing_proof()),
    }
}

fn to_contract_proof(proof: &Proof) -> OutputValidityProof {
    OutputValidityProof {
        output_index: proof.output_index,
        output_hashes_siblings: proof
            .output_hashes_siblings
            .iter()
            .map(|hash| hash.to_fixed_bytes())
            .collect(),
    }
}

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ExecuteError(ExecuteErrorKind);

impl ExecuteError {
    #[must_use]
    fn missing_payload() -> Self {
        Self(ExecuteErrorKind::MissingPayload)
    }

    #[must_use]
    fn missing_proof() -> Self {
        Self(ExecuteErrorKind::MissingProof)
    }

    #[must_use]
    fn chain_id(source: ethers::providers::ProviderError) -> Self {
        Self(ExecuteErrorKind::ChainId {
            source,
        })
    }

    #[must_use]
    fn execute(source: CallFailure) -> Self {
        Self(ExecuteErrorKind::Execute {
            source,
        })
    }

    #[must_use]
    fn read_execution_state<T: Into<Box<dyn std::error::Error + Send + Sync + 'static>>>(
        message: String,
        source: T,
    ) -> Self {
        Self(ExecuteErrorKind::ReadExecutionState {
            message,
            source: source.into(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
enum ExecuteErrorKind {
    #[error("output has no payload")]
    MissingPayload,
    #[error("no proof yet")]
    MissingProof,
    #[error("failed reading the chain id from the provider")]
    ChainId {
        source: ethers::providers::ProviderError,
    },
    #[error(transparent)]
    Execute { source: CallFailure },
    #[error("failed reading the executed predicate: {message}")]
    ReadExecutionState {
        message: String,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ValidateError(ValidateErrorKind);

impl ValidateError {
    fn from_precondition(source: ExecuteError) -> Self {
        match source.0 {
            ExecuteErrorKind::MissingPayload => Self(ValidateErrorKind::MissingPayload),
            _ => Self(ValidateErrorKind::MissingProof),
        }
    }

    #[must_use]
    fn chain_call<T: Into<Box<dyn std::error::Error + Send + Sync + 'static>>>(
        message: String,
        source: T,
    ) -> Self {
        Self(ValidateErrorKind::ChainCall {
            message,
            source: source.into(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
enum ValidateErrorKind {
    #[error("output has no payload")]
    MissingPayload,
    #[error("no proof yet")]
    MissingProof,
    #[error("validation failed: {message}")]
    ChainCall {
        message: String,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}
