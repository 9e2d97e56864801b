//! The output list controller: one state machine driving fetch → decode →
//! display → select → prove → act for a single output kind.
//!
//! The controller is parametrized over an [`OutputKindDescriptor`] instead
//! of being re-implemented per kind; the descriptor supplies the decoder,
//! whether the kind carries proofs, and which action applies. It is
//! long-lived for the life of a view and has no terminal state. All awaits
//! are sequential; overlapping reloads are not coalesced, so with external
//! concurrent use the last response to resolve wins.

use ethers::{
    providers::Http,
    signers::LocalWallet,
    types::{
        Address,
        U256,
    },
};
use outpost_client::{
    Output,
    OutputFilter,
    OutputKind,
    OutputRepository,
};
use outpost_executor::ExecutionEngine;
use tracing::debug;

/// The message recorded after a successful execution.
pub const VOUCHER_EXECUTED_MESSAGE: &str = "Voucher executed!";

/// The message recorded after a successful validation.
pub const NOTICE_VALID_MESSAGE: &str = "Notice is Valid!";

/// How one output kind is decoded and acted on.
#[derive(Clone, Copy, Debug)]
pub struct OutputKindDescriptor {
    pub kind: OutputKind,
    pub proof_required: bool,
    pub action: OutputAction,
    pub decode: fn(&[u8]) -> String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputAction {
    Execute,
    Validate,
    None,
}

impl OutputKindDescriptor {
    #[must_use]
    pub fn for_kind(kind: OutputKind) -> Self {
        match kind {
            OutputKind::Voucher => Self {
                kind,
                proof_required: true,
                action: OutputAction::Execute,
                decode: outpost_decoder::decode_voucher_payload,
            },
            OutputKind::DelegateCallVoucher => Self {
                kind,
                proof_required: true,
                action: OutputAction::Execute,
                decode: outpost_decoder::decode_voucher_payload,
            },
            OutputKind::Notice => Self {
                kind,
                proof_required: true,
                action: OutputAction::Validate,
                decode: outpost_decoder::decode_notice_payload,
            },
            OutputKind::Report => Self {
                kind,
                proof_required: false,
                action: OutputAction::None,
                decode: outpost_decoder::decode_text_payload,
            },
        }
    }
}

/// One decoded line of the listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputRow {
    pub index: u64,
    pub input_id: Option<String>,
    pub summary: String,
    pub destination: Option<Address>,
    pub value: Option<U256>,
}

#[derive(Clone, Debug)]
pub enum ControllerState {
    Idle,
    Fetching,
    Error { message: String },
    Ready { rows: Vec<OutputRow>, selection: Selection },
}

#[derive(Clone, Debug)]
pub enum Selection {
    NoneSelected,
    ProofPending { index: u64 },
    /// Reached whenever the singular fetch succeeded, whether or not a
    /// proof was found; an absent proof renders as "No proof yet".
    ProofReady { output: Output },
}

/// Whether the action control is available for the current selection, and
/// the reason when it is not.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionAvailability {
    Execute,
    Validate,
    AlreadyExecuted,
    NoProofYet,
    Unavailable,
}

pub struct OutputListController {
    descriptor: OutputKindDescriptor,
    repository: Option<OutputRepository>,
    engine: Option<ExecutionEngine<Http>>,
    filter: OutputFilter,
    state: ControllerState,
    message: Option<String>,
    entry_error: Option<String>,
}

impl OutputListController {
    /// Builds a controller for one output kind.
    ///
    /// Passing `chain: None` or `repository: None` puts the controller into
    /// a permanent error state: the view renders the configuration problem
    /// and never fetches.
    #[must_use]
    pub fn connect(
        chain: Option<&str>,
        repository: Option<OutputRepository>,
        engine: Option<ExecutionEngine<Http>>,
        descriptor: OutputKindDescriptor,
    ) -> Self {
        let entry_error = if chain.is_none() {
            Some("No connected chain".to_string())
        } else if repository.is_none() {
            Some("No chain graphql url".to_string())
        } else {
            None
        };
        let state = match &entry_error {
            Some(message) => ControllerState::Error {
                message: message.clone(),
            },
            None => ControllerState::Idle,
        };
        Self {
            descriptor,
            repository,
            engine,
            filter: OutputFilter::default(),
            state,
            message: None,
            entry_error,
        }
    }

    #[must_use]
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// The message produced by the last select/execute/validate, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    #[must_use]
    pub fn descriptor(&self) -> &OutputKindDescriptor {
        &self.descriptor
    }

    pub fn set_filter(&mut self, filter: OutputFilter) {
        self.filter = filter;
    }

    /// Fetches and decodes the listing. Resets the selection; a reload
    /// always lands in `Ready` or `Error`.
    pub async fn reload(&mut self) {
        self.message = None;
        if let Some(message) = &self.entry_error {
            self.state = ControllerState::Error {
                message: message.clone(),
            };
            return;
        }
        let repository = self
            .repository
            .as_ref()
            .expect("a controller without a repository carries an entry error");
        self.state = ControllerState::Fetching;
        match repository.list(self.descriptor.kind, &self.filter).await {
            Ok(outputs) => {
                debug!(
                    kind = %self.descriptor.kind,
                    count = outputs.len(),
                    "fetched output listing"
                );
                let rows = outputs
                    .iter()
                    .map(|output| to_row(&self.descriptor, output))
                    .collect();
                self.state = ControllerState::Ready {
                    rows,
                    selection: Selection::NoneSelected,
                };
            }
            Err(err) => {
                self.state = ControllerState::Error {
                    message: err.to_string(),
                };
            }
        }
    }

    /// Selects one output ("Get Proof"): fetches it with its proof and, for
    /// vouchers, its execution state.
    pub async fn select(&mut self, index: u64) {
        let ControllerState::Ready {
            selection, ..
        } = &mut self.state
        else {
            return;
        };
        *selection = Selection::ProofPending {
            index,
        };
        self.message = None;

        let repository = self
            .repository
            .as_ref()
            .expect("a ready controller has a repository");
        let fetched = repository.get(self.descriptor.kind, index).await;

        let ControllerState::Ready {
            selection, ..
        } = &mut self.state
        else {
            return;
        };
        match fetched {
            Ok(Some(output)) => {
                *selection = Selection::ProofReady {
                    output,
                };
            }
            Ok(None) => {
                *selection = Selection::NoneSelected;
                self.message = Some(format!("no output with index {index}"));
            }
            Err(err) => {
                *selection = Selection::NoneSelected;
                self.message = Some(err.to_string());
            }
        }
    }

    /// Whether the action control applies to the current selection.
    #[must_use]
    pub fn action_availability(&self) -> ActionAvailability {
        let ControllerState::Ready {
            selection: Selection::ProofReady {
                output,
            },
            ..
        } = &self.state
        else {
            return ActionAvailability::Unavailable;
        };
        if self.descriptor.action == OutputAction::None {
            return ActionAvailability::Unavailable;
        }
        if self.descriptor.proof_required
            && !output.proof().is_some_and(outpost_client::Proof::is_ready)
        {
            return ActionAvailability::NoProofYet;
        }
        match self.descriptor.action {
            OutputAction::Execute => {
                if output.executed() == Some(true) {
                    ActionAvailability::AlreadyExecuted
                } else {
                    ActionAvailability::Execute
                }
            }
            OutputAction::Validate => ActionAvailability::Validate,
            OutputAction::None => ActionAvailability::Unavailable,
        }
    }

    /// Executes the selected voucher with `wallet`.
    ///
    /// Controller state is unchanged on failure; on success only the
    /// executed flag of the selection is updated, re-confirmed against the
    /// chain by the engine.
    pub async fn execute(&mut self, wallet: LocalWallet) {
        self.message = None;
        if self.descriptor.action != OutputAction::Execute {
            self.message = Some("selected output kind is not executable".to_string());
            return;
        }
        let Some(engine) = self.engine.clone() else {
            self.message = Some("No connected chain".to_string());
            return;
        };
        let ControllerState::Ready {
            selection: Selection::ProofReady {
                output,
            },
            ..
        } = &mut self.state
        else {
            self.message = Some("nothing selected".to_string());
            return;
        };

        let result = match &*output {
            Output::Voucher(voucher) => engine.execute_voucher(voucher, wallet).await,
            Output::DelegateCallVoucher(voucher) => {
                engine.execute_delegate_call_voucher(voucher, wallet).await
            }
            Output::Notice(_) | Output::Report(_) => {
                self.message = Some("selected output kind is not executable".to_string());
                return;
            }
        };
        match result {
            Ok(outcome) => {
                let executed = Some(outcome.confirmed_executed.unwrap_or(true));
                match output {
                    Output::Voucher(voucher) => voucher.executed = executed,
                    Output::DelegateCallVoucher(voucher) => voucher.executed = executed,
                    Output::Notice(_) | Output::Report(_) => {}
                }
                self.message = Some(VOUCHER_EXECUTED_MESSAGE.to_string());
            }
            Err(err) => {
                self.message = Some(err.to_string());
            }
        }
    }

    /// Validates the selected notice. A pure read; controller state never
    /// changes, only the message.
    pub async fn validate(&mut self) {
        self.message = None;
        if self.descriptor.action != OutputAction::Validate {
            self.message = Some("selected output kind is not validatable".to_string());
            return;
        }
        let Some(engine) = self.engine.clone() else {
            self.message = Some("No connected chain".to_string());
            return;
        };
        let ControllerState::Ready {
            selection: Selection::ProofReady {
                output: Output::Notice(notice),
            },
            ..
        } = &self.state
        else {
            self.message = Some("nothing selected".to_string());
            return;
        };

        match engine.validate_notice(notice).await {
            Ok(()) => self.message = Some(NOTICE_VALID_MESSAGE.to_string()),
            Err(err) => self.message = Some(err.to_string()),
        }
    }
}

fn to_row(descriptor: &OutputKindDescriptor, output: &Output) -> OutputRow {
    OutputRow {
        index: output.index(),
        input_id: output.input().map(|input| input.id.clone()),
        summary: (descriptor.decode)(output.payload()),
        destination: output.destination(),
        value: output.value(),
    }
}
