//! HTTP clients for the off-chain side of the console: the per-application
//! query backend (outputs and proofs), the inspect endpoint, and the L2
//! sequencer submission endpoint.
//!
//! The query backend owns outputs and proofs; everything fetched here is an
//! ephemeral copy for the current session. No client retries automatically:
//! every failure surfaces as a [`FetchError`] and recovery is caller
//! initiated.

use std::borrow::Cow;

mod inspect;
mod repository;
mod sequencer;
mod types;

pub use inspect::{
    InspectClient,
    InspectMetadata,
    InspectReport,
    InspectResponse,
};
pub use repository::{
    ExecutionStateProvider,
    OutputFilter,
    OutputRepository,
};
pub use sequencer::{
    CartesiMessage,
    SequencerClient,
    SubmitInputResponse,
};
pub use types::{
    DelegateCallVoucher,
    InputRef,
    Notice,
    Output,
    OutputKind,
    Proof,
    Report,
    Voucher,
};

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct FetchError(FetchErrorKind);

impl FetchError {
    #[must_use]
    fn transport(source: reqwest::Error) -> Self {
        Self(FetchErrorKind::Transport {
            source,
        })
    }

    #[must_use]
    fn status(status: reqwest::StatusCode) -> Self {
        Self(FetchErrorKind::Status {
            status,
        })
    }

    #[must_use]
    fn graphql(messages: String) -> Self {
        Self(FetchErrorKind::Graphql {
            messages,
        })
    }

    #[must_use]
    fn missing_data() -> Self {
        Self(FetchErrorKind::MissingData)
    }

    #[must_use]
    fn malformed<T: Into<Box<dyn std::error::Error + Send + Sync + 'static>>>(
        field: impl Into<Cow<'static, str>>,
        source: T,
    ) -> Self {
        Self(FetchErrorKind::Malformed {
            field: field.into(),
            source: source.into(),
        })
    }

    #[must_use]
    fn execution_state<T: Into<Box<dyn std::error::Error + Send + Sync + 'static>>>(
        output_index: u64,
        source: T,
    ) -> Self {
        Self(FetchErrorKind::ExecutionState {
            output_index,
            source: source.into(),
        })
    }

    #[must_use]
    fn sign<T: Into<Box<dyn std::error::Error + Send + Sync + 'static>>>(source: T) -> Self {
        Self(FetchErrorKind::Sign {
            source: source.into(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
enum FetchErrorKind {
    #[error("failed sending request to the backend")]
    Transport { source: reqwest::Error },
    #[error("backend returned HTTP status `{status}`")]
    Status { status: reqwest::StatusCode },
    #[error("query backend returned errors: {messages}")]
    Graphql { messages: String },
    #[error("query backend response carried no data")]
    MissingData,
    #[error("failed decoding field `{field}` of the backend response")]
    Malformed {
        field: Cow<'static, str>,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("failed reading the execution state of output `{output_index}`")]
    ExecutionState {
        output_index: u64,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("failed signing the sequencer message")]
    Sign {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

/// Decodes a `0x`-prefixed hex string into bytes.
pub(crate) fn parse_hex(field: &'static str, raw: &str) -> Result<Vec<u8>, FetchError> {
    let stripped = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(stripped).map_err(|source| FetchError::malformed(field, source))
}
