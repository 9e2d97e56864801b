use ethers::types::{
    Address,
    H256,
    U256,
};
use serde::Deserialize;

use crate::{
    parse_hex,
    FetchError,
};

/// The four kinds of outputs the query backend serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputKind {
    Notice,
    Voucher,
    DelegateCallVoucher,
    Report,
}

impl std::fmt::Display for OutputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Notice => "notice",
            Self::Voucher => "voucher",
            Self::DelegateCallVoucher => "delegate-call-voucher",
            Self::Report => "report",
        };
        f.write_str(name)
    }
}

/// Reference to the input that caused an output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputRef {
    pub id: String,
    pub payload: Vec<u8>,
}

/// Inclusion evidence for one output, produced once the epoch containing it
/// has been accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proof {
    pub output_index: u64,
    pub output_hashes_siblings: Vec<H256>,
}

impl Proof {
    /// A proof with no siblings cannot recompute the root; the backend hands
    /// one out while the epoch is still open.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !self.output_hashes_siblings.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub index: u64,
    pub payload: Vec<u8>,
    pub epoch_index: Option<u64>,
    pub input: Option<InputRef>,
    pub proof: Option<Proof>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Voucher {
    pub index: u64,
    pub destination: Address,
    pub value: U256,
    pub payload: Vec<u8>,
    pub epoch_index: Option<u64>,
    pub input: Option<InputRef>,
    pub proof: Option<Proof>,
    /// Learned from the target chain's executed predicate; `None` until a
    /// chain client enriched this voucher. Not authoritative until
    /// re-checked.
    pub executed: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DelegateCallVoucher {
    pub index: u64,
    pub destination: Address,
    pub payload: Vec<u8>,
    pub epoch_index: Option<u64>,
    pub input: Option<InputRef>,
    pub proof: Option<Proof>,
    pub executed: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub index: u64,
    pub payload: Vec<u8>,
    pub epoch_index: Option<u64>,
    pub input: Option<InputRef>,
}

/// An output of any kind, as returned by the generic listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Output {
    Notice(Notice),
    Voucher(Voucher),
    DelegateCallVoucher(DelegateCallVoucher),
    Report(Report),
}

impl Output {
    #[must_use]
    pub fn kind(&self) -> OutputKind {
        match self {
            Self::Notice(_) => OutputKind::Notice,
            Self::Voucher(_) => OutputKind::Voucher,
            Self::DelegateCallVoucher(_) => OutputKind::DelegateCallVoucher,
            Self::Report(_) => OutputKind::Report,
        }
    }

    #[must_use]
    pub fn index(&self) -> u64 {
        match self {
            Self::Notice(notice) => notice.index,
            Self::Voucher(voucher) => voucher.index,
            Self::DelegateCallVoucher(voucher) => voucher.index,
            Self::Report(report) => report.index,
        }
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        match self {
            Self::Notice(notice) => &notice.payload,
            Self::Voucher(voucher) => &voucher.payload,
            Self::DelegateCallVoucher(voucher) => &voucher.payload,
            Self::Report(report) => &report.payload,
        }
    }

    #[must_use]
    pub fn epoch_index(&self) -> Option<u64> {
        match self {
            Self::Notice(notice) => notice.epoch_index,
            Self::Voucher(voucher) => voucher.epoch_index,
            Self::DelegateCallVoucher(voucher) => voucher.epoch_index,
            Self::Report(report) => report.epoch_index,
        }
    }

    #[must_use]
    pub fn input(&self) -> Option<&InputRef> {
        match self {
            Self::Notice(notice) => notice.input.as_ref(),
            Self::Voucher(voucher) => voucher.input.as_ref(),
            Self::DelegateCallVoucher(voucher) => voucher.input.as_ref(),
            Self::Report(report) => report.input.as_ref(),
        }
    }

    #[must_use]
    pub fn proof(&self) -> Option<&Proof> {
        match self {
            Self::Notice(notice) => notice.proof.as_ref(),
            Self::Voucher(voucher) => voucher.proof.as_ref(),
            Self::DelegateCallVoucher(voucher) => voucher.proof.as_ref(),
            Self::Report(_) => None,
        }
    }

    #[must_use]
    pub fn destination(&self) -> Option<Address> {
        match self {
            Self::Voucher(voucher) => Some(voucher.destination),
            Self::DelegateCallVoucher(voucher) => Some(voucher.destination),
            Self::Notice(_) | Self::Report(_) => None,
        }
    }

    #[must_use]
    pub fn value(&self) -> Option<U256> {
        match self {
            Self::Voucher(voucher) => Some(voucher.value),
            _ => None,
        }
    }

    #[must_use]
    pub fn executed(&self) -> Option<bool> {
        match self {
            Self::Voucher(voucher) => voucher.executed,
            Self::DelegateCallVoucher(voucher) => voucher.executed,
            Self::Notice(_) | Self::Report(_) => None,
        }
    }
}

// Wire representations as served by the query backend. Payloads, values and
// hashes arrive hex encoded; conversion into the public types is where
// malformed data turns into `FetchError`s.

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawInput {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) payload: Option<String>,
}

impl RawInput {
    fn try_into_input(self) -> Result<InputRef, FetchError> {
        let payload = match &self.payload {
            Some(raw) => parse_hex("input.payload", raw)?,
            None => Vec::new(),
        };
        Ok(InputRef {
            id: self.id,
            payload,
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawProof {
    pub(crate) output_index: u64,
    #[serde(default)]
    pub(crate) output_hashes_siblings: Vec<String>,
}

impl RawProof {
    fn try_into_proof(self) -> Result<Proof, FetchError> {
        let output_hashes_siblings = self
            .output_hashes_siblings
            .iter()
            .map(|raw| {
                raw.parse::<H256>()
                    .map_err(|source| FetchError::malformed("proof.outputHashesSiblings", source))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Proof {
            output_index: self.output_index,
            output_hashes_siblings,
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawNotice {
    pub(crate) index: u64,
    #[serde(default)]
    pub(crate) payload: Option<String>,
    #[serde(default)]
    pub(crate) epoch_index: Option<u64>,
    #[serde(default)]
    pub(crate) input: Option<RawInput>,
    #[serde(default)]
    pub(crate) proof: Option<RawProof>,
}

impl RawNotice {
    pub(crate) fn try_into_notice(self) -> Result<Notice, FetchError> {
        Ok(Notice {
            index: self.index,
            payload: parse_optional_hex("notice.payload", self.payload.as_deref())?,
            epoch_index: self.epoch_index,
            input: self.input.map(RawInput::try_into_input).transpose()?,
            proof: self.proof.map(RawProof::try_into_proof).transpose()?,
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawVoucher {
    pub(crate) index: u64,
    pub(crate) destination: String,
    #[serde(default)]
    pub(crate) value: Option<String>,
    #[serde(default)]
    pub(crate) payload: Option<String>,
    #[serde(default)]
    pub(crate) epoch_index: Option<u64>,
    #[serde(default)]
    pub(crate) input: Option<RawInput>,
    #[serde(default)]
    pub(crate) proof: Option<RawProof>,
}

impl RawVoucher {
    pub(crate) fn try_into_voucher(self) -> Result<Voucher, FetchError> {
        Ok(Voucher {
            index: self.index,
            destination: parse_address("voucher.destination", &self.destination)?,
            value: parse_optional_u256("voucher.value", self.value.as_deref())?,
            payload: parse_optional_hex("voucher.payload", self.payload.as_deref())?,
            epoch_index: self.epoch_index,
            input: self.input.map(RawInput::try_into_input).transpose()?,
            proof: self.proof.map(RawProof::try_into_proof).transpose()?,
            executed: None,
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawDelegateCallVoucher {
    pub(crate) index: u64,
    pub(crate) destination: String,
    #[serde(default)]
    pub(crate) payload: Option<String>,
    #[serde(default)]
    pub(crate) epoch_index: Option<u64>,
    #[serde(default)]
    pub(crate) input: Option<RawInput>,
    #[serde(default)]
    pub(crate) proof: Option<RawProof>,
}

impl RawDelegateCallVoucher {
    pub(crate) fn try_into_delegate_call_voucher(self) -> Result<DelegateCallVoucher, FetchError> {
        Ok(DelegateCallVoucher {
            index: self.index,
            destination: parse_address("delegateCallVoucher.destination", &self.destination)?,
            payload: parse_optional_hex("delegateCallVoucher.payload", self.payload.as_deref())?,
            epoch_index: self.epoch_index,
            input: self.input.map(RawInput::try_into_input).transpose()?,
            proof: self.proof.map(RawProof::try_into_proof).transpose()?,
            executed: None,
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawReport {
    pub(crate) index: u64,
    #[serde(default)]
    pub(crate) payload: Option<String>,
    #[serde(default)]
    pub(crate) epoch_index: Option<u64>,
    #[serde(default)]
    pub(crate) input: Option<RawInput>,
}

impl RawReport {
    pub(crate) fn try_into_report(self) -> Result<Report, FetchError> {
        Ok(Report {
            index: self.index,
            payload: parse_optional_hex("report.payload", self.payload.as_deref())?,
            epoch_index: self.epoch_index,
            input: self.input.map(RawInput::try_into_input).transpose()?,
        })
    }
}

fn parse_optional_hex(field: &'static str, raw: Option<&str>) -> Result<Vec<u8>, FetchError> {
    match raw {
        Some(raw) => parse_hex(field, raw),
        None => Ok(Vec::new()),
    }
}

fn parse_address(field: &'static str, raw: &str) -> Result<Address, FetchError> {
    raw.parse::<Address>()
        .map_err(|source| FetchError::malformed(field, source))
}

fn parse_optional_u256(field: &'static str, raw: Option<&str>) -> Result<U256, FetchError> {
    let Some(raw) = raw else {
        return Ok(U256::zero());
    };
    let stripped = raw.strip_prefix("0x").unwrap_or(raw);
    U256::from_str_radix(stripped, 16).map_err(|source| FetchError::malformed(field, source))
}

#[cfg(test)]
mod tests {
    use ethers::types::U256;

    use super::RawVoucher;

    #[test]
    fn raw_voucher_converts_hex_fields() {
        let raw: RawVoucher = serde_json::from_str(
            r#"{
                "index": 3,
                "destination": "0x1111111111111111111111111111111111111111",
                "value": "0xde0b6b3a7640000",
                "payload": "0x0102",
                "epochIndex": 1,
                "input": {"id": "7", "payload": "0x6869"},
                "proof": {
                    "outputIndex": 3,
                    "outputHashesSiblings": [
                        "0x2222222222222222222222222222222222222222222222222222222222222222"
                    ]
                }
            }"#,
        )
        .unwrap();

        let voucher = raw.try_into_voucher().unwrap();
        assert_eq!(voucher.index, 3);
        assert_eq!(voucher.value, U256::exp10(18));
        assert_eq!(voucher.payload, vec![1, 2]);
        assert_eq!(voucher.input.as_ref().unwrap().payload, b"hi".to_vec());
        assert!(voucher.proof.as_ref().unwrap().is_ready());
        assert_eq!(voucher.executed, None);
    }

    #[test]
    fn malformed_value_hex_is_an_error() {
        let raw: RawVoucher = serde_json::from_str(
            r#"{
                "index": 0,
                "destination": "0x1111111111111111111111111111111111111111",
                "value": "0xnot-hex"
            }"#,
        )
        .unwrap();
        assert!(raw.try_into_voucher().is_err());
    }
}
