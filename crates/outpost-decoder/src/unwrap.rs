use std::sync::OnceLock;

use ethers::{
    abi::{
        self,
        ParamType,
        Token,
    },
    types::{
        Address,
        U256,
    },
    utils::id,
};

const VOUCHER_SIGNATURE: &str = "Voucher(address,uint256,bytes)";
const DELEGATE_CALL_VOUCHER_SIGNATURE: &str = "DelegateCallVoucher(address,bytes)";
const NOTICE_SIGNATURE: &str = "Notice(bytes)";

/// A call into the generic output executor interface, recovered from a raw
/// payload by stripping its outer ABI encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputCall {
    Voucher {
        destination: Address,
        value: U256,
        payload: Vec<u8>,
    },
    DelegateCallVoucher {
        destination: Address,
        payload: Vec<u8>,
    },
    Notice {
        payload: Vec<u8>,
    },
}

impl OutputCall {
    /// Returns the inner call data, discarding the wrapper.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        match self {
            Self::Voucher {
                payload, ..
            }
            | Self::DelegateCallVoucher {
                payload, ..
            }
            | Self::Notice {
                payload,
            } => payload,
        }
    }
}

struct OutputSelectors {
    voucher: [u8; 4],
    delegate_call_voucher: [u8; 4],
    notice: [u8; 4],
}

fn output_selectors() -> &'static OutputSelectors {
    static SELECTORS: OnceLock<OutputSelectors> = OnceLock::new();
    SELECTORS.get_or_init(|| OutputSelectors {
        voucher: id(VOUCHER_SIGNATURE),
        delegate_call_voucher: id(DELEGATE_CALL_VOUCHER_SIGNATURE),
        notice: id(NOTICE_SIGNATURE),
    })
}

/// Strips the outer executor-call encoding from a raw payload.
///
/// Returns `None` if the payload is shorter than a selector, the leading
/// selector does not belong to the output interface, or the argument tuple
/// does not decode against the matched signature.
#[must_use]
pub fn unwrap_output_call(raw: &[u8]) -> Option<OutputCall> {
    let (selector, data) = raw.split_first_chunk::<4>()?;
    let selectors = output_selectors();
    if *selector == selectors.voucher {
        let mut tokens = abi::decode(
            &[ParamType::Address, ParamType::Uint(256), ParamType::Bytes],
            data,
        )
        .ok()?
        .into_iter();
        Some(OutputCall::Voucher {
            destination: tokens.next()?.into_address()?,
            value: tokens.next()?.into_uint()?,
            payload: tokens.next()?.into_bytes()?,
        })
    } else if *selector == selectors.delegate_call_voucher {
        let mut tokens = abi::decode(&[ParamType::Address, ParamType::Bytes], data)
            .ok()?
            .into_iter();
        Some(OutputCall::DelegateCallVoucher {
            destination: tokens.next()?.into_address()?,
            payload: tokens.next()?.into_bytes()?,
        })
    } else if *selector == selectors.notice {
        let mut tokens = abi::decode(&[ParamType::Bytes], data).ok()?.into_iter();
        Some(OutputCall::Notice {
            payload: tokens.next()?.into_bytes()?,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use ethers::{
        abi::Token,
        types::{
            Address,
            U256,
        },
        utils::id,
    };

    use super::{
        unwrap_output_call,
        OutputCall,
    };

    #[test]
    fn voucher_call_unwraps_to_its_parts() {
        let destination = Address::repeat_byte(0xaa);
        let mut raw = id("Voucher(address,uint256,bytes)").to_vec();
        raw.extend(ethers::abi::encode(&[
            Token::Address(destination),
            Token::Uint(U256::from(5u64)),
            Token::Bytes(vec![1, 2, 3]),
        ]));

        let Some(OutputCall::Voucher {
            destination: got_destination,
            value,
            payload,
        }) = unwrap_output_call(&raw)
        else {
            panic!("expected a voucher call");
        };
        assert_eq!(got_destination, destination);
        assert_eq!(value, U256::from(5u64));
        assert_eq!(payload, vec![1, 2, 3]);
    }

    #[test]
    fn delegate_call_voucher_unwraps_without_a_value() {
        let destination = Address::repeat_byte(0xbb);
        let mut raw = id("DelegateCallVoucher(address,bytes)").to_vec();
        raw.extend(ethers::abi::encode(&[
            Token::Address(destination),
            Token::Bytes(vec![9, 9]),
        ]));

        let Some(OutputCall::DelegateCallVoucher {
            destination: got_destination,
            payload,
        }) = unwrap_output_call(&raw)
        else {
            panic!("expected a delegate-call voucher");
        };
        assert_eq!(got_destination, destination);
        assert_eq!(payload, vec![9, 9]);
    }

    #[test]
    fn foreign_selector_does_not_unwrap() {
        let mut raw = vec![0xde, 0xad, 0xbe, 0xef];
        raw.extend(ethers::abi::encode(&[Token::Bytes(vec![1])]));
        assert_eq!(unwrap_output_call(&raw), None);
    }

    #[test]
    fn truncated_argument_tuple_does_not_unwrap() {
        let mut raw = id("Notice(bytes)").to_vec();
        raw.extend([0u8; 8]);
        assert_eq!(unwrap_output_call(&raw), None);
    }
}
