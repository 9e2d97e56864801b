//! Best-effort decoding of raw output payloads into human-readable action
//! descriptions.
//!
//! Payloads as fetched from the query backend are ABI-encoded calls into the
//! generic output executor interface. Decoding first strips that outer
//! encoding to recover the inner call data, then dispatches the inner call's
//! 4-byte selector over a declared template table. Every function here is
//! total: a payload that does not match anything renders as hex with a
//! `" (hex)"` suffix, an empty payload renders as `"(empty)"`, and nothing
//! ever panics or returns an error. The result is a display heuristic, not
//! validation.

use ethers::types::{
    Address,
    U256,
};

mod template;
mod unwrap;

pub use unwrap::{
    unwrap_output_call,
    OutputCall,
};

/// The marker rendered for payloads with no bytes at all.
pub const EMPTY_MARKER: &str = "(empty)";

/// The suffix appended to payloads that only render as raw hex.
pub const HEX_SUFFIX: &str = " (hex)";

/// A display-only description derived from an output's raw payload.
///
/// Never persisted; recomputed on every fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedAction {
    /// Human-readable summary of what executing the output would do.
    pub summary: String,
    /// The call target recovered from the outer encoding, if any.
    pub destination: Option<Address>,
    /// The native-asset value recovered from the outer encoding. Only
    /// plain vouchers carry one.
    pub value: Option<U256>,
}

/// Decodes a voucher or delegate-call voucher payload.
///
/// The summary follows the template table for known inner selectors and
/// falls back to hex for everything else.
#[must_use]
pub fn decode_voucher(raw: &[u8]) -> DecodedAction {
    if raw.is_empty() {
        return DecodedAction {
            summary: EMPTY_MARKER.to_string(),
            destination: None,
            value: None,
        };
    }
    let Some(call) = unwrap_output_call(raw) else {
        return DecodedAction {
            summary: hex_fallback(raw),
            destination: None,
            value: None,
        };
    };
    let (destination, value) = match &call {
        OutputCall::Voucher {
            destination,
            value,
            ..
        } => (Some(*destination), Some(*value)),
        OutputCall::DelegateCallVoucher {
            destination, ..
        } => (Some(*destination), None),
        OutputCall::Notice {
            ..
        } => (None, None),
    };
    DecodedAction {
        summary: template::render(call.into_inner()),
        destination,
        value,
    }
}

/// Decodes a voucher payload to its summary string alone.
#[must_use]
pub fn decode_voucher_payload(raw: &[u8]) -> String {
    decode_voucher(raw).summary
}

/// Decodes a notice payload.
///
/// Notices carry opaque bytes, not calls: after the outer unwrap the inner
/// bytes are rendered as strict UTF-8 where possible, hex otherwise. No
/// selector dispatch.
#[must_use]
pub fn decode_notice_payload(raw: &[u8]) -> String {
    if raw.is_empty() {
        return EMPTY_MARKER.to_string();
    }
    let Some(call) = unwrap_output_call(raw) else {
        return hex_fallback(raw);
    };
    text_or_hex(&call.into_inner())
}

/// Renders already-unwrapped bytes (input payloads, report payloads) as
/// UTF-8 text where possible, hex otherwise.
#[must_use]
pub fn decode_text_payload(raw: &[u8]) -> String {
    if raw.is_empty() {
        return EMPTY_MARKER.to_string();
    }
    text_or_hex(raw)
}

fn text_or_hex(raw: &[u8]) -> String {
    match std::str::from_utf8(raw) {
        Ok(text) => text.to_string(),
        Err(_) => hex_fallback(raw),
    }
}

pub(crate) fn hex_fallback(raw: &[u8]) -> String {
    format!("0x{}{HEX_SUFFIX}", hex::encode(raw))
}

pub(crate) fn format_address(address: &Address) -> String {
    ethers::utils::to_checksum(address, None)
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
    use hex_literal::hex;

    use super::{
        decode_notice_payload,
        decode_text_payload,
        decode_voucher,
        decode_voucher_payload,
        EMPTY_MARKER,
    };

    fn wrap_voucher(destination: Address, value: U256, inner: Vec<u8>) -> Vec<u8> {
        let mut raw = id("Voucher(address,uint256,bytes)").to_vec();
        raw.extend(ethers::abi::encode(&[
            Token::Address(destination),
            Token::Uint(value),
            Token::Bytes(inner),
        ]));
        raw
    }

    fn wrap_notice(inner: Vec<u8>) -> Vec<u8> {
        let mut raw = id("Notice(bytes)").to_vec();
        raw.extend(ethers::abi::encode(&[Token::Bytes(inner)]));
        raw
    }

    fn inner_call(selector: [u8; 4], tokens: &[Token]) -> Vec<u8> {
        let mut data = selector.to_vec();
        data.extend(ethers::abi::encode(tokens));
        data
    }

    #[test]
    fn empty_payload_renders_the_empty_marker() {
        assert_eq!(decode_voucher_payload(&[]), EMPTY_MARKER);
        assert_eq!(decode_notice_payload(&[]), EMPTY_MARKER);
        assert_eq!(decode_text_payload(&[]), EMPTY_MARKER);
    }

    #[test]
    fn erc20_transfer_round_trips_through_the_template() {
        let receiver = Address::repeat_byte(0x11);
        let amount = U256::exp10(18);
        let inner = inner_call(
            hex!("a9059cbb"),
            &[Token::Address(receiver), Token::Uint(amount)],
        );
        let raw = wrap_voucher(Address::repeat_byte(0x22), U256::zero(), inner);

        let rendered = decode_voucher_payload(&raw);
        assert!(
            rendered.contains(
                "Amount: 1000000000000000000 - Address: \
                 0x1111111111111111111111111111111111111111"
            ),
            "unexpected rendering: {rendered}"
        );
        assert!(rendered.starts_with("Erc20 Transfer"));
    }

    #[test]
    fn unwrapped_destination_and_value_are_surfaced() {
        let destination = Address::repeat_byte(0x22);
        let value = U256::from(42u64);
        let raw = wrap_voucher(destination, value, vec![0xde, 0xad, 0xbe, 0xef]);

        let decoded = decode_voucher(&raw);
        assert_eq!(decoded.destination, Some(destination));
        assert_eq!(decoded.value, Some(value));
    }

    #[test]
    fn unknown_selector_falls_back_to_hex() {
        let inner = inner_call(
            hex!("deadbeef"),
            &[Token::Address(Address::repeat_byte(0x33))],
        );
        let raw = wrap_voucher(Address::zero(), U256::zero(), inner.clone());

        let rendered = decode_voucher_payload(&raw);
        assert!(rendered.ends_with("(hex)"), "got: {rendered}");
        assert!(rendered.starts_with(&format!("0x{}", hex::encode(inner))));
    }

    #[test]
    fn inner_payload_shorter_than_a_selector_falls_back_to_hex() {
        let raw = wrap_voucher(Address::zero(), U256::zero(), vec![0xab, 0xcd]);
        assert_eq!(decode_voucher_payload(&raw), "0xabcd (hex)");
    }

    #[test]
    fn malformed_outer_encoding_falls_back_to_hex() {
        let raw = hex!("0102030405060708");
        let rendered = decode_voucher_payload(&raw);
        assert_eq!(rendered, "0x0102030405060708 (hex)");
        let rendered = decode_notice_payload(&raw);
        assert_eq!(rendered, "0x0102030405060708 (hex)");
    }

    #[test]
    fn erc721_transfer_renders_id_and_receiver() {
        let receiver = Address::repeat_byte(0x44);
        let inner = inner_call(
            hex!("42842e0e"),
            &[
                Token::Address(Address::repeat_byte(0x55)),
                Token::Address(receiver),
                Token::Uint(U256::from(7u64)),
            ],
        );
        let raw = wrap_voucher(Address::zero(), U256::zero(), inner);

        let rendered = decode_voucher_payload(&raw);
        assert_eq!(
            rendered,
            "Erc721 Transfer - Id: 7 - Address: 0x4444444444444444444444444444444444444444"
        );
    }

    #[test]
    fn erc1155_batch_transfer_joins_ids_and_amounts() {
        let receiver = Address::repeat_byte(0x66);
        let inner = inner_call(
            hex!("2eb2c2d6"),
            &[
                Token::Address(Address::zero()),
                Token::Address(receiver),
                Token::Array(vec![
                    Token::Uint(U256::from(1u64)),
                    Token::Uint(U256::from(2u64)),
                ]),
                Token::Array(vec![
                    Token::Uint(U256::from(30u64)),
                    Token::Uint(U256::from(40u64)),
                ]),
            ],
        );
        let raw = wrap_voucher(Address::zero(), U256::zero(), inner);

        let rendered = decode_voucher_payload(&raw);
        assert_eq!(
            rendered,
            "Erc1155 Batch Transfer - Ids: 1,2 Amounts: 30,40 - Address: \
             0x6666666666666666666666666666666666666666"
        );
    }

    #[test]
    fn erc721_mint_with_uri_renders_the_string() {
        let receiver = Address::repeat_byte(0x77);
        let inner = inner_call(
            hex!("d0def521"),
            &[
                Token::Address(receiver),
                Token::String("ipfs://QmToken".to_string()),
            ],
        );
        let raw = wrap_voucher(Address::zero(), U256::zero(), inner);

        let rendered = decode_voucher_payload(&raw);
        assert_eq!(
            rendered,
            "Mint Erc721 - String: ipfs://QmToken - Address: \
             0x7777777777777777777777777777777777777777"
        );
    }

    #[test]
    fn notice_text_decodes_as_utf8() {
        let raw = wrap_notice(b"hello rollup".to_vec());
        assert_eq!(decode_notice_payload(&raw), "hello rollup");
    }

    #[test]
    fn notice_binary_falls_back_to_hex() {
        let raw = wrap_notice(vec![0xff, 0xfe, 0x00]);
        assert_eq!(decode_notice_payload(&raw), "0xfffe00 (hex)");
    }

    #[test]
    fn text_payload_decodes_utf8_else_hex() {
        assert_eq!(decode_text_payload(b"deposit ok"), "deposit ok");
        assert_eq!(decode_text_payload(&[0xff, 0x00]), "0xff00 (hex)");
    }

    #[test]
    fn decoding_arbitrary_bytes_never_panics() {
        for len in 0..64usize {
            let raw: Vec<u8> = (0..len).map(|i| (i * 37 % 251) as u8).collect();
            let _ = decode_voucher_payload(&raw);
            let _ = decode_notice_payload(&raw);
            let _ = decode_text_payload(&raw);
        }
    }
}
