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

use crate::{
    format_address,
    hex_fallback,
};

/// One row of the dispatch table: a known token-standard call, the schema of
/// the arguments to decode, and the template rendering them.
///
/// Adding a new recognized call means adding a row here; the dispatch in
/// [`render`] does not change.
pub(crate) struct Template {
    pub(crate) signature: &'static str,
    pub(crate) selector: [u8; 4],
    pub(crate) schema: Vec<ParamType>,
    pub(crate) render: fn(Vec<Token>) -> Option<String>,
}

impl Template {
    fn new(
        signature: &'static str,
        schema: Vec<ParamType>,
        render: fn(Vec<Token>) -> Option<String>,
    ) -> Self {
        Self {
            signature,
            selector: id(signature),
            schema,
            render,
        }
    }
}

pub(crate) fn table() -> &'static [Template] {
    static TABLE: OnceLock<Vec<Template>> = OnceLock::new();
    TABLE.get_or_init(|| {
        vec![
            Template::new(
                "transfer(address,uint256)",
                vec![ParamType::Address, ParamType::Uint(256)],
                erc20_transfer,
            ),
            Template::new(
                "safeTransferFrom(address,address,uint256)",
                vec![ParamType::Address, ParamType::Address, ParamType::Uint(256)],
                erc721_transfer,
            ),
            // the 1155 transfers carry a trailing `bytes data` argument; the
            // templates only decode the leading static arguments.
            Template::new(
                "safeTransferFrom(address,address,uint256,uint256,bytes)",
                vec![
                    ParamType::Address,
                    ParamType::Address,
                    ParamType::Uint(256),
                    ParamType::Uint(256),
                ],
                erc1155_single_transfer,
            ),
            Template::new(
                "safeBatchTransferFrom(address,address,uint256[],uint256[],bytes)",
                vec![
                    ParamType::Address,
                    ParamType::Address,
                    ParamType::Array(Box::new(ParamType::Uint(256))),
                    ParamType::Array(Box::new(ParamType::Uint(256))),
                ],
                erc1155_batch_transfer,
            ),
            Template::new(
                "mint(address,string)",
                vec![ParamType::Address, ParamType::String],
                erc721_mint_with_uri,
            ),
            Template::new("mintTo(address)", vec![ParamType::Address], erc721_mint),
            Template::new("mint(address)", vec![ParamType::Address], erc721_mint),
        ]
    })
}

/// Renders inner call data through the template table.
///
/// Anything the table does not recognize (unknown selector, argument decode
/// failure, data shorter than a selector) renders as hex.
pub(crate) fn render(inner: Vec<u8>) -> String {
    let Some((selector, args)) = inner.split_first_chunk::<4>() else {
        return hex_fallback(&inner);
    };
    for template in table() {
        if template.selector == *selector {
            if let Some(rendered) = abi::decode(&template.schema, args)
                .ok()
                .and_then(template.render)
            {
                return rendered;
            }
            break;
        }
    }
    hex_fallback(&inner)
}

fn address_at(tokens: &[Token], index: usize) -> Option<Address> {
    tokens.get(index)?.clone().into_address()
}

fn uint_at(tokens: &[Token], index: usize) -> Option<U256> {
    tokens.get(index)?.clone().into_uint()
}

fn string_at(tokens: &[Token], index: usize) -> Option<String> {
    tokens.get(index)?.clone().into_string()
}

fn uint_list_at(tokens: &[Token], index: usize) -> Option<String> {
    let values = tokens
        .get(index)?
        .clone()
        .into_array()?
        .into_iter()
        .map(|token| token.into_uint().map(|value| value.to_string()))
        .collect::<Option<Vec<_>>>()?;
    Some(values.join(","))
}

fn erc20_transfer(tokens: Vec<Token>) -> Option<String> {
    let receiver = address_at(&tokens, 0)?;
    let amount = uint_at(&tokens, 1)?;
    Some(format!(
        "Erc20 Transfer - Amount: {amount} - Address: {}",
        format_address(&receiver)
    ))
}

fn erc721_transfer(tokens: Vec<Token>) -> Option<String> {
    let receiver = address_at(&tokens, 1)?;
    let token_id = uint_at(&tokens, 2)?;
    Some(format!(
        "Erc721 Transfer - Id: {token_id} - Address: {}",
        format_address(&receiver)
    ))
}

fn erc1155_single_transfer(tokens: Vec<Token>) -> Option<String> {
    let receiver = address_at(&tokens, 1)?;
    let token_id = uint_at(&tokens, 2)?;
    let amount = uint_at(&tokens, 3)?;
    Some(format!(
        "Erc1155 Single Transfer - Id: {token_id} Amount: {amount} - Address: {}",
        format_address(&receiver)
    ))
}

fn erc1155_batch_transfer(tokens: Vec<Token>) -> Option<String> {
    let receiver = address_at(&tokens, 1)?;
    let ids = uint_list_at(&tokens, 2)?;
    let amounts = uint_list_at(&tokens, 3)?;
    Some(format!(
        "Erc1155 Batch Transfer - Ids: {ids} Amounts: {amounts} - Address: {}",
        format_address(&receiver)
    ))
}

fn erc721_mint_with_uri(tokens: Vec<Token>) -> Option<String> {
    let receiver = address_at(&tokens, 0)?;
    let uri = string_at(&tokens, 1)?;
    Some(format!(
        "Mint Erc721 - String: {uri} - Address: {}",
        format_address(&receiver)
    ))
}

fn erc721_mint(tokens: Vec<Token>) -> Option<String> {
    let receiver = address_at(&tokens, 0)?;
    Some(format!(
        "Mint Erc721 - Address: {}",
        format_address(&receiver)
    ))
}
