use ethers::contract::abigen;

abigen!(
    IERC20,
    r#"[
        function allowance(address owner, address spender) view returns (uint256)
        function approve(address spender, uint256 value) returns (bool)
    ]"#
);

abigen!(
    IERC721,
    r#"[
        function getApproved(uint256 tokenId) view returns (address)
        function approve(address to, uint256 tokenId)
    ]"#
);

abigen!(
    IERC1155,
    r#"[
        function isApprovedForAll(address owner, address operator) view returns (bool)
        function setApprovalForAll(address operator, bool approved)
    ]"#
);
