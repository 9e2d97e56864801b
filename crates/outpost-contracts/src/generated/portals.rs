use ethers::contract::abigen;

abigen!(
    EtherPortal,
    r#"[
        function depositEther(address appContract, bytes execLayerData) payable
    ]"#
);

abigen!(
    Erc20Portal,
    r#"[
        function depositERC20Tokens(address token, address appContract, uint256 value, bytes execLayerData)
    ]"#
);

abigen!(
    Erc721Portal,
    r#"[
        function depositERC721Token(address token, address appContract, uint256 tokenId, bytes baseLayerData, bytes execLayerData)
    ]"#
);

abigen!(
    Erc1155SinglePortal,
    r#"[
        function depositSingleERC1155Token(address token, address appContract, uint256 tokenId, uint256 value, bytes baseLayerData, bytes execLayerData)
    ]"#
);

abigen!(
    Erc1155BatchPortal,
    r#"[
        function depositBatchERC1155Token(address token, address appContract, uint256[] tokenIds, uint256[] values, bytes baseLayerData, bytes execLayerData)
    ]"#
);
