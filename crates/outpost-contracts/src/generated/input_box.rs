use ethers::contract::abigen;

abigen!(
    InputBox,
    r#"[
        function addInput(address appContract, bytes payload) returns (bytes32)
    ]"#
);
