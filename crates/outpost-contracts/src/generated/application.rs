use ethers::contract::abigen;

abigen!(
    Application,
    r#"[
        struct OutputValidityProof { uint64 outputIndex; bytes32[] outputHashesSiblings; }
        function executeOutput(bytes output, OutputValidityProof proof)
        function validateOutput(bytes output, OutputValidityProof proof) view
        function wasOutputExecuted(uint256 outputIndex) view returns (bool)
    ]"#
);
