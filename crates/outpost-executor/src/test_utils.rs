use ethers::signers::LocalWallet;
use serde_json::json;
use wiremock::ResponseTemplate;

pub(crate) const TEST_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub(crate) fn test_wallet() -> LocalWallet {
    TEST_KEY.parse().unwrap()
}

/// Responds to a JSON-RPC request echoing its id, so a mock holds no matter
/// how many requests the provider issued before it.
pub(crate) struct RpcResponse(pub(crate) serde_json::Value);

impl wiremock::Respond for RpcResponse {
    fn respond(&self, request: &wiremock::Request) -> ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        let mut response = self.0.clone();
        response["jsonrpc"] = json!("2.0");
        response["id"] = body["id"].clone();
        ResponseTemplate::new(200).set_body_json(response)
    }
}
