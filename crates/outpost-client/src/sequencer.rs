use ethers::{
    abi::Token,
    contract::{
        Eip712,
        EthAbiType,
    },
    signers::{
        LocalWallet,
        Signer as _,
    },
    types::{
        Address,
        Bytes,
        U256,
    },
};
use serde::Deserialize;
use serde_json::json;
use tracing::{
    debug,
    instrument,
};

use crate::FetchError;

/// The typed message the sequencer accepts. The domain values are fixed by
/// the sequencer protocol and do not vary with the connected chain.
#[derive(Clone, Debug, Eip712, EthAbiType)]
#[eip712(
    name = "CartesiDomain",
    version = "0.0.1",
    chain_id = 11_155_111,
    verifying_contract = "0x0000000000000000000000000000000000000000"
)]
pub struct CartesiMessage {
    pub app: Address,
    pub nonce: u64,
    pub max_gas_price: u128,
    pub data: Bytes,
}

/// The input id assigned by the sequencer on acceptance.
#[derive(Clone, Debug, Deserialize)]
pub struct SubmitInputResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
struct NonceResponse {
    nonce: u64,
}

/// Client for the L2 submission path: nonce fetch, typed-message signing,
/// and HTTP submission to the sequencer endpoint.
///
/// This is the lower-latency alternative to adding an input directly
/// on-chain; both paths feed the same application.
#[derive(Clone, Debug)]
pub struct SequencerClient {
    http_client: reqwest::Client,
    nonce_url: String,
    transaction_url: String,
}

impl SequencerClient {
    /// Creates a client against the sequencer at `base_url`.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            http_client: reqwest::Client::new(),
            nonce_url: format!("{base}/nonce"),
            transaction_url: format!("{base}/transaction"),
        }
    }

    /// Fetches the next nonce for `msg_sender` on `app_contract`.
    ///
    /// # Errors
    /// Returns an error if the transport fails or the response does not
    /// parse.
    #[instrument(skip(self), err)]
    pub async fn fetch_nonce(
        &self,
        msg_sender: Address,
        app_contract: Address,
    ) -> Result<u64, FetchError> {
        let response = self
            .http_client
            .post(&self.nonce_url)
            .json(&json!({
                "msg_sender": format!("{msg_sender:?}"),
                "app_contract": format!("{app_contract:?}"),
            }))
            .send()
            .await
            .map_err(FetchError::transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::status(status));
        }
        let body: NonceResponse = response.json().await.map_err(FetchError::transport)?;
        Ok(body.nonce)
    }

    /// Signs `data` as a typed sequencer message and submits it.
    ///
    /// Fetches the wallet's nonce, signs the message under the fixed domain,
    /// and posts the signature together with the ABI-encoded message.
    ///
    /// # Errors
    /// Returns an error if the nonce fetch, the signing, or the submission
    /// fails.
    #[instrument(skip(self, wallet, data), fields(app = %app), err)]
    pub async fn submit_input(
        &self,
        wallet: &LocalWallet,
        app: Address,
        data: Vec<u8>,
        max_gas_price: u128,
    ) -> Result<SubmitInputResponse, FetchError> {
        let nonce = self.fetch_nonce(wallet.address(), app).await?;
        debug!(nonce, "fetched sequencer nonce");

        let message = CartesiMessage {
            app,
            nonce,
            max_gas_price,
            data: data.into(),
        };
        let signature = wallet
            .sign_typed_data(&message)
            .await
            .map_err(FetchError::sign)?;

        let response = self
            .http_client
            .post(&self.transaction_url)
            .json(&json!({
                "signature": format!("0x{signature}"),
                "message": encode_message(&message),
            }))
            .send()
            .await
            .map_err(FetchError::transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::status(status));
        }
        response.json().await.map_err(FetchError::transport)
    }
}

fn encode_message(message: &CartesiMessage) -> String {
    let tokens = [
        Token::Address(message.app),
        Token::Uint(U256::from(message.nonce)),
        Token::Uint(U256::from(message.max_gas_price)),
        Token::Bytes(message.data.to_vec()),
    ];
    format!("0x{}", hex::encode(ethers::abi::encode(&tokens)))
}

#[cfg(test)]
mod tests {
    use ethers::{
        signers::{
            LocalWallet,
            Signer as _,
        },
        types::{
            transaction::eip712::Eip712 as _,
            Address,
            H256,
        },
    };
    use serde_json::json;
    use wiremock::{
        matchers::{
            body_partial_json,
            method,
            path,
        },
        Mock,
        MockServer,
        ResponseTemplate,
    };

    use super::{
        encode_message,
        CartesiMessage,
        SequencerClient,
    };

    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn test_wallet() -> LocalWallet {
        TEST_KEY.parse().unwrap()
    }

    fn test_app() -> Address {
        "0xab7528bb862fb57e8a2bcd567a2e929a0be56a5e".parse().unwrap()
    }

    #[tokio::test]
    async fn typed_message_signature_recovers_to_the_wallet() {
        let wallet = test_wallet();
        let message = CartesiMessage {
            app: test_app(),
            nonce: 1,
            max_gas_price: 10,
            data: vec![0xca, 0xfe].into(),
        };
        let signature = wallet.sign_typed_data(&message).await.unwrap();
        let digest = H256::from(message.encode_eip712().unwrap());
        assert_eq!(signature.recover(digest).unwrap(), wallet.address());
    }

    #[tokio::test]
    async fn submit_input_posts_the_signed_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/nonce"))
            .and(body_partial_json(json!({
                "app_contract": "0xab7528bb862fb57e8a2bcd567a2e929a0be56a5e"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"nonce": 7})))
            .mount(&server)
            .await;

        let expected_message = encode_message(&CartesiMessage {
            app: test_app(),
            nonce: 7,
            max_gas_price: 10,
            data: vec![0xca, 0xfe].into(),
        });
        Mock::given(method("POST"))
            .and(path("/transaction"))
            .and(body_partial_json(json!({"message": expected_message})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "0x1234"})),
            )
            .mount(&server)
            .await;

        let client = SequencerClient::new(&server.uri());
        let response = client
            .submit_input(&test_wallet(), test_app(), vec![0xca, 0xfe], 10)
            .await
            .unwrap();
        assert_eq!(response.id, "0x1234");
    }

    #[tokio::test]
    async fn rejected_submission_surfaces_as_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/nonce"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"nonce": 0})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/transaction"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let client = SequencerClient::new(&server.uri());
        let err = client
            .submit_input(&test_wallet(), test_app(), vec![], 10)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("400"));
    }
}
