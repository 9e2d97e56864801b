use serde::Deserialize;
use tracing::instrument;

use crate::{
    parse_hex,
    FetchError,
};

/// Client for the inspect endpoint of one chain.
///
/// The payload travels either as a URL path segment (GET) or as the request
/// body (POST); the response shape is the same for both.
#[derive(Clone, Debug)]
pub struct InspectClient {
    http_client: reqwest::Client,
    url: String,
}

impl InspectClient {
    /// Creates a client against the inspect endpoint at `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Sends an inspect request with the payload as a path segment.
    ///
    /// # Errors
    /// Returns an error if the transport fails or the response does not
    /// parse.
    #[instrument(skip(self), err)]
    pub async fn get(&self, payload: &str) -> Result<InspectResponse, FetchError> {
        let response = self
            .http_client
            .get(format!("{}/{payload}", self.url))
            .send()
            .await
            .map_err(FetchError::transport)?;
        Self::parse(response).await
    }

    /// Sends an inspect request with the payload as the request body.
    ///
    /// # Errors
    /// Returns an error if the transport fails or the response does not
    /// parse.
    #[instrument(skip_all, err)]
    pub async fn post(&self, payload: Vec<u8>) -> Result<InspectResponse, FetchError> {
        let response = self
            .http_client
            .post(&self.url)
            .body(payload)
            .send()
            .await
            .map_err(FetchError::transport)?;
        Self::parse(response).await
    }

    async fn parse(response: reqwest::Response) -> Result<InspectResponse, FetchError> {
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::status(status));
        }
        response.json().await.map_err(FetchError::transport)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct InspectResponse {
    #[serde(default)]
    pub reports: Vec<InspectReport>,
    #[serde(default)]
    pub metadata: Option<InspectMetadata>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub exception_payload: Option<String>,
}

impl InspectResponse {
    /// Decodes the exception payload, if the machine reported one.
    ///
    /// # Errors
    /// Returns an error if the payload is not valid hex.
    pub fn exception_payload_bytes(&self) -> Result<Option<Vec<u8>>, FetchError> {
        self.exception_payload
            .as_deref()
            .map(|raw| parse_hex("exception_payload", raw))
            .transpose()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct InspectReport {
    pub payload: String,
}

impl InspectReport {
    /// Decodes the report payload.
    ///
    /// # Errors
    /// Returns an error if the payload is not valid hex.
    pub fn payload_bytes(&self) -> Result<Vec<u8>, FetchError> {
        parse_hex("reports.payload", &self.payload)
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct InspectMetadata {
    pub active_epoch_index: u64,
    pub current_input_index: u64,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        matchers::{
            body_bytes,
            method,
            path,
        },
        Mock,
        MockServer,
        ResponseTemplate,
    };

    use super::InspectClient;

    fn example_response() -> serde_json::Value {
        json!({
            "reports": [{"payload": "0x68656c6c6f"}],
            "metadata": {"active_epoch_index": 2, "current_input_index": 8},
            "status": "Accepted",
            "exception_payload": null
        })
    }

    #[tokio::test]
    async fn get_sends_the_payload_as_a_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/inspect/balance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(example_response()))
            .mount(&server)
            .await;

        let client = InspectClient::new(format!("{}/inspect", server.uri()));
        let response = client.get("balance").await.unwrap();

        assert_eq!(response.status.as_deref(), Some("Accepted"));
        let metadata = response.metadata.unwrap();
        assert_eq!(metadata.active_epoch_index, 2);
        assert_eq!(metadata.current_input_index, 8);
        assert_eq!(response.reports[0].payload_bytes().unwrap(), b"hello");
    }

    #[tokio::test]
    async fn post_sends_the_payload_as_the_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/inspect"))
            .and(body_bytes(b"balance".to_vec()))
            .respond_with(ResponseTemplate::new(200).set_body_json(example_response()))
            .mount(&server)
            .await;

        let client = InspectClient::new(format!("{}/inspect", server.uri()));
        let response = client.post(b"balance".to_vec()).await.unwrap();
        assert_eq!(response.reports.len(), 1);
    }

    #[tokio::test]
    async fn error_status_surfaces_as_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = InspectClient::new(format!("{}/inspect", server.uri()));
        assert!(client.get("balance").await.is_err());
    }
}
