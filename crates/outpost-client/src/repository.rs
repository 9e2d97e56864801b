use std::sync::Arc;

use ethers::types::Address;
use serde::{
    de::DeserializeOwned,
    Deserialize,
};
use serde_json::json;
use tracing::{
    debug,
    instrument,
};

use crate::{
    types::{
        RawDelegateCallVoucher,
        RawNotice,
        RawReport,
        RawVoucher,
    },
    DelegateCallVoucher,
    FetchError,
    Notice,
    Output,
    OutputKind,
    Report,
    Voucher,
};

const NOTICES_QUERY: &str = "query { notices { edges { node { index payload epochIndex input { \
                             id payload } } } } }";
const NOTICE_QUERY: &str = "query Notice($outputIndex: Int!) { notice(outputIndex: \
                            $outputIndex) { index payload epochIndex input { id payload } proof \
                            { outputIndex outputHashesSiblings } } }";
const VOUCHERS_QUERY: &str = "query { vouchers { edges { node { index destination payload value \
                              epochIndex input { id payload } } } } }";
const VOUCHER_QUERY: &str = "query Voucher($outputIndex: Int!) { voucher(outputIndex: \
                             $outputIndex) { index destination payload value epochIndex input { \
                             id payload } proof { outputIndex outputHashesSiblings } } }";
const DELEGATE_CALL_VOUCHERS_QUERY: &str = "query { delegateCallVouchers { edges { node { index \
                                            destination payload epochIndex input { id payload } \
                                            } } } }";
const DELEGATE_CALL_VOUCHER_QUERY: &str = "query DelegateCallVoucher($outputIndex: Int!) { \
                                           delegateCallVoucher(outputIndex: $outputIndex) { \
                                           index destination payload epochIndex input { id \
                                           payload } proof { outputIndex outputHashesSiblings } \
                                           } }";
const REPORTS_QUERY: &str = "query { reports { edges { node { index payload epochIndex input { \
                             id payload } } } } }";
const REPORT_QUERY: &str = "query Report($outputIndex: Int!) { report(outputIndex: \
                            $outputIndex) { index payload epochIndex input { id payload } } }";

/// Capability to ask the target chain whether an output index was already
/// executed. Implemented by the chain-facing side; the repository only
/// consumes it.
#[async_trait::async_trait]
pub trait ExecutionStateProvider: Send + Sync {
    async fn was_output_executed(
        &self,
        output_index: u64,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync + 'static>>;
}

/// Additive restrictions on a listing. Every set field must hold for an
/// output to be returned; `offset` and `limit` page the ordered result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputFilter {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub epoch_index: Option<u64>,
    pub input_index: Option<u64>,
    pub output_type: Option<OutputKind>,
    pub voucher_address: Option<Address>,
}

impl OutputFilter {
    fn matches(&self, output: &Output) -> bool {
        if let Some(kind) = self.output_type {
            if output.kind() != kind {
                return false;
            }
        }
        if let Some(epoch_index) = self.epoch_index {
            if output.epoch_index() != Some(epoch_index) {
                return false;
            }
        }
        if let Some(input_index) = self.input_index {
            let id = output
                .input()
                .and_then(|input| input.id.parse::<u64>().ok());
            if id != Some(input_index) {
                return false;
            }
        }
        if let Some(address) = self.voucher_address {
            if output.destination() != Some(address) {
                return false;
            }
        }
        true
    }
}

/// Read access to the outputs of one (chain, application) pair.
///
/// Outputs and proofs are owned by the query backend; everything returned
/// here is an ephemeral copy. Failures are surfaced, never retried.
#[derive(Clone)]
pub struct OutputRepository {
    http_client: reqwest::Client,
    url: String,
    execution_state: Option<Arc<dyn ExecutionStateProvider>>,
}

impl std::fmt::Debug for OutputRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputRepository")
            .field("url", &self.url)
            .field("execution_state", &self.execution_state.is_some())
            .finish_non_exhaustive()
    }
}

impl OutputRepository {
    /// Creates a repository against the query endpoint at `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            url: url.into(),
            execution_state: None,
        }
    }

    /// Attaches a chain-backed execution-state provider. Without one,
    /// execution-state enrichment is silently skipped.
    #[must_use]
    pub fn with_execution_state(mut self, provider: Arc<dyn ExecutionStateProvider>) -> Self {
        self.execution_state = Some(provider);
        self
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Lists outputs of one kind, filtered and ordered most recent first.
    ///
    /// # Errors
    /// Returns an error if the transport fails or the backend returns
    /// malformed data.
    #[instrument(skip(self, filter), fields(kind = %kind), err)]
    pub async fn list(
        &self,
        kind: OutputKind,
        filter: &OutputFilter,
    ) -> Result<Vec<Output>, FetchError> {
        let outputs = match kind {
            OutputKind::Notice => collect(self.fetch_notices().await?, Output::Notice),
            OutputKind::Voucher => collect(self.fetch_vouchers().await?, Output::Voucher),
            OutputKind::DelegateCallVoucher => collect(
                self.fetch_delegate_call_vouchers().await?,
                Output::DelegateCallVoucher,
            ),
            OutputKind::Report => collect(self.fetch_reports().await?, Output::Report),
        };
        Ok(apply_filter_and_order(outputs, filter))
    }

    /// Lists outputs of every kind in one ordered sequence.
    ///
    /// The fetches run sequentially; overlapping invocations are neither
    /// coalesced nor cancelled.
    ///
    /// # Errors
    /// Returns an error if any of the underlying fetches fails.
    #[instrument(skip(self, filter), err)]
    pub async fn list_all(&self, filter: &OutputFilter) -> Result<Vec<Output>, FetchError> {
        let mut outputs = collect(self.fetch_notices().await?, Output::Notice);
        outputs.extend(collect(self.fetch_vouchers().await?, Output::Voucher));
        outputs.extend(collect(
            self.fetch_delegate_call_vouchers().await?,
            Output::DelegateCallVoucher,
        ));
        outputs.extend(collect(self.fetch_reports().await?, Output::Report));
        Ok(apply_filter_and_order(outputs, filter))
    }

    /// Fetches a single output by kind and index, with its proof and (for
    /// vouchers) its execution state.
    ///
    /// # Errors
    /// Returns an error if the transport fails, the backend returns
    /// malformed data, or the execution-state read fails.
    pub async fn get(&self, kind: OutputKind, index: u64) -> Result<Option<Output>, FetchError> {
        let output = match kind {
            OutputKind::Notice => self.notice(index).await?.map(Output::Notice),
            OutputKind::Voucher => self.voucher(index).await?.map(Output::Voucher),
            OutputKind::DelegateCallVoucher => self
                .delegate_call_voucher(index)
                .await?
                .map(Output::DelegateCallVoucher),
            OutputKind::Report => self.report(index).await?.map(Output::Report),
        };
        Ok(output)
    }

    /// Fetches a single notice with its proof.
    ///
    /// # Errors
    /// Returns an error if the transport fails or the backend returns
    /// malformed data.
    #[instrument(skip(self), err)]
    pub async fn notice(&self, index: u64) -> Result<Option<Notice>, FetchError> {
        let data: NoticeData = self
            .graphql(NOTICE_QUERY, json!({"outputIndex": index}))
            .await?;
        data.notice.map(RawNotice::try_into_notice).transpose()
    }

    /// Fetches a single voucher with its proof and execution state.
    ///
    /// # Errors
    /// Returns an error if the transport fails, the backend returns
    /// malformed data, or the execution-state read fails.
    #[instrument(skip(self), err)]
    pub async fn voucher(&self, index: u64) -> Result<Option<Voucher>, FetchError> {
        let data: VoucherData = self
            .graphql(VOUCHER_QUERY, json!({"outputIndex": index}))
            .await?;
        let Some(raw) = data.voucher else {
            return Ok(None);
        };
        let mut voucher = raw.try_into_voucher()?;
        voucher.executed = self.read_execution_state(voucher.index).await?;
        Ok(Some(voucher))
    }

    /// Fetches a single delegate-call voucher with its proof and execution
    /// state.
    ///
    /// # Errors
    /// Returns an error if the transport fails, the backend returns
    /// malformed data, or the execution-state read fails.
    #[instrument(skip(self), err)]
    pub async fn delegate_call_voucher(
        &self,
        index: u64,
    ) -> Result<Option<DelegateCallVoucher>, FetchError> {
        let data: DelegateCallVoucherData = self
            .graphql(DELEGATE_CALL_VOUCHER_QUERY, json!({"outputIndex": index}))
            .await?;
        let Some(raw) = data.delegate_call_voucher else {
            return Ok(None);
        };
        let mut voucher = raw.try_into_delegate_call_voucher()?;
        voucher.executed = self.read_execution_state(voucher.index).await?;
        Ok(Some(voucher))
    }

    /// Fetches a single report.
    ///
    /// # Errors
    /// Returns an error if the transport fails or the backend returns
    /// malformed data.
    #[instrument(skip(self), err)]
    pub async fn report(&self, index: u64) -> Result<Option<Report>, FetchError> {
        let data: ReportData = self
            .graphql(REPORT_QUERY, json!({"outputIndex": index}))
            .await?;
        data.report.map(RawReport::try_into_report).transpose()
    }

    async fn fetch_notices(&self) -> Result<Vec<Notice>, FetchError> {
        let data: NoticesData = self.graphql(NOTICES_QUERY, json!({})).await?;
        nodes(data.notices)
            .map(RawNotice::try_into_notice)
            .collect()
    }

    async fn fetch_vouchers(&self) -> Result<Vec<Voucher>, FetchError> {
        let data: VouchersData = self.graphql(VOUCHERS_QUERY, json!({})).await?;
        nodes(data.vouchers)
            .map(RawVoucher::try_into_voucher)
            .collect()
    }

    async fn fetch_delegate_call_vouchers(&self) -> Result<Vec<DelegateCallVoucher>, FetchError> {
        let data: DelegateCallVouchersData =
            self.graphql(DELEGATE_CALL_VOUCHERS_QUERY, json!({})).await?;
        nodes(data.delegate_call_vouchers)
            .map(RawDelegateCallVoucher::try_into_delegate_call_voucher)
            .collect()
    }

    async fn fetch_reports(&self) -> Result<Vec<Report>, FetchError> {
        let data: ReportsData = self.graphql(REPORTS_QUERY, json!({})).await?;
        nodes(data.reports)
            .map(RawReport::try_into_report)
            .collect()
    }

    async fn read_execution_state(&self, output_index: u64) -> Result<Option<bool>, FetchError> {
        let Some(provider) = &self.execution_state else {
            return Ok(None);
        };
        let executed = provider
            .was_output_executed(output_index)
            .await
            .map_err(|source| FetchError::execution_state(output_index, source))?;
        debug!(output_index, executed, "read execution state from chain");
        Ok(Some(executed))
    }

    async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, FetchError> {
        let response = self
            .http_client
            .post(&self.url)
            .json(&json!({"query": query, "variables": variables}))
            .send()
            .await
            .map_err(FetchError::transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::status(status));
        }
        let body: GraphqlResponse<T> = response.json().await.map_err(FetchError::transport)?;
        if let Some(errors) = body.errors {
            if !errors.is_empty() {
                let messages = errors
                    .into_iter()
                    .map(|error| error.message)
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(FetchError::graphql(messages));
            }
        }
        body.data.ok_or_else(FetchError::missing_data)
    }
}

fn collect<T, O>(items: Vec<T>, wrap: fn(T) -> O) -> Vec<O> {
    items.into_iter().map(wrap).collect()
}

fn nodes<T>(connection: Option<Connection<T>>) -> impl Iterator<Item = T> {
    connection
        .map(|connection| connection.edges)
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .map(|edge| edge.node)
}

fn apply_filter_and_order(mut outputs: Vec<Output>, filter: &OutputFilter) -> Vec<Output> {
    outputs.retain(|output| filter.matches(output));
    outputs.sort_by(|a, b| b.index().cmp(&a.index()));
    let paged = outputs.into_iter().skip(filter.offset.unwrap_or(0));
    match filter.limit {
        Some(limit) => paged.take(limit).collect(),
        None => paged.collect(),
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    // a backend may serve explicit nulls in the edge list; skip them
    edges: Vec<Option<Edge<T>>>,
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    node: T,
}

#[derive(Debug, Deserialize)]
struct NoticesData {
    notices: Option<Connection<RawNotice>>,
}

#[derive(Debug, Deserialize)]
struct NoticeData {
    notice: Option<RawNotice>,
}

#[derive(Debug, Deserialize)]
struct VouchersData {
    vouchers: Option<Connection<RawVoucher>>,
}

#[derive(Debug, Deserialize)]
struct VoucherData {
    voucher: Option<RawVoucher>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DelegateCallVouchersData {
    delegate_call_vouchers: Option<Connection<RawDelegateCallVoucher>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DelegateCallVoucherData {
    delegate_call_voucher: Option<RawDelegateCallVoucher>,
}

#[derive(Debug, Deserialize)]
struct ReportsData {
    reports: Option<Connection<RawReport>>,
}

#[derive(Debug, Deserialize)]
struct ReportData {
    report: Option<RawReport>,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use wiremock::{
        matchers::{
            method,
            path,
        },
        Mock,
        MockServer,
        ResponseTemplate,
    };

    use super::{
        ExecutionStateProvider,
        OutputFilter,
        OutputRepository,
    };
    use crate::OutputKind;

    const APPLICATION: &str = "0xab7528bb862fb57e8a2bcd567a2e929a0be56a5e";

    async fn mock_backend(body: serde_json::Value) -> (MockServer, OutputRepository) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/graphql/{APPLICATION}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        let repository = OutputRepository::new(format!("{}/graphql/{APPLICATION}", server.uri()));
        (server, repository)
    }

    fn voucher_node(index: u64, epoch_index: u64, destination: &str, input_id: &str) -> serde_json::Value {
        json!({
            "node": {
                "index": index,
                "destination": destination,
                "payload": "0x",
                "value": "0x0",
                "epochIndex": epoch_index,
                "input": {"id": input_id, "payload": "0x6869"}
            }
        })
    }

    const DESTINATION_A: &str = "0x1111111111111111111111111111111111111111";
    const DESTINATION_B: &str = "0x2222222222222222222222222222222222222222";

    fn mixed_vouchers_body() -> serde_json::Value {
        json!({
            "data": {
                "vouchers": {
                    "edges": [
                        voucher_node(5, 3, DESTINATION_A, "1"),
                        voucher_node(2, 2, DESTINATION_B, "1"),
                        voucher_node(9, 3, DESTINATION_B, "4"),
                    ]
                }
            }
        })
    }

    #[tokio::test]
    async fn listing_orders_by_descending_index() {
        let (_server, repository) = mock_backend(mixed_vouchers_body()).await;
        let outputs = repository
            .list(OutputKind::Voucher, &OutputFilter::default())
            .await
            .unwrap();
        let indexes: Vec<u64> = outputs.iter().map(super::Output::index).collect();
        assert_eq!(indexes, vec![9, 5, 2]);
    }

    #[tokio::test]
    async fn epoch_filter_only_returns_matching_outputs() {
        let (_server, repository) = mock_backend(mixed_vouchers_body()).await;
        let filter = OutputFilter {
            epoch_index: Some(3),
            ..OutputFilter::default()
        };
        let outputs = repository.list(OutputKind::Voucher, &filter).await.unwrap();
        assert!(!outputs.is_empty());
        assert!(outputs
            .iter()
            .all(|output| output.epoch_index() == Some(3)));
        let indexes: Vec<u64> = outputs.iter().map(super::Output::index).collect();
        assert_eq!(indexes, vec![9, 5]);
    }

    #[tokio::test]
    async fn filter_fields_are_additive() {
        let (_server, repository) = mock_backend(mixed_vouchers_body()).await;
        let filter = OutputFilter {
            epoch_index: Some(3),
            voucher_address: Some(DESTINATION_B.parse().unwrap()),
            ..OutputFilter::default()
        };
        let outputs = repository.list(OutputKind::Voucher, &filter).await.unwrap();
        let indexes: Vec<u64> = outputs.iter().map(super::Output::index).collect();
        assert_eq!(indexes, vec![9]);
    }

    #[tokio::test]
    async fn input_index_filter_matches_the_numeric_input_id() {
        let (_server, repository) = mock_backend(mixed_vouchers_body()).await;
        let filter = OutputFilter {
            input_index: Some(1),
            ..OutputFilter::default()
        };
        let outputs = repository.list(OutputKind::Voucher, &filter).await.unwrap();
        let indexes: Vec<u64> = outputs.iter().map(super::Output::index).collect();
        assert_eq!(indexes, vec![5, 2]);
    }

    #[tokio::test]
    async fn paging_applies_after_ordering() {
        let (_server, repository) = mock_backend(mixed_vouchers_body()).await;
        let filter = OutputFilter {
            offset: Some(1),
            limit: Some(1),
            ..OutputFilter::default()
        };
        let outputs = repository.list(OutputKind::Voucher, &filter).await.unwrap();
        let indexes: Vec<u64> = outputs.iter().map(super::Output::index).collect();
        assert_eq!(indexes, vec![5]);
    }

    #[tokio::test]
    async fn combined_listing_interleaves_kinds_by_index() {
        // one body serves all four queries; each deserialization picks the
        // field the query asked for
        let body = json!({
            "data": {
                "notices": {"edges": [{"node": {"index": 3, "payload": "0x68"}}]},
                "vouchers": {
                    "edges": [voucher_node(5, 3, DESTINATION_A, "1")]
                },
                "delegateCallVouchers": {"edges": []},
                "reports": {"edges": [{"node": {"index": 8, "payload": "0x68"}}]}
            }
        });
        let (_server, repository) = mock_backend(body).await;

        let outputs = repository.list_all(&OutputFilter::default()).await.unwrap();
        let indexes: Vec<u64> = outputs.iter().map(super::Output::index).collect();
        assert_eq!(indexes, vec![8, 5, 3]);

        let filter = OutputFilter {
            output_type: Some(OutputKind::Voucher),
            ..OutputFilter::default()
        };
        let outputs = repository.list_all(&filter).await.unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].kind(), OutputKind::Voucher);
    }

    #[tokio::test]
    async fn null_edges_are_skipped() {
        let body = json!({
            "data": {
                "notices": {
                    "edges": [
                        null,
                        {"node": {"index": 1, "payload": "0x68"}},
                    ]
                }
            }
        });
        let (_server, repository) = mock_backend(body).await;
        let outputs = repository
            .list(OutputKind::Notice, &OutputFilter::default())
            .await
            .unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].index(), 1);
    }

    struct AlwaysExecuted;

    #[async_trait::async_trait]
    impl ExecutionStateProvider for AlwaysExecuted {
        async fn was_output_executed(
            &self,
            _output_index: u64,
        ) -> Result<bool, Box<dyn std::error::Error + Send + Sync + 'static>> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn singular_voucher_carries_proof_and_execution_state() {
        let body = json!({
            "data": {
                "voucher": {
                    "index": 4,
                    "destination": DESTINATION_A,
                    "payload": "0x0102",
                    "value": "0x0",
                    "epochIndex": 0,
                    "proof": {
                        "outputIndex": 4,
                        "outputHashesSiblings": [
                            "0x3333333333333333333333333333333333333333333333333333333333333333"
                        ]
                    }
                }
            }
        });
        let (_server, repository) = mock_backend(body).await;
        let repository = repository.with_execution_state(Arc::new(AlwaysExecuted));

        let voucher = repository.voucher(4).await.unwrap().unwrap();
        assert!(voucher.proof.as_ref().unwrap().is_ready());
        assert_eq!(voucher.executed, Some(true));
    }

    #[tokio::test]
    async fn execution_state_is_skipped_without_a_chain_client() {
        let body = json!({
            "data": {
                "voucher": {
                    "index": 4,
                    "destination": DESTINATION_A,
                    "payload": "0x0102"
                }
            }
        });
        let (_server, repository) = mock_backend(body).await;
        let voucher = repository.voucher(4).await.unwrap().unwrap();
        assert_eq!(voucher.executed, None);
        assert_eq!(voucher.proof, None);
    }

    #[tokio::test]
    async fn absent_singular_output_is_none() {
        let body = json!({"data": {"voucher": null}});
        let (_server, repository) = mock_backend(body).await;
        assert!(repository.voucher(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn graphql_errors_surface_as_fetch_errors() {
        let body = json!({
            "data": null,
            "errors": [{"message": "unknown field `vouchers`"}]
        });
        let (_server, repository) = mock_backend(body).await;
        let err = repository
            .list(OutputKind::Voucher, &OutputFilter::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("query backend returned errors"));
    }

    #[tokio::test]
    async fn http_error_status_surfaces_as_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;
        let repository = OutputRepository::new(format!("{}/graphql/{APPLICATION}", server.uri()));
        let err = repository
            .list(OutputKind::Voucher, &OutputFilter::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("502"));
    }
}
