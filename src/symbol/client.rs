use async_trait::async_trait;
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use super::dto::{
    MosaicInfoResponse, MosaicNamesRequest, MosaicNamesResponse, NamespaceInfoResponse,
    TransactionEnvelope, TransactionPage,
};
use crate::domain::{Address, RawTransaction, TransactionGroup};
use crate::ports::{LedgerQueryClient, MosaicInfo, NodeError, NodeResult, PageRequest};

const MOSAIC_ALIAS_TYPE: u8 = 1;

/// Response from the node `/node/health` endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct NodeHealth {
    pub status: NodeHealthStatus,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeHealthStatus {
    pub api_node: String,
    pub db: String,
}

impl NodeHealth {
    pub fn is_up(&self) -> bool {
        self.status.api_node == "up" && self.status.db == "up"
    }
}

/// HTTP client for the Symbol REST gateway
#[derive(Clone)]
pub struct SymbolClient {
    client: Client,
    base_url: String,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>,
}

impl SymbolClient {
    /// Creates a new SymbolClient with the specified node URL
    pub fn new(base_url: String) -> Self {
        Self::with_circuit_breaker(base_url, Duration::from_secs(30), 3, 60)
    }

    /// Creates a new SymbolClient with custom timeout and circuit breaker configuration
    pub fn with_circuit_breaker(
        base_url: String,
        request_timeout: Duration,
        failure_threshold: u32,
        reset_timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .unwrap_or_default();

        // shorter starts make equal_jittered panic or reopen immediately
        let reset_timeout_secs = reset_timeout_secs.max(2);
        let backoff = backoff::equal_jittered(
            Duration::from_secs(reset_timeout_secs),
            Duration::from_secs(reset_timeout_secs.saturating_mul(2)),
        );
        let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        SymbolClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            circuit_breaker,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the current state of the circuit breaker
    pub fn circuit_state(&self) -> String {
        if self.circuit_breaker.is_call_permitted() {
            "closed".to_string()
        } else {
            "open".to_string()
        }
    }

    pub async fn node_health(&self) -> NodeResult<NodeHealth> {
        let url = format!("{}/node/health", self.base_url);
        let client = self.client.clone();

        self.guarded(async move {
            let response = client.get(&url).send().await?;
            read_json(response, "node health").await
        })
        .await
    }

    /// Runs a request through the circuit breaker. Missing resources do not count as failures.
    async fn guarded<T, F>(&self, request: F) -> NodeResult<T>
    where
        F: Future<Output = NodeResult<T>>,
    {
        let result = self
            .circuit_breaker
            .call_with(is_node_failure, request)
            .await;

        match result {
            Ok(value) => Ok(value),
            Err(FailsafeError::Rejected) => Err(NodeError::CircuitBreakerOpen(
                "Symbol node circuit breaker is open".to_string(),
            )),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }
}

fn is_node_failure(err: &NodeError) -> bool {
    !matches!(err, NodeError::NotFound(_))
}

async fn read_json<T: DeserializeOwned>(response: Response, resource: &str) -> NodeResult<T> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(NodeError::NotFound(resource.to_string()));
    }
    if !status.is_success() {
        return Err(NodeError::InvalidResponse(format!(
            "{} returned {}",
            resource, status
        )));
    }
    Ok(response.json::<T>().await?)
}

#[async_trait]
impl LedgerQueryClient for SymbolClient {
    async fn search_transactions(
        &self,
        group: TransactionGroup,
        address: &Address,
        page: PageRequest,
    ) -> NodeResult<Vec<RawTransaction>> {
        let url = format!("{}/transactions/{}", self.base_url, group);
        let client = self.client.clone();
        let query = [
            ("address", address.plain()),
            ("pageNumber", page.number.to_string()),
            ("pageSize", page.size.to_string()),
        ];

        tracing::debug!(%group, %address, page = page.number, "searching transactions");

        let page = self
            .guarded(async move {
                let response = client.get(&url).query(&query).send().await?;
                read_json::<TransactionPage>(response, &format!("{} transactions", group)).await
            })
            .await?;

        Ok(page
            .data
            .into_iter()
            .map(|envelope| envelope.into_raw(group))
            .collect())
    }

    async fn get_full_transaction(
        &self,
        id: &str,
        group: TransactionGroup,
    ) -> NodeResult<RawTransaction> {
        let url = format!("{}/transactions/{}/{}", self.base_url, group, id);
        let client = self.client.clone();
        let resource = format!("{} transaction {}", group, id);

        let envelope = self
            .guarded(async move {
                let response = client.get(&url).send().await?;
                read_json::<TransactionEnvelope>(response, &resource).await
            })
            .await?;

        Ok(envelope.into_raw(group))
    }

    async fn get_mosaic_info(&self, mosaic_id: &str) -> NodeResult<MosaicInfo> {
        let url = format!("{}/mosaics/{}", self.base_url, mosaic_id);
        let client = self.client.clone();
        let resource = format!("mosaic {}", mosaic_id);

        let info = self
            .guarded(async move {
                let response = client.get(&url).send().await?;
                read_json::<MosaicInfoResponse>(response, &resource).await
            })
            .await?;

        Ok(MosaicInfo {
            mosaic_id: info.mosaic.id.to_uppercase(),
            divisibility: info.mosaic.divisibility,
        })
    }

    async fn get_mosaic_names(&self, mosaic_ids: &[String]) -> NodeResult<HashMap<String, String>> {
        let url = format!("{}/namespaces/mosaic/names", self.base_url);
        let client = self.client.clone();
        let body = MosaicNamesRequest { mosaic_ids };

        let names = self
            .guarded(async move {
                let response = client.post(&url).json(&body).send().await?;
                read_json::<MosaicNamesResponse>(response, "mosaic names").await
            })
            .await?;

        Ok(names
            .mosaic_names
            .into_iter()
            .filter_map(|entry| {
                let name = entry.names.into_iter().next()?;
                Some((entry.mosaic_id.to_uppercase(), name))
            })
            .collect())
    }

    async fn resolve_mosaic_alias(&self, namespace_id: &str) -> NodeResult<String> {
        let url = format!("{}/namespaces/{}", self.base_url, namespace_id);
        let client = self.client.clone();
        let resource = format!("namespace {}", namespace_id);

        let info = self
            .guarded(async move {
                let response = client.get(&url).send().await?;
                read_json::<NamespaceInfoResponse>(response, &resource).await
            })
            .await?;

        let alias = info.namespace.alias;
        if alias.alias_type != MOSAIC_ALIAS_TYPE {
            return Err(NodeError::NotFound(format!(
                "namespace {} does not alias a mosaic",
                namespace_id
            )));
        }
        alias.mosaic_id.map(|id| id.to_uppercase()).ok_or_else(|| {
            NodeError::InvalidResponse(format!("namespace {} alias has no mosaic id", namespace_id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NetworkType;

    const PUBLIC_KEY: &str = "2E834140FD66CF87B254A693A2C7862C819217B676D3943267156625E816EC6F";

    fn test_address() -> Address {
        Address::from_public_key(PUBLIC_KEY, NetworkType::TESTNET).unwrap()
    }

    #[test]
    fn test_symbol_client_creation() {
        let client = SymbolClient::new("http://localhost:3000/".to_string());
        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_circuit_breaker_state() {
        let client = SymbolClient::new("http://localhost:3000".to_string());
        assert_eq!(client.circuit_state(), "closed");
    }

    #[tokio::test]
    async fn test_search_transactions_with_mock() {
        let mut server = mockito::Server::new_async().await;

        let mock_response = r#"{
            "data": [
                {
                    "id": "64B0C2D1E2F3A4B5C6D7E8F9",
                    "meta": { "height": "0", "hash": "0A1B" },
                    "transaction": { "type": 16724, "recipientAddress": "98E521BD0F024F58E670A023BF3A14F3BECAF0280396BED0", "mosaics": [] }
                }
            ],
            "pagination": { "pageNumber": 1, "pageSize": 100 }
        }"#;

        let _mock = server
            .mock("GET", "/transactions/unconfirmed")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("address".into(), test_address().plain()),
                mockito::Matcher::UrlEncoded("pageNumber".into(), "1".into()),
                mockito::Matcher::UrlEncoded("pageSize".into(), "100".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(mock_response)
            .create_async()
            .await;

        let client = SymbolClient::new(server.url());
        let transactions = client
            .search_transactions(
                TransactionGroup::Unconfirmed,
                &test_address(),
                PageRequest::first(100),
            )
            .await
            .unwrap();

        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].group, TransactionGroup::Unconfirmed);
        assert!(!transactions[0].is_confirmed());
    }

    #[tokio::test]
    async fn test_mosaic_not_found() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("GET", "/mosaics/72C0212E67A08BCE")
            .with_status(404)
            .create_async()
            .await;

        let client = SymbolClient::new(server.url());
        let result = client.get_mosaic_info("72C0212E67A08BCE").await;

        assert!(matches!(result, Err(NodeError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_not_found_does_not_open_circuit() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("GET", mockito::Matcher::Regex(r"^/mosaics/.*".into()))
            .with_status(404)
            .expect(4)
            .create_async()
            .await;

        let client = SymbolClient::with_circuit_breaker(server.url(), Duration::from_secs(5), 3, 10);
        for _ in 0..4 {
            let _ = client.get_mosaic_info("72C0212E67A08BCE").await;
        }

        assert_eq!(client.circuit_state(), "closed");
    }

    #[tokio::test]
    async fn test_circuit_breaker_opens_after_failures() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("GET", mockito::Matcher::Regex(r"^/mosaics/.*".into()))
            .with_status(500)
            .expect_at_least(3)
            .create_async()
            .await;

        let client = SymbolClient::with_circuit_breaker(server.url(), Duration::from_secs(5), 3, 10);

        for _ in 0..3 {
            let _ = client.get_mosaic_info("72C0212E67A08BCE").await;
        }

        let result = client.get_mosaic_info("72C0212E67A08BCE").await;
        assert!(matches!(result, Err(NodeError::CircuitBreakerOpen(_))));
    }

    #[tokio::test]
    async fn test_mosaic_names_omit_unnamed_ids() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/namespaces/mosaic/names")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "mosaicIds": ["72C0212E67A08BCE", "1111111111111111"]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{ "mosaicNames": [
                    { "mosaicId": "72C0212E67A08BCE", "names": ["symbol.xym"] },
                    { "mosaicId": "1111111111111111", "names": [] }
                ] }"#,
            )
            .create_async()
            .await;

        let client = SymbolClient::new(server.url());
        let names = client
            .get_mosaic_names(&["72C0212E67A08BCE".to_string(), "1111111111111111".to_string()])
            .await
            .unwrap();

        assert_eq!(names.len(), 1);
        assert_eq!(names.get("72C0212E67A08BCE").map(String::as_str), Some("symbol.xym"));
    }

    #[tokio::test]
    async fn test_resolve_mosaic_alias() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("GET", "/namespaces/E74B99BA41F4AFEE")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{ "namespace": { "alias": { "type": 1, "mosaicId": "72c0212e67a08bce" } } }"#)
            .create_async()
            .await;

        let client = SymbolClient::new(server.url());
        let mosaic_id = client.resolve_mosaic_alias("E74B99BA41F4AFEE").await.unwrap();

        assert_eq!(mosaic_id, "72C0212E67A08BCE");
    }
}
