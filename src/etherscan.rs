//! On-chain metadata enrichment via the Etherscan API.
//!
//! The enricher degrades gracefully instead of failing the run: no
//! address, a malformed address, a missing API key, or a network failure
//! each produce a distinct [`EtherscanData`] variant, and [`Enricher::fetch`]
//! never returns an error to the caller.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::model::{EtherscanData, VerificationStatus};

pub const DEFAULT_API_URL: &str = "https://api.etherscan.io/api";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a live Etherscan request failed. Folded into
/// [`EtherscanData::degraded`] rather than propagated.
#[derive(Error, Debug)]
enum EnrichError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),
}

/// Source of on-chain metadata for a contract address.
///
/// The trait seam lets tests substitute a canned enricher for the
/// network-backed one.
#[async_trait]
pub trait Enricher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Produces metadata for the given address. Must not fail: every
    /// degradation is encoded in the returned data.
    async fn fetch(&self, address: Option<&str>) -> EtherscanData;
}

/// Checks the fixed `0x` + 40 hex character address form.
///
/// Anything else is rejected before any network attempt.
pub fn is_valid_address(address: &str) -> bool {
    match address.strip_prefix("0x") {
        Some(hex) => hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

pub struct EtherscanEnricher {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl EtherscanEnricher {
    /// Creates an enricher against the public Etherscan endpoint.
    ///
    /// Without an API key only simulated metadata is produced; no request
    /// leaves the process.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_API_URL.to_string(),
            api_key,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, EnrichError> {
        let response = self.client.get(url).timeout(self.timeout).send().await?;

        if !response.status().is_success() {
            return Err(EnrichError::Status(response.status()));
        }

        Ok(response.json::<T>().await?)
    }

    /// One bounded pass over the two Etherscan endpoints. No retries; any
    /// failure degrades the whole enrichment.
    async fn fetch_live(&self, address: &str, api_key: &str) -> Result<EtherscanData, EnrichError> {
        let tx_url = format!(
            "{}?module=account&action=txlist&address={}&startblock=0&endblock=99999999&sort=asc&apikey={}",
            self.base_url, address, api_key
        );
        let source_url = format!(
            "{}?module=contract&action=getsourcecode&address={}&apikey={}",
            self.base_url, address, api_key
        );

        let tx_data: TxListResponse = self.get_json(&tx_url).await?;
        let source_data: SourceResponse = self.get_json(&source_url).await?;

        let mut transaction_count = None;
        let mut deployer_address = None;
        let mut creation_date = None;

        if tx_data.status.as_deref() == Some("1") {
            let transactions: Vec<EtherscanTx> = tx_data
                .result
                .and_then(|value| serde_json::from_value(value).ok())
                .unwrap_or_default();

            transaction_count = Some(transactions.len() as u64);

            // The contract creation transaction is the earliest one with an
            // empty `to` field; its sender is the deployer.
            if let Some(creation) = transactions
                .iter()
                .find(|tx| tx.to.as_deref().map_or(true, str::is_empty))
            {
                deployer_address = creation.from.clone();
                creation_date = creation
                    .time_stamp
                    .as_deref()
                    .and_then(|ts| ts.parse::<i64>().ok())
                    .and_then(|ts| chrono::DateTime::<chrono::Utc>::from_timestamp(ts, 0))
                    .map(|dt| dt.to_rfc3339());
            }
        }

        let verification_status = if source_data.status.as_deref() == Some("1")
            && source_has_code(source_data.result.as_ref())
        {
            VerificationStatus::Verified
        } else {
            VerificationStatus::NotVerified
        };

        debug!(
            address,
            transactions = ?transaction_count,
            status = %verification_status,
            "etherscan enrichment complete"
        );

        Ok(EtherscanData {
            verification_status,
            transaction_count,
            deployer_address,
            creation_date,
            // The recorded endpoint must never expose the API key.
            api_endpoint: Some(tx_url.replace(api_key, "***")),
            note: None,
            error: None,
        })
    }
}

#[async_trait]
impl Enricher for EtherscanEnricher {
    fn name(&self) -> &'static str {
        "Etherscan"
    }

    async fn fetch(&self, address: Option<&str>) -> EtherscanData {
        let address = match address {
            Some(address) if !address.is_empty() => address,
            _ => return EtherscanData::no_address(),
        };

        if !is_valid_address(address) {
            warn!(address, "rejected malformed contract address");
            return EtherscanData::invalid_address();
        }

        let api_key = match self.api_key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => {
                info!("ETHERSCAN_API_KEY not set, returning simulated metadata");
                return EtherscanData::simulated();
            }
        };

        match self.fetch_live(address, api_key).await {
            Ok(data) => data,
            Err(err) => {
                warn!(address, error = %err, "etherscan request failed, degrading");
                EtherscanData::degraded(err.to_string())
            }
        }
    }
}

fn source_has_code(result: Option<&serde_json::Value>) -> bool {
    let Some(result) = result else { return false };

    // The endpoint usually wraps the record in a one-element array.
    let record = result.as_array().and_then(|arr| arr.first()).unwrap_or(result);

    record
        .get("SourceCode")
        .and_then(|code| code.as_str())
        .map_or(false, |code| !code.is_empty())
}

#[derive(Deserialize)]
struct TxListResponse {
    status: Option<String>,
    result: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct EtherscanTx {
    from: Option<String>,
    to: Option<String>,
    #[serde(rename = "timeStamp")]
    time_stamp: Option<String>,
}

#[derive(Deserialize)]
struct SourceResponse {
    status: Option<String>,
    result: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ADDRESS: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    /// An enricher that cannot reach anything; used to prove the no-network
    /// cases never attempt a request.
    fn offline(api_key: Option<&str>) -> EtherscanEnricher {
        EtherscanEnricher::new(api_key.map(String::from))
            .with_base_url("http://127.0.0.1:1")
            .with_timeout(Duration::from_millis(250))
    }

    #[test]
    fn test_address_format_check() {
        assert!(is_valid_address(ADDRESS));
        assert!(is_valid_address("0xDeAdBeef00000000000000000000000000000001"));
        assert!(!is_valid_address("not-an-address"));
        assert!(!is_valid_address("0x1234"));
        assert!(!is_valid_address("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"));
        assert!(!is_valid_address("0xzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz"));
        assert!(!is_valid_address(""));
    }

    #[tokio::test]
    async fn test_no_address_is_informational() {
        let data = offline(Some("key")).fetch(None).await;
        assert!(data.note.unwrap().contains("--address"));
        assert!(data.error.is_none());

        let data = offline(Some("key")).fetch(Some("")).await;
        assert!(data.error.is_none());
    }

    #[tokio::test]
    async fn test_malformed_address_never_hits_network() {
        let data = offline(Some("key")).fetch(Some("not-an-address")).await;
        assert_eq!(data.error.as_deref(), Some("invalid_address"));
        assert_eq!(data.verification_status, VerificationStatus::Unknown);
    }

    #[tokio::test]
    async fn test_missing_key_simulates() {
        let data = offline(None).fetch(Some(ADDRESS)).await;
        assert!(data.note.unwrap().contains("simulated"));
        assert_ne!(data.verification_status, VerificationStatus::Verified);
        assert!(data.error.is_none());
    }

    #[tokio::test]
    async fn test_live_fetch_populates_fields() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("action", "txlist"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "1",
                "result": [
                    {"from": "0xdeployer00000000000000000000000000000001",
                     "to": "",
                     "timeStamp": "1438269988"},
                    {"from": "0xcaller0000000000000000000000000000000002",
                     "to": ADDRESS,
                     "timeStamp": "1438270000"}
                ]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(query_param("action", "getsourcecode"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "1",
                "result": [{"SourceCode": "contract Token {}"}]
            })))
            .mount(&server)
            .await;

        let enricher = EtherscanEnricher::new(Some("secretkey".to_string()))
            .with_base_url(server.uri());
        let data = enricher.fetch(Some(ADDRESS)).await;

        assert_eq!(data.verification_status, VerificationStatus::Verified);
        assert_eq!(data.transaction_count, Some(2));
        assert_eq!(
            data.deployer_address.as_deref(),
            Some("0xdeployer00000000000000000000000000000001")
        );
        assert!(data.creation_date.unwrap().starts_with("2015-07-30"));
        assert!(data.error.is_none());

        let endpoint = data.api_endpoint.unwrap();
        assert!(!endpoint.contains("secretkey"));
        assert!(endpoint.contains("***"));
    }

    #[tokio::test]
    async fn test_unverified_contract() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("action", "txlist"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "0",
                "result": "Max rate limit reached"
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(query_param("action", "getsourcecode"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "1",
                "result": [{"SourceCode": ""}]
            })))
            .mount(&server)
            .await;

        let enricher =
            EtherscanEnricher::new(Some("key".to_string())).with_base_url(server.uri());
        let data = enricher.fetch(Some(ADDRESS)).await;

        assert_eq!(data.verification_status, VerificationStatus::NotVerified);
        // The API supplied no transaction list, so the count stays absent.
        assert_eq!(data.transaction_count, None);
        assert_eq!(data.deployer_address, None);
    }

    #[tokio::test]
    async fn test_server_error_degrades() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let enricher =
            EtherscanEnricher::new(Some("key".to_string())).with_base_url(server.uri());
        let data = enricher.fetch(Some(ADDRESS)).await;

        assert_eq!(data.note.as_deref(), Some("degraded: network failure"));
        assert!(data.error.unwrap().contains("502"));
    }

    #[tokio::test]
    async fn test_timeout_degrades() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "1", "result": []}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let enricher = EtherscanEnricher::new(Some("key".to_string()))
            .with_base_url(server.uri())
            .with_timeout(Duration::from_millis(100));
        let data = enricher.fetch(Some(ADDRESS)).await;

        assert_eq!(data.note.as_deref(), Some("degraded: network failure"));
        assert!(data.error.is_some());
    }

    #[tokio::test]
    async fn test_connection_refused_degrades() {
        let data = offline(Some("key")).fetch(Some(ADDRESS)).await;
        assert_eq!(data.note.as_deref(), Some("degraded: network failure"));
        assert!(data.error.is_some());
    }
}
