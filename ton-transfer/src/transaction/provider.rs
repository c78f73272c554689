//! Network provider: seqno queries and external message submission

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::account::Address;
use crate::error::{Error, Result};

/// Default toncenter-compatible endpoint
pub const DEFAULT_RPC_URL: &str = "https://toncenter.com/api/v2";

/// Provider configuration
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL of the HTTP API
    pub url: String,
    /// API key (if required)
    pub api_key: Option<String>,
    /// Timeout in seconds
    pub timeout: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_RPC_URL.to_string(),
            api_key: None,
            timeout: Some(30),
        }
    }
}

/// The remote calls a wallet transfer needs
#[async_trait]
pub trait TonRpc: Send + Sync {
    /// Whether the account holds an active contract
    async fn is_contract_deployed(&self, address: &Address) -> Result<bool>;

    /// Run the `seqno` get-method of a deployed wallet
    async fn get_seqno(&self, address: &Address) -> Result<u32>;

    /// Submit a serialized external message
    async fn send_boc(&self, boc: &[u8]) -> Result<()>;
}

/// Envelope of every toncenter response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    error: Option<String>,
    code: Option<i64>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, method: &str) -> Result<T> {
        if !self.ok {
            let error = self.error.unwrap_or_else(|| "unknown error".to_string());
            return Err(match self.code {
                Some(code) => Error::Network(format!("{} failed ({}): {}", method, code, error)),
                None => Error::Network(format!("{} failed: {}", method, error)),
            });
        }
        self.result
            .ok_or_else(|| Error::Network(format!("{} returned no result", method)))
    }
}

/// Result of `runGetMethod`
#[derive(Debug, Clone, Deserialize)]
pub struct RunGetMethodResult {
    pub exit_code: i64,
    #[serde(default)]
    pub stack: Vec<Value>,
}

/// Read the seqno from a `runGetMethod` result
pub fn parse_seqno(result: &RunGetMethodResult) -> Result<u32> {
    if result.exit_code != 0 {
        return Err(Error::Network(format!("seqno get-method exited with code {}", result.exit_code)));
    }

    let entry = result
        .stack
        .first()
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Serialization("seqno get-method returned an empty stack".to_string()))?;

    match (entry.first().and_then(Value::as_str), entry.get(1).and_then(Value::as_str)) {
        (Some("num"), Some(number)) => {
            let digits = number.trim_start_matches("0x");
            u32::from_str_radix(digits, 16)
                .map_err(|e| Error::Serialization(format!("Invalid seqno {}: {}", number, e)))
        }
        _ => Err(Error::Serialization(format!("Unexpected seqno stack entry: {:?}", entry))),
    }
}

/// HTTP client for a toncenter-compatible v2 API
pub struct HttpTonClient {
    config: ProviderConfig,
    http: reqwest::Client,
}

impl HttpTonClient {
    /// Create a new client
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let builder = Self::http_builder(&config)?;
        Self::from_builder(config, builder)
    }

    /// API key header and timeout from the configuration
    fn http_builder(config: &ProviderConfig) -> Result<reqwest::ClientBuilder> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &config.api_key {
            let value = HeaderValue::from_str(api_key)
                .map_err(|e| Error::Provider(format!("Invalid API key: {}", e)))?;
            headers.insert("X-API-Key", value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(Duration::from_secs(timeout));
        }
        Ok(builder)
    }

    fn from_builder(config: ProviderConfig, builder: reqwest::ClientBuilder) -> Result<Self> {
        let http = builder
            .build()
            .map_err(|e| Error::Provider(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    /// Get the provider configuration
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), method)
    }

    async fn read_response<T: DeserializeOwned>(response: reqwest::Response, method: &str) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(format!("{} response could not be read: {}", method, e)))?;

        let envelope: ApiResponse<T> = serde_json::from_str(&body).map_err(|e| {
            Error::Network(format!("{} returned HTTP {} with an unexpected body: {}", method, status, e))
        })?;
        envelope.into_result(method)
    }

    /// `getAddressState`: `active`, `uninitialized` or `frozen`
    pub async fn get_address_state(&self, address: &Address) -> Result<String> {
        let response = self
            .http
            .get(self.endpoint("getAddressState"))
            .query(&[("address", address.to_string())])
            .send()
            .await
            .map_err(|e| Error::Network(format!("getAddressState request failed: {}", e)))?;

        Self::read_response(response, "getAddressState").await
    }

    /// `runGetMethod` without arguments
    pub async fn run_get_method(&self, address: &Address, method: &str) -> Result<RunGetMethodResult> {
        let response = self
            .http
            .post(self.endpoint("runGetMethod"))
            .json(&json!({
                "address": address.to_string(),
                "method": method,
                "stack": [],
            }))
            .send()
            .await
            .map_err(|e| Error::Network(format!("runGetMethod request failed: {}", e)))?;

        Self::read_response(response, "runGetMethod").await
    }
}

#[async_trait]
impl TonRpc for HttpTonClient {
    async fn is_contract_deployed(&self, address: &Address) -> Result<bool> {
        let state = self.get_address_state(address).await?;
        debug!(%address, %state, "Fetched account state");
        Ok(state == "active")
    }

    async fn get_seqno(&self, address: &Address) -> Result<u32> {
        let result = self.run_get_method(address, "seqno").await?;
        parse_seqno(&result)
    }

    async fn send_boc(&self, boc: &[u8]) -> Result<()> {
        let response = self
            .http
            .post(self.endpoint("sendBoc"))
            .json(&json!({ "boc": STANDARD.encode(boc) }))
            .send()
            .await
            .map_err(|e| Error::Network(format!("sendBoc request failed: {}", e)))?;

        let result: Result<Value> = Self::read_response(response, "sendBoc").await;
        if let Err(e) = &result {
            warn!(error = %e, "External message was rejected");
        }
        result.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    use super::*;

    /// Serve one canned JSON body per connection and hand back the raw requests
    async fn serve(bodies: Vec<&'static str>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/api/v2", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for body in bodies {
                let (mut stream, _) = listener.accept().await.unwrap();
                requests.push(read_request(&mut stream).await);
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
            }
            requests
        });

        (url, handle)
    }

    async fn read_request(stream: &mut TcpStream) -> String {
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);

            if let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&request[..end]).to_lowercase();
                let content_length = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .map(|len| len.trim().parse::<usize>().unwrap())
                    .unwrap_or(0);
                if request.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8(request).unwrap()
    }

    fn local_client(url: String, api_key: Option<&str>) -> HttpTonClient {
        let config = ProviderConfig {
            url,
            api_key: api_key.map(str::to_string),
            timeout: Some(5),
        };
        let builder = HttpTonClient::http_builder(&config).unwrap().no_proxy();
        HttpTonClient::from_builder(config, builder).unwrap()
    }

    fn request_body(request: &str) -> Value {
        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    fn wallet() -> Address {
        Address::new(0, [0x17; 32])
    }

    #[tokio::test]
    async fn test_active_account_is_deployed() {
        let (url, server) = serve(vec![r#"{"ok":true,"result":"active"}"#]).await;
        let client = local_client(url, Some("secret"));

        assert!(client.is_contract_deployed(&wallet()).await.unwrap());

        let requests = server.await.unwrap();
        let expected = format!("GET /api/v2/getAddressState?address={} HTTP/1.1", wallet());
        assert!(requests[0].starts_with(&expected), "{}", requests[0]);
        assert!(requests[0].to_lowercase().contains("x-api-key: secret"));
    }

    #[tokio::test]
    async fn test_uninitialized_account_is_not_deployed() {
        let (url, server) = serve(vec![r#"{"ok":true,"result":"uninitialized"}"#]).await;
        let client = local_client(url, None);

        assert!(!client.is_contract_deployed(&wallet()).await.unwrap());

        let requests = server.await.unwrap();
        assert!(!requests[0].to_lowercase().contains("x-api-key"));
    }

    #[tokio::test]
    async fn test_seqno_request() {
        let (url, server) = serve(vec![
            r#"{"ok":true,"result":{"gas_used":645,"stack":[["num","0x2a"]],"exit_code":0}}"#,
        ])
        .await;
        let client = local_client(url, None);

        assert_eq!(client.get_seqno(&wallet()).await.unwrap(), 42);

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("POST /api/v2/runGetMethod HTTP/1.1"));
        assert_eq!(
            request_body(&requests[0]),
            json!({"address": wallet().to_string(), "method": "seqno", "stack": []})
        );
    }

    #[tokio::test]
    async fn test_send_boc_request() {
        let (url, server) = serve(vec![r#"{"ok":true,"result":{"@type":"ok"}}"#]).await;
        let client = local_client(url, None);
        let boc = [0xb5, 0xee, 0x9c, 0x72, 0xfb, 0xff];

        client.send_boc(&boc).await.unwrap();

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("POST /api/v2/sendBoc HTTP/1.1"));
        assert_eq!(request_body(&requests[0]), json!({"boc": "te6ccvv/"}));
    }

    #[tokio::test]
    async fn test_rejected_boc() {
        let (url, server) =
            serve(vec![r#"{"ok":false,"error":"cannot apply external message","code":500}"#]).await;
        let client = local_client(url, None);

        let error = client.send_boc(&[0x00]).await.unwrap_err();
        assert!(matches!(error, Error::Network(_)));
        server.await.unwrap();
    }

    fn get_method_result(json: &str) -> RunGetMethodResult {
        let envelope: ApiResponse<RunGetMethodResult> = serde_json::from_str(json).unwrap();
        envelope.into_result("runGetMethod").unwrap()
    }

    #[test]
    fn test_parse_seqno() {
        let result = get_method_result(
            r#"{"ok":true,"result":{"@type":"smc.runResult","gas_used":645,"stack":[["num","0x1b"]],"exit_code":0}}"#,
        );
        assert_eq!(parse_seqno(&result).unwrap(), 27);
    }

    #[test]
    fn test_parse_seqno_failed_get_method() {
        let result = get_method_result(r#"{"ok":true,"result":{"stack":[],"exit_code":-13}}"#);
        assert!(parse_seqno(&result).is_err());
    }

    #[test]
    fn test_parse_seqno_unexpected_entry() {
        let result = get_method_result(r#"{"ok":true,"result":{"stack":[["cell",{}]],"exit_code":0}}"#);
        assert!(parse_seqno(&result).is_err());
    }

    #[test]
    fn test_error_envelope() {
        let envelope: ApiResponse<Value> =
            serde_json::from_str(r#"{"ok":false,"error":"Ratelimit exceed","code":429}"#).unwrap();
        let error = envelope.into_result("sendBoc").unwrap_err();
        assert!(matches!(error, Error::Network(_)));
        assert!(error.to_string().contains("429"));
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let client = HttpTonClient::new(ProviderConfig {
            url: "https://testnet.toncenter.com/api/v2/".to_string(),
            api_key: Some("key".to_string()),
            timeout: Some(5),
        })
        .unwrap();
        assert_eq!(client.endpoint("sendBoc"), "https://testnet.toncenter.com/api/v2/sendBoc");
    }
}
