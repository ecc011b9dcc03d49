//! Request transport.
//!
//! [`Transport`] is the seam between request shaping and the network. The
//! production implementation posts the envelope over HTTPS with reqwest;
//! tests plug in scripted transports.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};

use crate::ClientError;
use crate::protocol::{RpcRequest, RpcResponse};

pub const DEFAULT_ENDPOINT: &str = "https://localhost/verity/rpc";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(6000);
pub const DEFAULT_LANGUAGE: &str = "de";
pub const DEFAULT_AGENT: &str = concat!("verity/", env!("CARGO_PKG_VERSION"));

/// Transaction header value for calls made without a session.
pub const NO_TRANSACTION: &str = "not_required";

const CONNECT_TIMEOUT_SECS: u64 = 10;
const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

pub type TransportFut<'a> =
    Pin<Box<dyn Future<Output = Result<RpcResponse, ClientError>> + Send + 'a>>;

/// One outgoing call.
#[derive(Debug, Clone)]
pub struct Outgoing {
    pub request: RpcRequest,
    /// Session id, or [`NO_TRANSACTION`].
    pub transaction_id: String,
}

pub trait Transport: Send + Sync {
    fn send<'a>(&'a self, outgoing: &'a Outgoing) -> TransportFut<'a>;
}

/// Connection and request-shaping settings.
#[derive(Clone)]
pub struct ClientSettings {
    pub endpoint: String,
    /// Upstream API the endpoint proxies to, sent as `X-Remote-Api-Url`.
    pub remote_api_url: Option<String>,
    pub agent: String,
    pub api_key: Option<String>,
    pub language: String,
    pub timeout: Duration,
    /// Reject plain-HTTP endpoints.
    pub https_only: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            remote_api_url: None,
            agent: DEFAULT_AGENT.to_string(),
            api_key: None,
            language: DEFAULT_LANGUAGE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            https_only: true,
        }
    }
}

impl std::fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSettings")
            .field("endpoint", &self.endpoint)
            .field("remote_api_url", &self.remote_api_url)
            .field("agent", &self.agent)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("language", &self.language)
            .field("timeout", &self.timeout)
            .field("https_only", &self.https_only)
            .finish()
    }
}

/// JSON-RPC over HTTP POST.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    headers: HeaderMap,
}

impl HttpTransport {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(settings.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .https_only(settings.https_only)
            .build()?;
        Self::with_client(client, settings)
    }

    /// Use a preconfigured client.
    pub fn with_client(client: reqwest::Client, settings: &ClientSettings) -> Result<Self, ClientError> {
        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            headers: static_headers(settings)?,
        })
    }

    async fn post(&self, outgoing: &Outgoing) -> Result<RpcResponse, ClientError> {
        let transaction = HeaderValue::from_str(&outgoing.transaction_id)
            .map_err(|e| ClientError::Transport(format!("invalid transaction id: {e}")))?;

        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .header("X-Transaction-Id", transaction)
            .json(&outgoing.request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = read_capped_error_body(response).await;
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl Transport for HttpTransport {
    fn send<'a>(&'a self, outgoing: &'a Outgoing) -> TransportFut<'a> {
        Box::pin(self.post(outgoing))
    }
}

fn static_headers(settings: &ClientSettings) -> Result<HeaderMap, ClientError> {
    let value = |name: &str, raw: &str| {
        HeaderValue::from_str(raw)
            .map_err(|e| ClientError::Transport(format!("invalid {name} header: {e}")))
    };

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert("X-Agent", value("X-Agent", &settings.agent)?);
    if let Some(url) = &settings.remote_api_url {
        headers.insert("X-Remote-Api-Url", value("X-Remote-Api-Url", url)?);
    }
    if let Some(key) = &settings.api_key {
        let mut key = value("X-Auth-Key", key)?;
        key.set_sensitive(true);
        headers.insert("X-Auth-Key", key);
    }
    Ok(headers)
}

async fn read_capped_error_body(response: reqwest::Response) -> String {
    match response.bytes().await {
        Ok(bytes) => {
            let end = bytes.len().min(MAX_ERROR_BODY_BYTES);
            String::from_utf8_lossy(&bytes[..end]).into_owned()
        }
        Err(e) => format!("<unreadable body: {e}>"),
    }
}
